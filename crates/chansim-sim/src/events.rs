//! Simulation timeline and snapshots for exporters.

use std::collections::BTreeMap;

use chansim_network::{ChannelPair, NodeId, NodeRecord};
use chansim_routing::RouteStatus;
use serde::{Deserialize, Serialize};

/// Events recorded while a simulation builds and exercises its network.
///
/// `step` counts joins during construction and transfers afterwards, so the
/// events of a single join (the node, then its channels in opening order)
/// share one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    /// A node ran its join strategy
    NodeJoined {
        node: NodeId,
        uid: u64,
        fullness: f64,
        mandatory: usize,
        initiated: usize,
        exhausted: bool,
        step: u64,
    },

    /// A channel was committed during a join
    ChannelOpened {
        a: NodeId,
        b: NodeId,
        deposit_ab: f64,
        deposit_ba: f64,
        step: u64,
    },

    /// A node ended construction without channels and was removed
    NodePruned { node: NodeId, step: u64 },

    /// A transfer found a route and moved its value
    TransferRouted {
        source: NodeId,
        target: NodeId,
        value: f64,
        hops: usize,
        fee: f64,
        searched: usize,
        step: u64,
    },

    /// A transfer found no route, or its search budget ran out
    TransferFailed {
        source: NodeId,
        target: NodeId,
        value: f64,
        status: RouteStatus,
        searched: usize,
        step: u64,
    },
}

impl SimEvent {
    pub fn step(&self) -> u64 {
        match self {
            SimEvent::NodeJoined { step, .. } => *step,
            SimEvent::ChannelOpened { step, .. } => *step,
            SimEvent::NodePruned { step, .. } => *step,
            SimEvent::TransferRouted { step, .. } => *step,
            SimEvent::TransferFailed { step, .. } => *step,
        }
    }
}

/// Serializable state of the network at one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub step: u64,
    pub nodes: Vec<NodeRecord>,
    pub channels: Vec<ChannelPair>,
    /// Channels currently detached by a freeze.
    pub frozen: usize,
}

impl NetworkSnapshot {
    /// How many nodes have each channel count.
    pub fn degree_histogram(&self) -> BTreeMap<usize, usize> {
        let mut histogram = BTreeMap::new();
        for node in &self.nodes {
            *histogram.entry(node.channel_count).or_insert(0) += 1;
        }
        histogram
    }

    /// Sum of every directed deposit.
    pub fn total_deposit(&self) -> f64 {
        self.channels
            .iter()
            .map(|pair| pair.ab.deposit() + pair.ba.deposit())
            .sum()
    }
}
