//! Network construction.
//!
//! Building is a strict sequential fold: every node is created first with a
//! unique random uid and a fullness drawn from the distribution, then each
//! node in generation order is placed by the position strategy and handed to
//! the join strategy. Nodes left without any channel are pruned at the end.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    ChannelPair, Distribution, Error, JoinOutcome, JoinStrategy, NetworkView, Node, NodeId,
    Position, PositionStrategy, RawNetwork, Result,
};

/// Size and seed of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub num_nodes: usize,
    /// Modulus of the identifier space.
    pub id_space: u64,
    /// Seed for uid assignment.
    pub seed: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            num_nodes: 100,
            id_space: 1 << 16,
            seed: 0,
        }
    }
}

/// Summary of one construction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    /// One entry per join, in generation order.
    pub joins: Vec<JoinOutcome>,
    pub pruned: Vec<NodeId>,
}

impl BuildReport {
    /// Joins whose candidate sequence ran dry.
    pub fn exhausted(&self) -> usize {
        self.joins.iter().filter(|j| j.exhausted).count()
    }

    /// Channels opened across all joins.
    pub fn channels_opened(&self) -> usize {
        self.joins.iter().map(JoinOutcome::opened).sum()
    }
}

/// Per-node record for exporters and statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub uid: u64,
    pub fullness: f64,
    pub position: Option<Position>,
    pub channel_count: usize,
}

/// A built network together with the position strategy that shaped it.
#[derive(Debug)]
pub struct Network {
    pub raw: RawNetwork,
    pub position: Box<dyn PositionStrategy>,
    pub report: BuildReport,
}

impl Network {
    pub fn view(&self) -> NetworkView<'_> {
        NetworkView::new(&self.raw, self.position.as_ref())
    }

    /// Every live node with its mapped position.
    pub fn node_records(&self) -> Vec<NodeRecord> {
        self.raw
            .nodes()
            .map(|node: &Node| NodeRecord {
                id: node.id(),
                uid: node.uid(),
                fullness: node.fullness(),
                position: self.position.map(node),
                channel_count: self.raw.channel_count(node.id()),
            })
            .collect()
    }

    /// Every channel once.
    pub fn channel_records(&self) -> Vec<ChannelPair> {
        self.raw.channels()
    }
}

/// Assembles a network from its three pluggable parts.
#[derive(Debug)]
pub struct NetworkBuilder {
    config: NetworkConfig,
    distribution: Box<dyn Distribution>,
    position: Box<dyn PositionStrategy>,
    join: Box<dyn JoinStrategy>,
}

impl NetworkBuilder {
    pub fn new(
        config: NetworkConfig,
        distribution: Box<dyn Distribution>,
        position: Box<dyn PositionStrategy>,
        join: Box<dyn JoinStrategy>,
    ) -> Self {
        Self {
            config,
            distribution,
            position,
            join,
        }
    }

    /// `num_nodes` distinct uids from `0..id_space`.
    fn draw_uids(&self) -> Result<Vec<u64>> {
        let NetworkConfig {
            num_nodes,
            id_space,
            seed,
        } = self.config;
        if num_nodes as u128 > id_space as u128 {
            return Err(Error::IdSpaceExhausted {
                requested: num_nodes,
                available: id_space,
            });
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut seen = HashSet::with_capacity(num_nodes);
        let mut uids = Vec::with_capacity(num_nodes);
        while uids.len() < num_nodes {
            let uid = rng.gen_range(0..id_space);
            if seen.insert(uid) {
                uids.push(uid);
            }
        }
        Ok(uids)
    }

    pub fn build(mut self) -> Result<Network> {
        self.distribution.reset();
        let mut raw = RawNetwork::new(self.config.id_space)?;
        for uid in self.draw_uids()? {
            let fullness = self.distribution.random();
            raw.add_node(uid, fullness)?;
        }
        debug!(
            "created {} nodes with {} fullness",
            raw.node_count(),
            self.distribution.name()
        );

        let mut report = BuildReport::default();
        for id in raw.node_ids() {
            let node = raw.node(id).ok_or(Error::UnknownNode(id))?;
            self.position.place(node)?;
            report
                .joins
                .push(self.join.join(&mut raw, self.position.as_ref(), id)?);
        }
        report.pruned = raw.prune_isolated();

        info!(
            "built network: {} nodes, {} channels, {} exhausted joins, {} pruned",
            raw.node_count(),
            raw.channel_pair_count(),
            report.exhausted(),
            report.pruned.len()
        );
        Ok(Network {
            raw,
            position: self.position,
            report,
        })
    }
}
