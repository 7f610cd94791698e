//! Priority strategies for next-hop and greedy routing.
//!
//! A priority scores stepping from `from` to `to` on the way to `target`;
//! lower is better. Priorities are heuristics with no admissibility
//! guarantee, so searches driven by them are not optimal-cost.

use std::fmt;

use chansim_network::{NetworkView, NodeId};

use crate::{sigmoid, GlobalRouting};

pub trait PriorityStrategy: fmt::Debug {
    fn priority(
        &self,
        view: &NetworkView<'_>,
        from: NodeId,
        to: NodeId,
        target: NodeId,
        value: f64,
    ) -> f64;
}

/// Greedy geographic routing: distance from the candidate to the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistancePriority;

impl PriorityStrategy for DistancePriority {
    fn priority(
        &self,
        view: &NetworkView<'_>,
        _from: NodeId,
        to: NodeId,
        target: NodeId,
        _value: f64,
    ) -> f64 {
        view.distance(to, target)
    }
}

/// Normalized distance scaled by `sigmoid(net_balance + value)` of the hop.
///
/// Prefers hops that are both closer and balance-neutral.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceNetBalancePriority;

impl PriorityStrategy for DistanceNetBalancePriority {
    fn priority(
        &self,
        view: &NetworkView<'_>,
        from: NodeId,
        to: NodeId,
        target: NodeId,
        value: f64,
    ) -> f64 {
        let distance = view.distance(to, target) / view.position.max_distance();
        let fee = view
            .network
            .channel(from, to)
            .map_or(1.0, |c| sigmoid(c.net_balance() + value));
        distance * fee
    }
}

/// Wraps another priority with a global hop-count penalty.
///
/// Multiplies the inner priority by `1 + hops(to, target)`, steering away
/// from candidates that are close in space but poorly connected. Needs the
/// whole graph, so it does not suit light clients.
#[derive(Debug)]
pub struct GloballyAssistedPriority {
    inner: Box<dyn PriorityStrategy>,
}

impl GloballyAssistedPriority {
    pub fn new(inner: impl PriorityStrategy + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    pub fn boxed(inner: Box<dyn PriorityStrategy>) -> Self {
        Self { inner }
    }
}

impl PriorityStrategy for GloballyAssistedPriority {
    fn priority(
        &self,
        view: &NetworkView<'_>,
        from: NodeId,
        to: NodeId,
        target: NodeId,
        value: f64,
    ) -> f64 {
        let base = self.inner.priority(view, from, to, target, value);
        match GlobalRouting::hop_distance(view, to, target) {
            Some(hops) => base * (1 + hops) as f64,
            None => f64::INFINITY,
        }
    }
}
