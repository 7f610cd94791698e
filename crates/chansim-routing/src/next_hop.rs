//! Next-hop priority-first search.
//!
//! Partial paths wait in a priority queue ordered by
//! `(priority, path length, insertion sequence)`, smallest first. Each pop
//! marks the path's tail visited and records the path in the history. The
//! search succeeds when the tail is the target and gives up once the
//! history holds `max_paths` entries.
//!
//! Only unvisited neighbors are pushed and every node on a queued path has
//! already been popped, so returned paths never repeat a node.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use chansim_network::{NetworkView, NodeId};
use tracing::debug;

use crate::{Error, PriorityStrategy, Result, RouteResult, RoutingStrategy};

#[derive(Debug)]
struct Candidate {
    priority: f64,
    seq: u64,
    path: Vec<NodeId>,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl Ord for Candidate {
    // Reversed for a min-first BinaryHeap.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.path.len().cmp(&self.path.len()))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority-first search bounded by a history budget.
#[derive(Debug)]
pub struct NextHopRouting {
    priority: Box<dyn PriorityStrategy>,
    max_paths: usize,
}

impl NextHopRouting {
    pub fn new(priority: impl PriorityStrategy + 'static, max_paths: usize) -> Result<Self> {
        Self::boxed(Box::new(priority), max_paths)
    }

    pub fn boxed(priority: Box<dyn PriorityStrategy>, max_paths: usize) -> Result<Self> {
        if max_paths == 0 {
            return Err(Error::InvalidBudget("max_paths"));
        }
        Ok(Self {
            priority,
            max_paths,
        })
    }

    pub fn max_paths(&self) -> usize {
        self.max_paths
    }
}

impl RoutingStrategy for NextHopRouting {
    fn route(
        &self,
        view: &NetworkView<'_>,
        source: NodeId,
        target: NodeId,
        value: f64,
    ) -> RouteResult {
        let network = view.network;
        if !network.contains(source) || !network.contains(target) {
            return RouteResult::unreachable(Vec::new());
        }

        let mut visited = HashSet::new();
        let mut history = Vec::new();
        let mut heap = BinaryHeap::new();
        let mut seq = 0;
        heap.push(Candidate {
            priority: 0.0,
            seq,
            path: vec![source],
        });

        while let Some(Candidate { path, .. }) = heap.pop() {
            let Some(&tail) = path.last() else { continue };
            // a node can be queued by several paths; only the first pop counts
            if !visited.insert(tail) {
                continue;
            }
            history.push(path.clone());
            if tail == target {
                debug!(
                    "next-hop route {} -> {}: {} hops after {} paths",
                    source,
                    target,
                    path.len() - 1,
                    history.len()
                );
                return RouteResult::found(path, history);
            }
            if history.len() >= self.max_paths {
                debug!(
                    "next-hop route {} -> {}: budget of {} paths spent",
                    source, target, self.max_paths
                );
                return RouteResult::budget_exhausted(history);
            }
            for (next, channel) in network.neighbors(tail) {
                if visited.contains(&next) || channel.capacity() < value {
                    continue;
                }
                let priority = self.priority.priority(view, tail, next, target, value);
                let mut extended = path.clone();
                extended.push(next);
                seq += 1;
                heap.push(Candidate {
                    priority,
                    seq,
                    path: extended,
                });
            }
        }
        debug!("next-hop route {} -> {}: unreachable", source, target);
        RouteResult::unreachable(history)
    }
}
