//! Global (Dijkstra) routing.
//!
//! Assumes full visibility of the graph. Edge weights come from a
//! [`FeeModel`]; only edges whose capacity strictly exceeds the transfer
//! value are usable. The result is a minimum-total-fee path.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use chansim_network::{NetworkView, NodeId};
use tracing::debug;

use crate::{FeeModel, RouteResult, RoutingStrategy};

#[derive(Debug, Clone, Copy)]
struct Frontier {
    cost: f64,
    seq: u64,
    node: NodeId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl Ord for Frontier {
    // BinaryHeap is a max-heap; reverse for cheapest first, FIFO on ties.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn unwind(parents: &HashMap<NodeId, NodeId>, mut node: NodeId) -> Vec<NodeId> {
    let mut path = vec![node];
    while let Some(&parent) = parents.get(&node) {
        path.push(parent);
        node = parent;
    }
    path.reverse();
    path
}

/// Least-fee routing over capacity-feasible edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalRouting {
    pub fee: FeeModel,
}

impl GlobalRouting {
    pub fn new(fee: FeeModel) -> Self {
        Self { fee }
    }

    /// Hop count of the shortest path over edges with positive capacity.
    pub fn hop_distance(view: &NetworkView<'_>, source: NodeId, target: NodeId) -> Option<usize> {
        let network = view.network;
        if !network.contains(source) || !network.contains(target) {
            return None;
        }
        let mut hops = HashMap::from([(source, 0usize)]);
        let mut queue = VecDeque::from([source]);
        while let Some(node) = queue.pop_front() {
            let here = hops[&node];
            if node == target {
                return Some(here);
            }
            for (next, channel) in network.neighbors(node) {
                if channel.capacity() > 0.0 && !hops.contains_key(&next) {
                    hops.insert(next, here + 1);
                    queue.push_back(next);
                }
            }
        }
        None
    }
}

impl RoutingStrategy for GlobalRouting {
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

        let mut costs: HashMap<NodeId, f64> = HashMap::from([(source, 0.0)]);
        let mut parents: HashMap<NodeId, NodeId> = HashMap::new();
        let mut settled = HashSet::new();
        let mut heap = BinaryHeap::new();
        let mut seq = 0;
        let mut history = Vec::new();
        heap.push(Frontier {
            cost: 0.0,
            seq,
            node: source,
        });

        while let Some(Frontier { cost, node, .. }) = heap.pop() {
            if !settled.insert(node) {
                continue;
            }
            let path = unwind(&parents, node);
            if node == target {
                debug!(
                    "global route {} -> {}: {} hops, fee {}",
                    source,
                    target,
                    path.len() - 1,
                    cost
                );
                history.push(path.clone());
                return RouteResult::found(path, history);
            }
            history.push(path);
            for (next, channel) in network.neighbors(node) {
                if channel.capacity() <= value || settled.contains(&next) {
                    continue;
                }
                let candidate = cost + self.fee.fee(channel, value);
                let better = costs.get(&next).map_or(true, |&known| candidate < known);
                if better {
                    costs.insert(next, candidate);
                    parents.insert(next, node);
                    seq += 1;
                    heap.push(Frontier {
                        cost: candidate,
                        seq,
                        node: next,
                    });
                }
            }
        }
        debug!("global route {} -> {}: unreachable", source, target);
        RouteResult::unreachable(history)
    }
}
