//! Selection strategies.
//!
//! A selection strategy produces the candidate partners of a joining node,
//! one at a time. Candidates are checked against the strategy's
//! [`FilterChain`] at the moment they are emitted, against the network as it
//! is *then*, so the join loop can mutate the graph between two calls.
//! `None` ends the sequence; exhaustion is an expected outcome, not an error.

use std::collections::VecDeque;
use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::{FilterChain, NetworkView, NodeId};

/// Candidate cursor for one joining node at a time.
pub trait SelectionStrategy: fmt::Debug {
    /// Begin a new candidate sequence for `node`.
    fn start(&mut self, view: &NetworkView<'_>, node: NodeId);

    /// Next candidate that passes every filter, or `None` once exhausted.
    fn next_target(&mut self, view: &NetworkView<'_>, node: NodeId) -> Option<NodeId>;
}

fn accepts(filters: &FilterChain, view: &NetworkView<'_>, node: NodeId, candidate: NodeId) -> bool {
    match (view.network.node(node), view.network.node(candidate)) {
        (Some(a), Some(b)) => filters.accepts(view, a, b),
        _ => false,
    }
}

/// Scans every node in generation order.
#[derive(Debug)]
pub struct FirstMatchSelection {
    filters: FilterChain,
    order: Vec<NodeId>,
    cursor: usize,
}

impl FirstMatchSelection {
    pub fn new(filters: FilterChain) -> Self {
        Self {
            filters,
            order: Vec::new(),
            cursor: 0,
        }
    }
}

impl SelectionStrategy for FirstMatchSelection {
    fn start(&mut self, view: &NetworkView<'_>, _node: NodeId) {
        self.order = view.network.node_ids();
        self.cursor = 0;
    }

    fn next_target(&mut self, view: &NetworkView<'_>, node: NodeId) -> Option<NodeId> {
        while let Some(&candidate) = self.order.get(self.cursor) {
            self.cursor += 1;
            if accepts(&self.filters, view, node, candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

/// Filters every node, shuffles the survivors and drains them.
///
/// O(N) per join; fine for small networks only.
#[derive(Debug)]
pub struct RandomSelection {
    filters: FilterChain,
    rng: StdRng,
    pending: VecDeque<NodeId>,
}

impl RandomSelection {
    pub fn new(filters: FilterChain, seed: u64) -> Self {
        Self {
            filters,
            rng: StdRng::seed_from_u64(seed),
            pending: VecDeque::new(),
        }
    }
}

impl SelectionStrategy for RandomSelection {
    fn start(&mut self, view: &NetworkView<'_>, node: NodeId) {
        let mut candidates: Vec<NodeId> = view
            .network
            .node_ids()
            .into_iter()
            .filter(|c| accepts(&self.filters, view, node, *c))
            .collect();
        candidates.shuffle(&mut self.rng);
        self.pending = candidates.into();
    }

    fn next_target(&mut self, view: &NetworkView<'_>, node: NodeId) -> Option<NodeId> {
        while let Some(candidate) = self.pending.pop_front() {
            if accepts(&self.filters, view, node, candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

/// Number of `2^i` offsets needed to span `max_distance`.
fn offset_exponents(max_distance: u64) -> u32 {
    if max_distance <= 1 {
        1
    } else {
        u64::BITS - (max_distance - 1).leading_zeros()
    }
}

/// Seeks partners at exponentially growing ID-space offsets.
///
/// Probe `k` targets `uid + 2^(k mod E)` where `E = ceil(log2(N / 2))`. The
/// first node at or after the target id that passes the filters is emitted,
/// scanning forward around the ring. A probe that completes a revolution
/// without a match ends the sequence, as does running out of probe budget
/// (`E * max_cycles` probes).
#[derive(Debug)]
pub struct KademliaSelection {
    filters: FilterChain,
    max_cycles: usize,
    index: Vec<(u64, NodeId)>,
    indexed_count: usize,
    exponents: u32,
    probe: usize,
}

impl KademliaSelection {
    /// Probe budget per join in full offset cycles.
    pub const DEFAULT_MAX_CYCLES: usize = 8;

    pub fn new(filters: FilterChain) -> Self {
        Self::with_max_cycles(filters, Self::DEFAULT_MAX_CYCLES)
    }

    pub fn with_max_cycles(filters: FilterChain, max_cycles: usize) -> Self {
        Self {
            filters,
            max_cycles: max_cycles.max(1),
            index: Vec::new(),
            indexed_count: usize::MAX,
            exponents: 1,
            probe: 0,
        }
    }

    // Node count is fixed once construction starts, so the index only goes
    // stale when the count changes.
    fn refresh_index(&mut self, view: &NetworkView<'_>) {
        let count = view.network.node_count();
        if count == self.indexed_count {
            return;
        }
        self.index = view.network.nodes().map(|n| (n.uid(), n.id())).collect();
        self.index.sort_unstable();
        self.indexed_count = count;
    }
}

impl SelectionStrategy for KademliaSelection {
    fn start(&mut self, view: &NetworkView<'_>, _node: NodeId) {
        self.refresh_index(view);
        self.exponents = offset_exponents(view.network.id_space() / 2);
        self.probe = 0;
    }

    fn next_target(&mut self, view: &NetworkView<'_>, node: NodeId) -> Option<NodeId> {
        let uid = view.network.node(node)?.uid();
        let space = view.network.id_space();
        let budget = self.exponents as usize * self.max_cycles;
        let len = self.index.len();
        if len == 0 || self.probe >= budget {
            return None;
        }
        let exponent = (self.probe % self.exponents as usize) as u32;
        self.probe += 1;
        let target = ((uid as u128 + (1u128 << exponent)) % space as u128) as u64;
        let first = self.index.partition_point(|(u, _)| *u < target) % len;
        (0..len)
            .map(|step| self.index[(first + step) % len].1)
            .find(|c| accepts(&self.filters, view, node, *c))
    }
}

/// Shuffled long-range weave partners from a woven lattice.
#[derive(Debug)]
pub struct WeaveSelection {
    filters: FilterChain,
    rng: StdRng,
    pending: Vec<NodeId>,
}

impl WeaveSelection {
    pub fn new(filters: FilterChain, seed: u64) -> Self {
        Self {
            filters,
            rng: StdRng::seed_from_u64(seed),
            pending: Vec::new(),
        }
    }
}

impl SelectionStrategy for WeaveSelection {
    fn start(&mut self, view: &NetworkView<'_>, node: NodeId) {
        self.pending = view
            .network
            .node(node)
            .map(|n| view.position.shortcut_candidates(n))
            .unwrap_or_default();
        self.pending.shuffle(&mut self.rng);
    }

    fn next_target(&mut self, view: &NetworkView<'_>, node: NodeId) -> Option<NodeId> {
        while let Some(candidate) = self.pending.pop() {
            if accepts(&self.filters, view, node, candidate) {
                return Some(candidate);
            }
        }
        None
    }
}
