//! The raw channel graph.
//!
//! Nodes live in a dense arena indexed by [`NodeId`]. Each node owns a small
//! adjacency vector of `(partner, ChannelState)` entries, one per outgoing
//! direction, so both directions of a channel are reachable in O(degree).
//!
//! Pruned nodes are tombstoned rather than removed so that handles held by
//! position structures stay valid.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::channel::{recompute_pair, ChannelState};
use crate::{Error, Node, NodeId, PositionStrategy, Result};

/// Both directions of a channel, as exposed to exporters and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelPair {
    pub a: NodeId,
    pub b: NodeId,
    pub ab: ChannelState,
    pub ba: ChannelState,
}

#[derive(Debug, Clone)]
struct FrozenChannel {
    a: NodeId,
    b: NodeId,
    ab: ChannelState,
    ba: ChannelState,
}

/// Directed channel graph with per-direction accounting.
#[derive(Debug, Clone)]
pub struct RawNetwork {
    id_space: u64,
    nodes: Vec<Node>,
    alive: Vec<bool>,
    adjacency: Vec<Vec<(NodeId, ChannelState)>>,
    uids: HashMap<u64, NodeId>,
    frozen: Vec<FrozenChannel>,
}

impl RawNetwork {
    /// Create an empty network whose node identifiers are drawn from `0..id_space`.
    pub fn new(id_space: u64) -> Result<Self> {
        if id_space == 0 {
            return Err(Error::InvalidConfig("id space must be positive".into()));
        }
        Ok(Self {
            id_space,
            nodes: Vec::new(),
            alive: Vec::new(),
            adjacency: Vec::new(),
            uids: HashMap::new(),
            frozen: Vec::new(),
        })
    }

    /// Size of the identifier space.
    pub fn id_space(&self) -> u64 {
        self.id_space
    }

    /// Add a node with a unique identifier.
    pub fn add_node(&mut self, uid: u64, fullness: f64) -> Result<NodeId> {
        if uid >= self.id_space {
            return Err(Error::InvalidConfig(format!(
                "uid {uid} outside id space {}",
                self.id_space
            )));
        }
        if self.uids.contains_key(&uid) {
            return Err(Error::DuplicateUid(uid));
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(id, uid, fullness));
        self.alive.push(true);
        self.adjacency.push(Vec::new());
        self.uids.insert(uid, id);
        Ok(id)
    }

    /// Whether `id` names a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.alive.get(id.index()).copied().unwrap_or(false)
    }

    /// Look up a live node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        if self.contains(id) {
            self.nodes.get(id.index())
        } else {
            None
        }
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        if !self.contains(id) {
            return Err(Error::UnknownNode(id));
        }
        Ok(&mut self.nodes[id.index()])
    }

    /// Look up a live node by identifier.
    pub fn node_by_uid(&self, uid: u64) -> Option<&Node> {
        self.uids.get(&uid).and_then(|id| self.node(*id))
    }

    /// Live nodes in generation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .iter()
            .zip(&self.alive)
            .filter(|(_, alive)| **alive)
            .map(|(node, _)| node)
    }

    /// Handles of live nodes in generation order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().map(Node::id).collect()
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }

    /// Outgoing directions of `id`, in channel opening order.
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &ChannelState)> {
        self.adjacency
            .get(id.index())
            .into_iter()
            .flatten()
            .map(|(partner, state)| (*partner, state))
    }

    /// Number of channels `id` currently participates in.
    pub fn channel_count(&self, id: NodeId) -> usize {
        self.adjacency.get(id.index()).map_or(0, Vec::len)
    }

    /// The `from -> to` direction of a channel.
    pub fn channel(&self, from: NodeId, to: NodeId) -> Option<&ChannelState> {
        self.adjacency
            .get(from.index())?
            .iter()
            .find(|(partner, _)| *partner == to)
            .map(|(_, state)| state)
    }

    /// Whether an edge `from -> to` exists.
    pub fn has_channel(&self, from: NodeId, to: NodeId) -> bool {
        self.channel(from, to).is_some()
    }

    /// Number of bidirectional channels.
    pub fn channel_pair_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Every channel exactly once, with `a < b`.
    pub fn channels(&self) -> Vec<ChannelPair> {
        let mut pairs = Vec::with_capacity(self.channel_pair_count());
        for (index, edges) in self.adjacency.iter().enumerate() {
            let a = NodeId(index as u32);
            for (b, ab) in edges {
                if a < *b {
                    if let Some(ba) = self.channel(*b, a) {
                        pairs.push(ChannelPair {
                            a,
                            b: *b,
                            ab: *ab,
                            ba: *ba,
                        });
                    }
                }
            }
        }
        pairs
    }

    /// Open both directions of a channel with the given deposits.
    ///
    /// Node counters are left alone; see [`RawNetwork::count_connection`].
    pub fn open_channel(&mut self, a: NodeId, b: NodeId, d_ab: f64, d_ba: f64) -> Result<()> {
        if a == b {
            return Err(Error::SelfChannel(a));
        }
        for id in [a, b] {
            if !self.contains(id) {
                return Err(Error::UnknownNode(id));
            }
        }
        if self.has_channel(a, b) || self.has_channel(b, a) {
            return Err(Error::DuplicateChannel { from: a, to: b });
        }
        let mut ab = ChannelState::with_deposit(d_ab);
        let mut ba = ChannelState::with_deposit(d_ba);
        recompute_pair(&mut ab, &mut ba);
        self.adjacency[a.index()].push((b, ab));
        self.adjacency[b.index()].push((a, ba));
        Ok(())
    }

    /// Record that `initiator` opened a channel that `acceptor` accepted.
    pub fn count_connection(&mut self, initiator: NodeId, acceptor: NodeId) -> Result<()> {
        let node = self.node_mut(initiator)?;
        node.num_initiated_channels += 1;
        node.num_incoming_channels += 1;
        node.num_outgoing_channels += 1;
        let node = self.node_mut(acceptor)?;
        node.num_accepted_channels += 1;
        node.num_incoming_channels += 1;
        node.num_outgoing_channels += 1;
        Ok(())
    }

    fn pair_mut(&mut self, u: NodeId, v: NodeId) -> Option<(&mut ChannelState, &mut ChannelState)> {
        let (ui, vi) = (u.index(), v.index());
        if ui == vi || ui.max(vi) >= self.adjacency.len() {
            return None;
        }
        let (left, right) = self.adjacency.split_at_mut(ui.max(vi));
        let (u_edges, v_edges) = if ui < vi {
            (&mut left[ui], &mut right[0])
        } else {
            (&mut right[0], &mut left[vi])
        };
        let uv = u_edges
            .iter_mut()
            .find(|(partner, _)| *partner == v)
            .map(|(_, state)| state)?;
        let vu = v_edges
            .iter_mut()
            .find(|(partner, _)| *partner == u)
            .map(|(_, state)| state)?;
        Some((uv, vu))
    }

    /// Change the deposit of `from -> to` and refresh the pair.
    pub fn set_deposit(&mut self, from: NodeId, to: NodeId, deposit: f64) -> Result<()> {
        let (uv, vu) = self
            .pair_mut(from, to)
            .ok_or(Error::MissingChannel { from, to })?;
        uv.set_deposit(deposit);
        recompute_pair(uv, vu);
        Ok(())
    }

    /// Move `value` along every hop of `path`.
    ///
    /// This is pure accounting: a hop whose capacity is below `value` is
    /// still applied and only logged, leaving a negative capacity behind.
    /// Every hop must exist; the path is validated before anything changes.
    pub fn do_transfer(&mut self, path: &[NodeId], value: f64) -> Result<()> {
        for hop in path.windows(2) {
            if !self.has_channel(hop[0], hop[1]) || !self.has_channel(hop[1], hop[0]) {
                return Err(Error::MissingChannel {
                    from: hop[0],
                    to: hop[1],
                });
            }
        }
        for hop in path.windows(2) {
            let (u, v) = (hop[0], hop[1]);
            if let Some((uv, vu)) = self.pair_mut(u, v) {
                if value > uv.capacity() {
                    warn!(
                        "transfer of {} over {} -> {} exceeds capacity {}",
                        value,
                        u,
                        v,
                        uv.capacity()
                    );
                }
                uv.add_balance(value);
                uv.record_transfer();
                vu.record_transfer();
                recompute_pair(uv, vu);
            }
        }
        Ok(())
    }

    /// Zero every balance and transfer counter, keeping deposits.
    pub fn reset_balances(&mut self) {
        for index in 0..self.adjacency.len() {
            let u = NodeId(index as u32);
            let partners: Vec<NodeId> = self.adjacency[index].iter().map(|(p, _)| *p).collect();
            for v in partners.into_iter().filter(|v| u < *v) {
                if let Some((uv, vu)) = self.pair_mut(u, v) {
                    uv.clear_balance();
                    vu.clear_balance();
                    recompute_pair(uv, vu);
                }
            }
        }
    }

    /// Temporarily detach every channel of a random `fraction` of nodes.
    ///
    /// Frozen channels keep their full state and come back verbatim on
    /// [`RawNetwork::unfreeze`]. Returns the frozen nodes.
    pub fn freeze_random<R: Rng>(&mut self, fraction: f64, rng: &mut R) -> Vec<NodeId> {
        let ids = self.node_ids();
        let amount = ((ids.len() as f64) * fraction.clamp(0.0, 1.0)).round() as usize;
        let chosen: Vec<NodeId> = ids.choose_multiple(rng, amount).copied().collect();
        for &node in &chosen {
            let edges = std::mem::take(&mut self.adjacency[node.index()]);
            for (partner, ab) in edges {
                let back = &mut self.adjacency[partner.index()];
                if let Some(pos) = back.iter().position(|(p, _)| *p == node) {
                    let (_, ba) = back.remove(pos);
                    self.frozen.push(FrozenChannel {
                        a: node,
                        b: partner,
                        ab,
                        ba,
                    });
                }
            }
        }
        debug!("froze {} nodes, {} channels", chosen.len(), self.frozen.len());
        chosen
    }

    /// Restore every channel detached by [`RawNetwork::freeze_random`].
    pub fn unfreeze(&mut self) -> usize {
        let restored = self.frozen.len();
        for channel in self.frozen.drain(..) {
            self.adjacency[channel.a.index()].push((channel.b, channel.ab));
            self.adjacency[channel.b.index()].push((channel.a, channel.ba));
        }
        restored
    }

    /// Number of channels currently frozen.
    pub fn frozen_count(&self) -> usize {
        self.frozen.len()
    }

    /// Tombstone every live node without channels. Returns the pruned handles.
    ///
    /// Nodes whose channels are only frozen are kept.
    pub fn prune_isolated(&mut self) -> Vec<NodeId> {
        let frozen: HashSet<NodeId> = self.frozen.iter().flat_map(|c| [c.a, c.b]).collect();
        let isolated: Vec<NodeId> = self
            .nodes()
            .map(Node::id)
            .filter(|id| self.adjacency[id.index()].is_empty() && !frozen.contains(id))
            .collect();
        for id in &isolated {
            self.alive[id.index()] = false;
            let uid = self.nodes[id.index()].uid();
            self.uids.remove(&uid);
        }
        isolated
    }
}

/// Read-only view handed to filters, selections and routing.
#[derive(Clone, Copy)]
pub struct NetworkView<'a> {
    pub network: &'a RawNetwork,
    pub position: &'a dyn PositionStrategy,
}

impl<'a> NetworkView<'a> {
    pub fn new(network: &'a RawNetwork, position: &'a dyn PositionStrategy) -> Self {
        Self { network, position }
    }

    /// Position-strategy distance between two live nodes.
    pub fn distance(&self, a: NodeId, b: NodeId) -> f64 {
        match (self.network.node(a), self.network.node(b)) {
            (Some(a), Some(b)) => self.position.distance(a, b),
            _ => f64::INFINITY,
        }
    }
}

impl std::fmt::Debug for NetworkView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkView")
            .field("nodes", &self.network.node_count())
            .field("position", &self.position)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pair() -> (RawNetwork, NodeId, NodeId) {
        let mut net = RawNetwork::new(100).unwrap();
        let a = net.add_node(1, 0.0).unwrap();
        let b = net.add_node(2, 1.0).unwrap();
        net.open_channel(a, b, 15.0, 20.0).unwrap();
        (net, a, b)
    }

    #[test]
    fn open_channel_creates_both_directions() {
        let (net, a, b) = pair();
        assert!(net.has_channel(a, b));
        assert!(net.has_channel(b, a));
        assert_eq!(net.channel(a, b).unwrap().capacity(), 15.0);
        assert_eq!(net.channel(b, a).unwrap().capacity(), 20.0);
        assert_eq!(net.channel(a, b).unwrap().imbalance(), 5.0);
        assert_eq!(net.channel_pair_count(), 1);
    }

    #[test]
    fn open_channel_rejects_bad_pairs() {
        let (mut net, a, b) = pair();
        assert_eq!(net.open_channel(a, a, 1.0, 1.0), Err(Error::SelfChannel(a)));
        assert_eq!(
            net.open_channel(b, a, 1.0, 1.0),
            Err(Error::DuplicateChannel { from: b, to: a })
        );
        assert_eq!(
            net.open_channel(a, NodeId(9), 1.0, 1.0),
            Err(Error::UnknownNode(NodeId(9)))
        );
    }

    #[test]
    fn duplicate_uid_rejected() {
        let (mut net, _, _) = pair();
        assert_eq!(net.add_node(1, 0.3), Err(Error::DuplicateUid(1)));
        assert!(net.add_node(100, 0.3).is_err());
    }

    #[test]
    fn transfers_in_both_directions() {
        let (mut net, a, b) = pair();
        net.do_transfer(&[a, b], 2.0).unwrap();
        net.do_transfer(&[b, a], 3.0).unwrap();

        let ab = net.channel(a, b).unwrap();
        let ba = net.channel(b, a).unwrap();
        assert_eq!(ab.balance(), 2.0);
        assert_eq!(ba.balance(), 3.0);
        assert_eq!(ab.net_balance(), -1.0);
        assert_eq!(ab.capacity(), 16.0);
        assert_eq!(ba.capacity(), 19.0);
        assert_eq!(ab.imbalance(), 3.0);
        assert_eq!(ab.num_transfers(), 2);
    }

    #[test]
    fn overdraft_is_applied() {
        let (mut net, a, b) = pair();
        net.do_transfer(&[a, b], 40.0).unwrap();
        assert_eq!(net.channel(a, b).unwrap().capacity(), -25.0);
    }

    #[test]
    fn transfer_over_missing_hop_changes_nothing() {
        let (mut net, a, b) = pair();
        let c = net.add_node(3, 0.5).unwrap();
        let err = net.do_transfer(&[a, b, c], 1.0);
        assert_eq!(err, Err(Error::MissingChannel { from: b, to: c }));
        assert_eq!(net.channel(a, b).unwrap().balance(), 0.0);
    }

    #[test]
    fn count_connection_tracks_roles() {
        let (mut net, a, b) = pair();
        net.count_connection(a, b).unwrap();
        let initiator = net.node(a).unwrap();
        assert_eq!(initiator.num_initiated_channels(), 1);
        assert_eq!(initiator.num_accepted_channels(), 0);
        let acceptor = net.node(b).unwrap();
        assert_eq!(acceptor.num_initiated_channels(), 0);
        assert_eq!(acceptor.num_accepted_channels(), 1);
        assert_eq!(acceptor.num_incoming_channels(), 1);
        assert_eq!(acceptor.num_outgoing_channels(), 1);
    }

    #[test]
    fn set_deposit_refreshes_pair() {
        let (mut net, a, b) = pair();
        net.set_deposit(a, b, 25.0).unwrap();
        assert_eq!(net.channel(a, b).unwrap().capacity(), 25.0);
        assert_eq!(net.channel(b, a).unwrap().imbalance(), 5.0);
    }

    #[test]
    fn reset_restores_fresh_state() {
        let (mut net, a, b) = pair();
        net.do_transfer(&[a, b], 5.0).unwrap();
        net.reset_balances();
        let ab = net.channel(a, b).unwrap();
        assert_eq!(ab.balance(), 0.0);
        assert_eq!(ab.capacity(), 15.0);
        assert_eq!(ab.num_transfers(), 0);
    }

    #[test]
    fn freeze_and_unfreeze_round_trip() {
        let mut net = RawNetwork::new(100).unwrap();
        let ids: Vec<_> = (0..6).map(|i| net.add_node(i, 0.5).unwrap()).collect();
        for w in ids.windows(2) {
            net.open_channel(w[0], w[1], 10.0, 10.0).unwrap();
        }
        net.do_transfer(&[ids[0], ids[1]], 3.0).unwrap();
        let before = net.channels();

        let mut rng = StdRng::seed_from_u64(7);
        let frozen = net.freeze_random(0.5, &mut rng);
        assert_eq!(frozen.len(), 3);
        for id in &frozen {
            assert_eq!(net.channel_count(*id), 0);
        }
        assert!(net.frozen_count() > 0);

        net.unfreeze();
        let mut after = net.channels();
        let mut before = before;
        before.sort_by_key(|p| (p.a, p.b));
        after.sort_by_key(|p| (p.a, p.b));
        assert_eq!(before, after);
        assert_eq!(net.frozen_count(), 0);
    }

    #[test]
    fn prune_tombstones_isolated_nodes() {
        let (mut net, a, b) = pair();
        let c = net.add_node(50, 0.2).unwrap();
        assert_eq!(net.prune_isolated(), vec![c]);
        assert_eq!(net.node_count(), 2);
        assert!(net.node(c).is_none());
        assert!(net.node_by_uid(50).is_none());
        assert_eq!(net.node_ids(), vec![a, b]);
    }

    #[test]
    fn prune_keeps_frozen_nodes() {
        let (mut net, a, b) = pair();
        let c = net.add_node(50, 0.2).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        net.freeze_random(1.0, &mut rng);
        assert_eq!(net.channel_pair_count(), 0);

        assert_eq!(net.prune_isolated(), vec![c]);
        assert!(net.contains(a) && net.contains(b));
        assert_eq!(net.unfreeze(), 1);
        let channels = net.channels();
        assert_eq!(channels.len(), 1);
        assert!(channels.iter().all(|p| net.contains(p.a) && net.contains(p.b)));
    }

    proptest! {
        #[test]
        fn caches_stay_antisymmetric(
            transfers in proptest::collection::vec((0usize..4, 0usize..4, 0.0f64..5.0), 0..40)
        ) {
            let mut net = RawNetwork::new(10).unwrap();
            let ids: Vec<_> = (0..4).map(|i| net.add_node(i, 0.5).unwrap()).collect();
            for i in 0..4 {
                for j in (i + 1)..4 {
                    net.open_channel(ids[i], ids[j], 3.0 + i as f64, 7.0 - j as f64).unwrap();
                }
            }
            for (from, to, value) in transfers {
                if from != to {
                    net.do_transfer(&[ids[from], ids[to]], value).unwrap();
                }
            }
            for pair in net.channels() {
                prop_assert_eq!(pair.ab.net_balance(), -pair.ba.net_balance());
                prop_assert_eq!(pair.ab.imbalance(), -pair.ba.imbalance());
                let net_balance = pair.ab.balance() - pair.ba.balance();
                prop_assert!((pair.ab.net_balance() - net_balance).abs() < 1e-9);
                let capacity = pair.ab.deposit() - pair.ab.net_balance();
                prop_assert!((pair.ab.capacity() - capacity).abs() < 1e-9);
            }
        }
    }
}
