//! Network participants.

use serde::{Deserialize, Serialize};

/// Dense handle of a node inside a [`RawNetwork`](crate::RawNetwork).
///
/// Handles are assigned in generation order and stay valid for the lifetime
/// of the network, including after pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Position in the node arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A node of the channel network.
///
/// `uid` and `fullness` are fixed at creation. The channel counters change
/// only when a connection strategy commits a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    uid: u64,
    fullness: f64,
    pub(crate) num_initiated_channels: usize,
    pub(crate) num_accepted_channels: usize,
    pub(crate) num_incoming_channels: usize,
    pub(crate) num_outgoing_channels: usize,
}

impl Node {
    pub(crate) fn new(id: NodeId, uid: u64, fullness: f64) -> Self {
        Self {
            id,
            uid,
            fullness,
            num_initiated_channels: 0,
            num_accepted_channels: 0,
            num_incoming_channels: 0,
            num_outgoing_channels: 0,
        }
    }

    /// Arena handle.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Identifier in the ID space.
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// Capacity/importance proxy driving deposits and channel targets.
    pub fn fullness(&self) -> f64 {
        self.fullness
    }

    /// Whether the node plays the server role (non-zero fullness).
    pub fn is_server(&self) -> bool {
        self.fullness > 0.0
    }

    /// Channels this node opened as initiator.
    pub fn num_initiated_channels(&self) -> usize {
        self.num_initiated_channels
    }

    /// Channels this node accepted from an initiator.
    pub fn num_accepted_channels(&self) -> usize {
        self.num_accepted_channels
    }

    /// Directions on which this node can receive.
    pub fn num_incoming_channels(&self) -> usize {
        self.num_incoming_channels
    }

    /// Directions on which this node can send.
    pub fn num_outgoing_channels(&self) -> usize {
        self.num_outgoing_channels
    }

    /// Bidirectional channels this node initiated or accepted.
    pub fn num_channels(&self) -> usize {
        self.num_initiated_channels + self.num_accepted_channels
    }
}
