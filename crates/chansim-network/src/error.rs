//! Error types for chansim-network.

use thiserror::Error;

use crate::NodeId;

/// Result type for network operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or mutating a channel network.
///
/// Expected simulation outcomes (an exhausted candidate sequence, an
/// under-connected node) are reported as values and never show up here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The handle does not name a live node.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// Another node already uses this identifier.
    #[error("duplicate node uid {0}")]
    DuplicateUid(u64),

    /// A node tried to open a channel with itself.
    #[error("node {0} cannot open a channel with itself")]
    SelfChannel(NodeId),

    /// The channel pair already exists.
    #[error("channel {from} -> {to} already exists")]
    DuplicateChannel { from: NodeId, to: NodeId },

    /// No channel connects the two nodes.
    #[error("no channel {from} -> {to}")]
    MissingChannel { from: NodeId, to: NodeId },

    /// A layout routine asked for a density the distribution does not define.
    #[error("distribution {0} has no probability density")]
    MissingDensity(&'static str),

    /// Distribution parameters are outside their domain.
    #[error("distribution error: {0}")]
    Distribution(String),

    /// More nodes were requested than the ID space holds.
    #[error("cannot draw {requested} unique ids from a space of {available}")]
    IdSpaceExhausted { requested: usize, available: u64 },

    /// A configuration value is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Geometry error from the position structures.
    #[error("topology error: {0}")]
    Topology(#[from] chansim_topology::Error),
}
