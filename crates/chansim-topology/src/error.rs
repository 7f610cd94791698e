//! Error types for chansim-topology.

use thiserror::Error;

/// Result type for topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or querying a metric space.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The hyperbolic disk has no free slot left inside its radius.
    #[error("hyperbolic disk is full ({capacity} slots)")]
    DiskFull { capacity: u64 },

    /// A lattice needs at least one dimension.
    #[error("invalid lattice dimension count: {0}")]
    InvalidDimensions(usize),

    /// A numeric parameter is outside its domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
