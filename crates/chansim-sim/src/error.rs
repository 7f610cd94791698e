//! Error types for chansim-sim.

use thiserror::Error;

/// Result type for simulation runs.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring or running a simulation.
#[derive(Debug, Error)]
pub enum Error {
    /// Building or mutating the network failed.
    #[error("network error: {0}")]
    Network(#[from] chansim_network::Error),

    /// A routing strategy could not be constructed.
    #[error("routing error: {0}")]
    Routing(#[from] chansim_routing::Error),

    /// The configuration file is not valid JSON for this schema.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// Reading a config or writing a snapshot failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration value is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
