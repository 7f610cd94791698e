//! Error types for chansim-routing.

use thiserror::Error;

/// Result type for routing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by routing and transfer execution.
///
/// A target that cannot be reached is a [`RouteStatus`](crate::RouteStatus),
/// not an error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A search budget of zero can never find anything.
    #[error("search budget {0} must be positive")]
    InvalidBudget(&'static str),

    /// The network refused the transfer.
    #[error(transparent)]
    Network(#[from] chansim_network::Error),
}
