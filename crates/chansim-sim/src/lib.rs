//! Chansim Simulation
//!
//! Drives a payment-channel network experiment end to end.
//!
//! # Flow
//!
//! 1. A [`SimulationConfig`] (JSON) names the fullness distribution, the
//!    position strategy, the join strategy and the routing strategy.
//! 2. [`Simulation::new`] builds the network and records one
//!    [`SimEvent::NodeJoined`] per join, followed by the
//!    [`SimEvent::ChannelOpened`] events of that join and finally the
//!    [`SimEvent::NodePruned`] events.
//! 3. [`Simulation::run_transfers`] routes random transfers, appending
//!    [`SimEvent::TransferRouted`] or [`SimEvent::TransferFailed`] events.
//! 4. [`Simulation::snapshot`] exports the current nodes and channels.
//!
//! Scaling-limit experiments freeze a fraction of nodes with
//! [`Simulation::freeze`] before running transfers.

mod config;
mod error;
mod events;
mod simulation;

pub use config::{
    DistributionConfig, JoinConfig, PositionConfig, PriorityConfig, RoutingConfig, RoutingKind,
    SimulationConfig, TransferConfig,
};
pub use error::{Error, Result};
pub use events::{NetworkSnapshot, SimEvent};
pub use simulation::{Simulation, TransferSummary};
