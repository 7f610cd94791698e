//! Chansim Routing
//!
//! Path finding over a payment-channel network and the accounting step that
//! applies a found path.
//!
//! # Strategies
//!
//! - [`GlobalRouting`]: Dijkstra over a [`FeeModel`], using only edges whose
//!   capacity exceeds the transfer value. Returns the least-fee path.
//! - [`NextHopRouting`]: priority-first search ordered by a pluggable
//!   [`PriorityStrategy`], capped at `max_paths` dequeued partial paths.
//! - [`GreedyDepthFirst`]: a single greedy walk with one-hop backtracking,
//!   capped at `max_depth` hops.
//!
//! Searches never fail with an error. A [`RouteResult`] carries the path,
//! the partial paths dequeued along the way and a [`RouteStatus`] telling
//! "no route" apart from "search budget spent".
//!
//! [`execute_transfer`] routes, prices the path and moves the value.

mod error;
mod fee;
mod global;
mod greedy;
mod next_hop;
mod priority;
mod route;
mod transfer;

pub use error::{Error, Result};
pub use fee::{sigmoid, FeeModel};
pub use global::GlobalRouting;
pub use greedy::GreedyDepthFirst;
pub use next_hop::NextHopRouting;
pub use priority::{
    DistanceNetBalancePriority, DistancePriority, GloballyAssistedPriority, PriorityStrategy,
};
pub use route::{RouteResult, RouteStatus, RoutingStrategy};
pub use transfer::{execute_transfer, TransferOutcome};
