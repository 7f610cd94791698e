//! Chansim Network
//!
//! In-memory model of a payment-channel network and the strategy engine that
//! grows it.
//!
//! # Data model
//!
//! A [`RawNetwork`] owns every [`Node`] in a dense arena addressed by
//! [`NodeId`]. Each channel is stored as two directed [`ChannelState`]
//! records whose derived fields (net balance, capacity, imbalance) are
//! recomputed together on every balance or deposit change, so
//! `net_balance(u->v) == -net_balance(v->u)` and
//! `imbalance(u->v) == -imbalance(v->u)` hold after every mutation.
//!
//! # Construction
//!
//! A [`NetworkBuilder`] combines three pluggable parts:
//!
//! - a [`Distribution`] drawing each node's fullness,
//! - a [`PositionStrategy`] placing nodes on a ring, lattice or hyperbolic disk,
//! - a [`JoinStrategy`] attaching each node in generation order.
//!
//! Join strategies are pipelines of [`FilterStrategy`] predicates, a
//! [`SelectionStrategy`] producing candidates and a [`ConnectionStrategy`]
//! committing channels. Running out of candidates is reported, never raised.

mod builder;
mod channel;
mod connection;
mod distribution;
mod error;
mod filter;
mod join;
mod mapping;
mod network;
mod node;
mod position;
mod selection;

pub use builder::{BuildReport, Network, NetworkBuilder, NetworkConfig, NodeRecord};
pub use channel::ChannelState;
pub use connection::{BidirectionalConnection, ConnectionStrategy};
pub use distribution::{
    Beta, Circle, ClientServer, Constant, Distribution, Pareto, Uniform, DEFAULT_SEED,
};
pub use error::{Error, Result};
pub use filter::{
    AcceptedLimitFilter, DistanceFilter, FilterChain, FilterStrategy, FullerFilter,
    IdentityFilter, IncomingLimitFilter, KademliaBucketFilter, MinIncomingDepositFilter,
    MinMutualDepositFilter, NotConnectedFilter, ServerOnlyFilter, ThresholdFilter,
    TotalBidirectionalLimitFilter, TotalLimitFilter,
};
pub use join::{
    hyperbolic_join, kademlia_join, lattice_join, micro_raiden_join, random_join, DefaultJoin,
    JoinOutcome, JoinStrategy, KademliaJoinConfig, LatticeJoinConfig, MeshJoin,
    MicroRaidenJoin, MicroRaidenJoinConfig, RandomJoinConfig,
};
pub use mapping::{Linear, RandomRange};
pub use network::{ChannelPair, NetworkView, RawNetwork};
pub use node::{Node, NodeId};
pub use position::{DiskPosition, LatticePosition, Position, PositionStrategy, RingPosition};
pub use selection::{
    FirstMatchSelection, KademliaSelection, RandomSelection, SelectionStrategy, WeaveSelection,
};
