//! Chansim Topology
//!
//! Metric spaces used to lay out and wire a simulated payment-channel network.
//!
//! # Spaces
//!
//! - **Ring**: identifiers in `Z/N` with the shorter-arc distance. This is the
//!   Kademlia-style ID space used by ring networks.
//! - **Lattice**: an n-dimensional integer grid under the Manhattan metric that
//!   grows slab by slab and fills gaps before growing. A [`Weave`] adds
//!   long-range partners at geometrically increasing offsets.
//! - **Hyperbolic disk**: concentric rings of doubling size, giving
//!   scale-free small-world wiring with an O(1) approximate distance.
//!
//! None of these structures own the things they position. They map small
//! copyable handles to coordinates and back.

mod disk;
mod error;
mod lattice;
mod ring;

pub use disk::{
    hyperbolic_distance, slots_in_ring, total_slots_through, DiskCoord, HyperbolicDisk, MAX_RING,
    RING_SPACING,
};
pub use error::{Error, Result};
pub use lattice::{Lattice, LatticeCoord, Weave};
pub use ring::RingSpace;
