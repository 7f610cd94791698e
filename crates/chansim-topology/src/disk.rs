//! Discretized hyperbolic disk.
//!
//! Slots sit on concentric rings whose size doubles with the ring index,
//! matching the exponential growth of circumference in the hyperbolic
//! plane. Ring `r` sits at hyperbolic radius `r * ln 2` and holds `2^r`
//! slots, so the slots form a binary tree when read ring by ring:
//!
//! - Ring 0: index 0
//! - Ring 1: indices 1-2
//! - Ring 2: indices 3-6
//! - Ring r: indices `2^r - 1` to `2^(r+1) - 2`
//!
//! Two distances are provided. [`HyperbolicDisk::distance`] evaluates the
//! hyperbolic law of cosines; [`DiskCoord::approx_distance`] is an O(1)
//! integer proxy built from ring difference and angular separation.

use std::collections::HashMap;
use std::f64::consts::{LN_2, TAU};
use std::hash::Hash;

use crate::{Error, Result};

/// Radial spacing between consecutive rings.
pub const RING_SPACING: f64 = LN_2;

/// Highest ring a disk may have; keeps slot indices inside `u64`.
pub const MAX_RING: u32 = 62;

/// A slot on the disk: ring index and position on that ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiskCoord {
    pub ring: u32,
    pub slot: u64,
}

/// Number of slots on ring `ring`.
#[inline]
pub const fn slots_in_ring(ring: u32) -> u64 {
    1 << ring
}

/// Total slots on rings `0..=ring`.
#[inline]
pub const fn total_slots_through(ring: u32) -> u64 {
    (1 << (ring + 1)) - 1
}

impl DiskCoord {
    /// The single slot of ring 0.
    pub const CENTER: Self = Self { ring: 0, slot: 0 };

    pub const fn new(ring: u32, slot: u64) -> Self {
        Self { ring, slot }
    }

    /// Coordinate of the `index`-th slot in ring-by-ring order.
    pub fn from_index(index: u64) -> Self {
        let ring = 63 - (index + 1).leading_zeros();
        Self {
            ring,
            slot: index + 1 - slots_in_ring(ring),
        }
    }

    /// Inverse of [`DiskCoord::from_index`].
    pub fn index(&self) -> u64 {
        slots_in_ring(self.ring) - 1 + self.slot
    }

    /// Hyperbolic radius of the ring.
    pub fn radius(&self) -> f64 {
        self.ring as f64 * RING_SPACING
    }

    /// Angle of the slot's center.
    pub fn angle(&self) -> f64 {
        TAU * (self.slot as f64 + 0.5) / slots_in_ring(self.ring) as f64
    }

    /// Slot one ring further in that covers this slot's arc.
    pub fn parent(&self) -> Option<Self> {
        (self.ring > 0).then(|| Self::new(self.ring - 1, self.slot >> 1))
    }

    /// Already-placed partners this slot must connect to when it is filled.
    ///
    /// These are the parent slot, the previous slot on the same ring, and for
    /// the last slot of rings with more than two slots, the first slot, which
    /// closes the ring.
    pub fn inner_partners(&self) -> Vec<Self> {
        let mut partners = Vec::with_capacity(3);
        if let Some(parent) = self.parent() {
            partners.push(parent);
        }
        if self.slot > 0 {
            partners.push(Self::new(self.ring, self.slot - 1));
        }
        let last = slots_in_ring(self.ring) - 1;
        if self.ring >= 2 && self.slot == last {
            partners.push(Self::new(self.ring, 0));
        }
        partners
    }

    /// O(1) approximation of the hyperbolic distance.
    ///
    /// The outer slot is projected onto the inner ring; the result is the
    /// ring difference plus twice the bit length of the angular gap measured
    /// on the inner ring.
    pub fn approx_distance(&self, other: &Self) -> u64 {
        let (inner, outer) = if self.ring <= other.ring {
            (self, other)
        } else {
            (other, self)
        };
        let climb = outer.ring - inner.ring;
        let projected = outer.slot >> climb;
        let size = slots_in_ring(inner.ring);
        let gap = projected.abs_diff(inner.slot);
        let gap = gap.min(size - gap);
        climb as u64 + 2 * (u64::BITS - gap.leading_zeros()) as u64
    }

    /// Euclidean position in the Poincaré disk model.
    pub fn poincare(&self) -> (f64, f64) {
        let r = (self.radius() / 2.0).tanh();
        let angle = self.angle();
        (r * angle.cos(), r * angle.sin())
    }
}

impl std::fmt::Display for DiskCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}]", self.ring, self.slot)
    }
}

/// Hyperbolic distance between two slots (law of cosines).
pub fn hyperbolic_distance(a: &DiskCoord, b: &DiskCoord) -> f64 {
    if a == b {
        return 0.0;
    }
    let (ra, rb) = (a.radius(), b.radius());
    let dtheta = (a.angle() - b.angle()).abs();
    let dtheta = dtheta.min(TAU - dtheta);
    let arg = ra.cosh() * rb.cosh() - ra.sinh() * rb.sinh() * dtheta.cos();
    arg.max(1.0).acosh()
}

/// A disk of fixed hyperbolic radius filled ring by ring.
#[derive(Debug, Clone)]
pub struct HyperbolicDisk<T> {
    radius: f64,
    rings: u32,
    occupants: Vec<T>,
    positions: HashMap<T, DiskCoord>,
}

impl<T: Copy + Eq + Hash> HyperbolicDisk<T> {
    /// Create a disk of the given hyperbolic radius.
    pub fn new(radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(Error::InvalidParameter(format!("disk radius {radius}")));
        }
        let rings = ((radius / RING_SPACING).floor() as u32).min(MAX_RING) + 1;
        Ok(Self {
            radius,
            rings,
            occupants: Vec::new(),
            positions: HashMap::new(),
        })
    }

    /// Hyperbolic radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Number of rings inside the radius.
    pub fn rings(&self) -> u32 {
        self.rings
    }

    /// Total number of slots inside the radius.
    pub fn capacity(&self) -> u64 {
        total_slots_through(self.rings - 1)
    }

    /// Number of placed items.
    pub fn len(&self) -> usize {
        self.occupants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    /// Place `item` on the next free slot.
    pub fn place(&mut self, item: T) -> Result<DiskCoord> {
        if let Some(coord) = self.positions.get(&item) {
            return Ok(*coord);
        }
        let index = self.occupants.len() as u64;
        if index >= self.capacity() {
            return Err(Error::DiskFull {
                capacity: self.capacity(),
            });
        }
        let coord = DiskCoord::from_index(index);
        self.occupants.push(item);
        self.positions.insert(item, coord);
        Ok(coord)
    }

    /// Slot of a placed item.
    pub fn coord_of(&self, item: T) -> Option<DiskCoord> {
        self.positions.get(&item).copied()
    }

    /// Item placed on a slot.
    pub fn occupant(&self, coord: &DiskCoord) -> Option<T> {
        if coord.ring >= self.rings || coord.slot >= slots_in_ring(coord.ring) {
            return None;
        }
        self.occupants.get(coord.index() as usize).copied()
    }

    /// Placed items a newly placed `item` is wired to.
    pub fn inner_partners(&self, item: T) -> Vec<T> {
        self.coord_of(item)
            .map(|coord| {
                coord
                    .inner_partners()
                    .iter()
                    .filter_map(|c| self.occupant(c))
                    .collect()
            })
            .unwrap_or_default()
    }
}
