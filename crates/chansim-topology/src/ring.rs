//! Circular identifier space.
//!
//! Node identifiers live in `Z/N` where `N` is the ID space size. The
//! distance between two identifiers is the shorter of the two arcs around
//! the circle, which makes the space a proper metric.

use std::f64::consts::TAU;

use crate::{Error, Result};

/// The modular identifier space `Z/N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RingSpace {
    size: u64,
}

impl RingSpace {
    /// Create a ring of `size` identifiers.
    pub fn new(size: u64) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidParameter("ring size must be positive".into()));
        }
        Ok(Self { size })
    }

    /// Number of identifiers on the ring.
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Largest possible distance between two identifiers.
    pub const fn max_distance(&self) -> u64 {
        self.size / 2
    }

    /// Reduce an arbitrary value onto the ring.
    #[inline]
    pub const fn wrap(&self, value: u64) -> u64 {
        value % self.size
    }

    /// Clockwise offset from `from` to `to`: `(to - from) mod N`.
    #[inline]
    pub fn clockwise(&self, from: u64, to: u64) -> u64 {
        let (from, to) = (self.wrap(from), self.wrap(to));
        if to >= from {
            to - from
        } else {
            self.size - (from - to)
        }
    }

    /// Identifier reached by walking `offset` steps clockwise from `from`.
    #[inline]
    pub fn advance(&self, from: u64, offset: u64) -> u64 {
        let from = self.wrap(from) as u128;
        ((from + (offset % self.size) as u128) % self.size as u128) as u64
    }

    /// Ring distance: `min((a - b) mod N, (b - a) mod N)`.
    pub fn distance(&self, a: u64, b: u64) -> u64 {
        let forward = self.clockwise(a, b);
        forward.min(self.size - forward)
    }

    /// Angle of an identifier on the display circle.
    pub fn angle(&self, uid: u64) -> f64 {
        TAU * self.wrap(uid) as f64 / self.size as f64
    }

    /// Display position of a node.
    ///
    /// Fuller nodes sit closer to the center. Only the layout depends on
    /// fullness; `distance` never does.
    pub fn layout(&self, uid: u64, fullness: f64) -> (f64, f64) {
        let radius = 1.0 / (1.0 + fullness.max(0.0));
        let angle = self.angle(uid);
        (radius * angle.cos(), radius * angle.sin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_size_rejected() {
        assert!(RingSpace::new(0).is_err());
    }

    #[test]
    fn distance_takes_shorter_arc() {
        let ring = RingSpace::new(100).unwrap();
        assert_eq!(ring.distance(10, 20), 10);
        assert_eq!(ring.distance(95, 5), 10);
        assert_eq!(ring.distance(5, 95), 10);
        assert_eq!(ring.distance(0, 50), 50);
        assert_eq!(ring.distance(42, 42), 0);
    }

    #[test]
    fn clockwise_wraps() {
        let ring = RingSpace::new(16).unwrap();
        assert_eq!(ring.clockwise(14, 2), 4);
        assert_eq!(ring.clockwise(2, 14), 12);
        assert_eq!(ring.advance(14, 4), 2);
        assert_eq!(ring.advance(3, 32), 3);
    }

    #[test]
    fn layout_pulls_fuller_nodes_inward() {
        let ring = RingSpace::new(360).unwrap();
        let (x0, y0) = ring.layout(90, 0.0);
        let (x1, y1) = ring.layout(90, 1.0);
        assert!((x0 * x0 + y0 * y0).sqrt() > (x1 * x1 + y1 * y1).sqrt());
    }

    #[test]
    fn huge_ring_does_not_overflow() {
        let ring = RingSpace::new(u64::MAX).unwrap();
        assert_eq!(ring.distance(0, u64::MAX - 1), 1);
        assert_eq!(ring.advance(u64::MAX - 1, 3), 2);
    }

    proptest! {
        #[test]
        fn ring_distance_is_a_metric(
            size in 1u64..1_000_000,
            a in any::<u64>(),
            b in any::<u64>(),
            c in any::<u64>(),
        ) {
            let ring = RingSpace::new(size).unwrap();
            let (a, b, c) = (ring.wrap(a), ring.wrap(b), ring.wrap(c));
            prop_assert_eq!(ring.distance(a, a), 0);
            prop_assert_eq!(ring.distance(a, b), ring.distance(b, a));
            prop_assert!(ring.distance(a, b) <= ring.distance(a, c) + ring.distance(c, b));
            prop_assert!(ring.distance(a, b) <= ring.max_distance());
        }
    }
}
