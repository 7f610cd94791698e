//! Self-filling n-dimensional integer lattice.
//!
//! Nodes are placed on integer coordinates under the Manhattan metric. The
//! lattice keeps the occupied region box-shaped: it tracks every free
//! coordinate inside the current bounding box (a "gap") and fills those,
//! nearest to the origin first, before it grows the box by one slab.
//!
//! # Growth
//!
//! When no gap is left the box is extended along the dimension with the
//! smallest extent (lowest dimension index on ties). The new slab is added
//! on the side closer to the origin, on the positive side on ties. All
//! coordinates of the new slab become gaps.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;
use std::ops::{Add, Neg, Sub};

use crate::{Error, Result};

/// A point on the integer lattice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatticeCoord(pub Vec<i64>);

impl LatticeCoord {
    /// The origin of an `dims`-dimensional lattice.
    pub fn origin(dims: usize) -> Self {
        Self(vec![0; dims])
    }

    /// Number of dimensions.
    pub fn dims(&self) -> usize {
        self.0.len()
    }

    /// Manhattan distance between two coordinates of equal dimension.
    pub fn manhattan_distance(&self, other: &Self) -> u64 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b).unsigned_abs())
            .sum()
    }

    /// Manhattan distance from the origin.
    pub fn norm(&self) -> u64 {
        self.0.iter().map(|c| c.unsigned_abs()).sum()
    }

    /// Copy of this coordinate moved by `delta` along `dim`.
    pub fn offset(&self, dim: usize, delta: i64) -> Self {
        let mut moved = self.clone();
        moved.0[dim] += delta;
        moved
    }

    /// The `2 * dims` coordinates at Manhattan distance one.
    pub fn axis_neighbors(&self) -> Vec<Self> {
        (0..self.dims())
            .flat_map(|dim| [self.offset(dim, 1), self.offset(dim, -1)])
            .collect()
    }
}

impl Add for &LatticeCoord {
    type Output = LatticeCoord;

    fn add(self, other: Self) -> LatticeCoord {
        LatticeCoord(self.0.iter().zip(&other.0).map(|(a, b)| a + b).collect())
    }
}

impl Sub for &LatticeCoord {
    type Output = LatticeCoord;

    fn sub(self, other: Self) -> LatticeCoord {
        LatticeCoord(self.0.iter().zip(&other.0).map(|(a, b)| a - b).collect())
    }
}

impl Neg for &LatticeCoord {
    type Output = LatticeCoord;

    fn neg(self) -> LatticeCoord {
        LatticeCoord(self.0.iter().map(|c| -c).collect())
    }
}

impl std::fmt::Display for LatticeCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, ")")
    }
}

/// Gap ordering key: nearest to the origin first, then lexicographic.
type GapKey = (u64, LatticeCoord);

fn gap_key(coord: LatticeCoord) -> GapKey {
    (coord.norm(), coord)
}

/// An auto-expanding lattice holding items of type `T`.
///
/// The lattice only maps items to coordinates. It never owns the items it
/// positions; `T` is normally a small copyable handle.
#[derive(Debug, Clone)]
pub struct Lattice<T> {
    dims: usize,
    min: Vec<i64>,
    max: Vec<i64>,
    occupants: HashMap<LatticeCoord, T>,
    positions: HashMap<T, LatticeCoord>,
    gaps: BTreeSet<GapKey>,
}

impl<T: Copy + Eq + Hash> Lattice<T> {
    /// Create an empty lattice with `dims` dimensions.
    pub fn new(dims: usize) -> Result<Self> {
        if dims == 0 {
            return Err(Error::InvalidDimensions(dims));
        }
        let mut gaps = BTreeSet::new();
        gaps.insert(gap_key(LatticeCoord::origin(dims)));
        Ok(Self {
            dims,
            min: vec![0; dims],
            max: vec![0; dims],
            occupants: HashMap::new(),
            positions: HashMap::new(),
            gaps,
        })
    }

    /// Number of dimensions.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Number of placed items.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether nothing has been placed yet.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of free coordinates inside the bounding box.
    pub fn gap_count(&self) -> usize {
        self.gaps.len()
    }

    /// Width of the bounding box along each dimension.
    pub fn extents(&self) -> Vec<u64> {
        self.min
            .iter()
            .zip(&self.max)
            .map(|(lo, hi)| (hi - lo + 1) as u64)
            .collect()
    }

    /// Place `item` on the next free coordinate and return it.
    ///
    /// Placing an item twice returns its existing coordinate.
    pub fn insert(&mut self, item: T) -> LatticeCoord {
        if let Some(coord) = self.positions.get(&item) {
            return coord.clone();
        }
        let coord = self.next_free();
        self.occupants.insert(coord.clone(), item);
        self.positions.insert(item, coord.clone());
        coord
    }

    /// Remove `item`, turning its coordinate back into a gap.
    pub fn remove(&mut self, item: T) -> Option<LatticeCoord> {
        let coord = self.positions.remove(&item)?;
        self.occupants.remove(&coord);
        self.gaps.insert(gap_key(coord.clone()));
        Some(coord)
    }

    /// Coordinate of a placed item.
    pub fn coord_of(&self, item: T) -> Option<&LatticeCoord> {
        self.positions.get(&item)
    }

    /// Item placed at a coordinate.
    pub fn occupant(&self, coord: &LatticeCoord) -> Option<T> {
        self.occupants.get(coord).copied()
    }

    /// Occupied axis neighbors of a coordinate.
    pub fn neighbors(&self, coord: &LatticeCoord) -> Vec<T> {
        coord
            .axis_neighbors()
            .iter()
            .filter_map(|n| self.occupant(n))
            .collect()
    }

    /// Manhattan distance between two placed items.
    pub fn distance(&self, a: T, b: T) -> Option<u64> {
        Some(self.coord_of(a)?.manhattan_distance(self.coord_of(b)?))
    }

    fn next_free(&mut self) -> LatticeCoord {
        if self.gaps.is_empty() {
            self.extend();
        }
        // extend() always adds at least one gap
        match self.gaps.pop_first() {
            Some((_, coord)) => coord,
            None => LatticeCoord::origin(self.dims),
        }
    }

    /// Grow the bounding box by one slab and register its coordinates as gaps.
    fn extend(&mut self) {
        let extents = self.extents();
        let dim = (0..self.dims)
            .min_by_key(|&d| (extents[d], d))
            .unwrap_or(0);
        let bound = if self.max[dim].unsigned_abs() <= self.min[dim].unsigned_abs() {
            self.max[dim] += 1;
            self.max[dim]
        } else {
            self.min[dim] -= 1;
            self.min[dim]
        };

        let mut slab = vec![LatticeCoord::origin(self.dims)];
        for d in 0..self.dims {
            let range: Vec<i64> = if d == dim {
                vec![bound]
            } else {
                (self.min[d]..=self.max[d]).collect()
            };
            slab = slab
                .iter()
                .flat_map(|partial| {
                    range.iter().map(move |&v| {
                        let mut next = partial.clone();
                        next.0[d] = v;
                        next
                    })
                })
                .collect();
        }
        self.gaps.extend(slab.into_iter().map(gap_key));
    }
}

/// Long-range "weave" links of a woven lattice.
///
/// Every coordinate gets extra partners along a single hashed dimension at
/// geometrically increasing offsets `(max(2, dims) * base_factor)^order`
/// for `order` in `[min_order, max_order]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Weave {
    pub base_factor: u64,
    pub min_order: u32,
    pub max_order: u32,
}

impl Weave {
    /// Dimension carrying the weave links of `coord`: `sum(coord) mod dims`.
    pub fn dimension(coord: &LatticeCoord) -> usize {
        let sum: i64 = coord.0.iter().sum();
        sum.rem_euclid(coord.dims().max(1) as i64) as usize
    }

    /// Weave offsets for a lattice of `dims` dimensions.
    pub fn offsets(&self, dims: usize) -> Vec<i64> {
        let base = (dims.max(2) as u64).saturating_mul(self.base_factor) as i64;
        (self.min_order..=self.max_order)
            .map(|order| base.saturating_pow(order))
            .collect()
    }

    /// Coordinates woven to `coord`, in both directions along its weave dimension.
    pub fn partners(&self, coord: &LatticeCoord) -> Vec<LatticeCoord> {
        let dim = Self::dimension(coord);
        self.offsets(coord.dims())
            .into_iter()
            .flat_map(|off| [coord.offset(dim, off), coord.offset(dim, -off)])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_dimensions_rejected() {
        assert!(Lattice::<u32>::new(0).is_err());
    }

    #[test]
    fn first_item_lands_on_origin() {
        let mut lattice = Lattice::new(2).unwrap();
        assert_eq!(lattice.insert(0u32), LatticeCoord::origin(2));
    }

    #[test]
    fn growth_prefers_smallest_extent_then_positive_side() {
        let mut lattice = Lattice::new(2).unwrap();
        let coords: Vec<_> = (0u32..6).map(|i| lattice.insert(i)).collect();

        assert_eq!(coords[0], LatticeCoord(vec![0, 0]));
        // dim 0 and dim 1 tie at extent 1: dim 0 grows, positive side
        assert_eq!(coords[1], LatticeCoord(vec![1, 0]));
        // dim 1 is now the narrowest
        assert_eq!(coords[2], LatticeCoord(vec![0, 1]));
        assert_eq!(coords[3], LatticeCoord(vec![1, 1]));
        // dim 0 grows again, on the negative side which is closer to the origin
        assert_eq!(coords[4], LatticeCoord(vec![-1, 0]));
        assert_eq!(coords[5], LatticeCoord(vec![-1, 1]));
        assert_eq!(lattice.extents(), vec![3, 2]);
    }

    #[test]
    fn gaps_fill_before_growth() {
        let mut lattice = Lattice::new(2).unwrap();
        for i in 0u32..4 {
            lattice.insert(i);
        }
        let extents = lattice.extents();
        let freed = lattice.remove(1).unwrap();
        assert_eq!(lattice.gap_count(), 1);

        assert_eq!(lattice.insert(9), freed);
        assert_eq!(lattice.extents(), extents);
        assert_eq!(lattice.gap_count(), 0);
    }

    #[test]
    fn insert_is_idempotent() {
        let mut lattice = Lattice::new(3).unwrap();
        let first = lattice.insert(7u32);
        assert_eq!(lattice.insert(7u32), first);
        assert_eq!(lattice.len(), 1);
    }

    #[test]
    fn neighbors_only_reports_occupied() {
        let mut lattice = Lattice::new(2).unwrap();
        for i in 0u32..4 {
            lattice.insert(i);
        }
        // (0,0) touches (1,0) and (0,1)
        let mut around_origin = lattice.neighbors(&LatticeCoord::origin(2));
        around_origin.sort();
        assert_eq!(around_origin, vec![1, 2]);
        assert_eq!(lattice.distance(0, 3), Some(2));
    }

    #[test]
    fn placements_are_unique_and_compact() {
        let mut lattice = Lattice::new(3).unwrap();
        let coords: Vec<_> = (0u32..64).map(|i| lattice.insert(i)).collect();
        let unique: std::collections::HashSet<_> = coords.iter().collect();
        assert_eq!(unique.len(), 64);
        // 64 nodes in 3 dimensions fit a 4x4x4 box
        assert!(lattice.extents().iter().all(|&e| e <= 4));
    }

    #[test]
    fn weave_offsets_grow_geometrically() {
        let weave = Weave {
            base_factor: 2,
            min_order: 1,
            max_order: 3,
        };
        assert_eq!(weave.offsets(2), vec![4, 16, 64]);
        // one-dimensional lattices still use base 2
        assert_eq!(weave.offsets(1), vec![4, 16, 64]);
        assert_eq!(weave.offsets(3), vec![6, 36, 216]);
    }

    #[test]
    fn weave_dimension_hashes_coordinate_sum() {
        assert_eq!(Weave::dimension(&LatticeCoord(vec![0, 0, 0])), 0);
        assert_eq!(Weave::dimension(&LatticeCoord(vec![1, 1, 0])), 2);
        assert_eq!(Weave::dimension(&LatticeCoord(vec![-1, 0, 0])), 2);

        let weave = Weave {
            base_factor: 1,
            min_order: 1,
            max_order: 1,
        };
        let partners = weave.partners(&LatticeCoord(vec![1, 0]));
        assert_eq!(
            partners,
            vec![LatticeCoord(vec![1, 2]), LatticeCoord(vec![1, -2])]
        );
    }

    #[test]
    fn coord_arithmetic() {
        let a = LatticeCoord(vec![1, 2, 3]);
        let b = LatticeCoord(vec![4, -1, 2]);
        assert_eq!(&a + &b, LatticeCoord(vec![5, 1, 5]));
        assert_eq!(&a - &b, LatticeCoord(vec![-3, 3, 1]));
        assert_eq!(&a + &(-&b), &a - &b);
        assert_eq!(a.to_string(), "(1, 2, 3)");
    }

    proptest! {
        #[test]
        fn manhattan_is_a_metric(
            a in proptest::collection::vec(-50i64..50, 3),
            b in proptest::collection::vec(-50i64..50, 3),
            c in proptest::collection::vec(-50i64..50, 3),
        ) {
            let (a, b, c) = (LatticeCoord(a), LatticeCoord(b), LatticeCoord(c));
            prop_assert_eq!(a.manhattan_distance(&a), 0);
            prop_assert_eq!(a.manhattan_distance(&b), b.manhattan_distance(&a));
            prop_assert!(
                a.manhattan_distance(&b) <= a.manhattan_distance(&c) + c.manhattan_distance(&b)
            );
        }
    }
}
