//! Position strategies.
//!
//! A position strategy places nodes in a metric space and measures the
//! distance between them. Lattice and disk strategies also know which
//! already-placed nodes are geometric neighbors of a newly placed one; the
//! mesh join strategies use that to lay down mandatory short-range channels.
//!
//! Positions are auxiliary. Channels are always read from the
//! [`RawNetwork`](crate::RawNetwork); a strategy only maps handles to
//! coordinates.

use std::fmt;

use chansim_topology::{
    hyperbolic_distance, DiskCoord, HyperbolicDisk, Lattice, LatticeCoord, RingSpace, Weave,
};
use serde::{Deserialize, Serialize};

use crate::{Node, NodeId, Result};

/// Where a node sits, for exporters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Position {
    Ring { x: f64, y: f64 },
    Lattice { coord: LatticeCoord },
    Disk { coord: DiskCoord, x: f64, y: f64 },
}

/// Maps nodes to a metric space.
pub trait PositionStrategy: fmt::Debug {
    /// Give `node` its coordinate. Called once per node, in join order.
    fn place(&mut self, _node: &Node) -> Result<()> {
        Ok(())
    }

    /// Coordinate of a placed node.
    fn map(&self, node: &Node) -> Option<Position>;

    /// Symmetric, non-negative distance, zero for identical nodes.
    fn distance(&self, a: &Node, b: &Node) -> f64;

    /// Upper bound on [`PositionStrategy::distance`], used for normalization.
    fn max_distance(&self) -> f64;

    /// Already-placed nodes a newly placed node must connect to.
    fn geometric_neighbors(&self, _node: &Node) -> Vec<NodeId> {
        Vec::new()
    }

    /// Already-placed long-range partners available as optional shortcuts.
    fn shortcut_candidates(&self, _node: &Node) -> Vec<NodeId> {
        Vec::new()
    }
}

/// Nodes on the circular ID space.
#[derive(Debug, Clone)]
pub struct RingPosition {
    space: RingSpace,
}

impl RingPosition {
    pub fn new(id_space: u64) -> Result<Self> {
        Ok(Self {
            space: RingSpace::new(id_space)?,
        })
    }

    pub fn space(&self) -> &RingSpace {
        &self.space
    }
}

impl PositionStrategy for RingPosition {
    fn map(&self, node: &Node) -> Option<Position> {
        let (x, y) = self.space.layout(node.uid(), node.fullness());
        Some(Position::Ring { x, y })
    }

    fn distance(&self, a: &Node, b: &Node) -> f64 {
        self.space.distance(a.uid(), b.uid()) as f64
    }

    fn max_distance(&self) -> f64 {
        self.space.max_distance() as f64
    }
}

/// Nodes on a self-filling Manhattan lattice, optionally woven.
#[derive(Debug, Clone)]
pub struct LatticePosition {
    lattice: Lattice<NodeId>,
    weave: Option<Weave>,
}

impl LatticePosition {
    /// A plain lattice with `dims` dimensions.
    pub fn new(dims: usize) -> Result<Self> {
        Ok(Self {
            lattice: Lattice::new(dims)?,
            weave: None,
        })
    }

    /// A lattice whose nodes also get weave shortcuts.
    pub fn woven(dims: usize, weave: Weave) -> Result<Self> {
        Ok(Self {
            lattice: Lattice::new(dims)?,
            weave: Some(weave),
        })
    }

    pub fn lattice(&self) -> &Lattice<NodeId> {
        &self.lattice
    }
}

impl PositionStrategy for LatticePosition {
    fn place(&mut self, node: &Node) -> Result<()> {
        self.lattice.insert(node.id());
        Ok(())
    }

    fn map(&self, node: &Node) -> Option<Position> {
        self.lattice
            .coord_of(node.id())
            .map(|coord| Position::Lattice {
                coord: coord.clone(),
            })
    }

    fn distance(&self, a: &Node, b: &Node) -> f64 {
        self.lattice
            .distance(a.id(), b.id())
            .map_or(f64::INFINITY, |d| d as f64)
    }

    fn max_distance(&self) -> f64 {
        self.lattice
            .extents()
            .iter()
            .map(|e| e.saturating_sub(1))
            .sum::<u64>()
            .max(1) as f64
    }

    fn geometric_neighbors(&self, node: &Node) -> Vec<NodeId> {
        self.lattice
            .coord_of(node.id())
            .map(|coord| self.lattice.neighbors(coord))
            .unwrap_or_default()
    }

    fn shortcut_candidates(&self, node: &Node) -> Vec<NodeId> {
        let (Some(weave), Some(coord)) = (self.weave, self.lattice.coord_of(node.id())) else {
            return Vec::new();
        };
        weave
            .partners(coord)
            .iter()
            .filter_map(|c: &LatticeCoord| self.lattice.occupant(c))
            .collect()
    }
}

/// Nodes on a discretized hyperbolic disk.
#[derive(Debug, Clone)]
pub struct DiskPosition {
    disk: HyperbolicDisk<NodeId>,
    approximate: bool,
}

impl DiskPosition {
    /// A disk of the given radius. With `approximate`, distances use the O(1)
    /// discrete proxy instead of the hyperbolic law of cosines.
    pub fn new(radius: f64, approximate: bool) -> Result<Self> {
        Ok(Self {
            disk: HyperbolicDisk::new(radius)?,
            approximate,
        })
    }

    pub fn disk(&self) -> &HyperbolicDisk<NodeId> {
        &self.disk
    }
}

impl PositionStrategy for DiskPosition {
    fn place(&mut self, node: &Node) -> Result<()> {
        self.disk.place(node.id())?;
        Ok(())
    }

    fn map(&self, node: &Node) -> Option<Position> {
        self.disk.coord_of(node.id()).map(|coord| {
            let (x, y) = coord.poincare();
            Position::Disk { coord, x, y }
        })
    }

    fn distance(&self, a: &Node, b: &Node) -> f64 {
        match (self.disk.coord_of(a.id()), self.disk.coord_of(b.id())) {
            (Some(ca), Some(cb)) if self.approximate => ca.approx_distance(&cb) as f64,
            (Some(ca), Some(cb)) => hyperbolic_distance(&ca, &cb),
            _ => f64::INFINITY,
        }
    }

    fn max_distance(&self) -> f64 {
        let outer = self.disk.rings() - 1;
        let bound = if self.approximate {
            (outer as f64) * 3.0
        } else {
            2.0 * DiskCoord::new(outer, 0).radius()
        };
        bound.max(1.0)
    }

    fn geometric_neighbors(&self, node: &Node) -> Vec<NodeId> {
        self.disk.inner_partners(node.id())
    }
}
