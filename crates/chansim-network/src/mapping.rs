//! Fullness-to-quantity mappings.
//!
//! Deposits, channel-count targets and acceptance caps are all derived from
//! a node's fullness through a linear interpolation between two bounds.
//! Client channel counts are drawn from a [`RandomRange`] instead.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// `min + (max - min) * fullness`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Linear {
    pub min: f64,
    pub max: f64,
}

impl Linear {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A mapping that ignores fullness.
    pub const fn constant(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Interpolated value for `fullness`.
    pub fn map(&self, fullness: f64) -> f64 {
        self.min + (self.max - self.min) * fullness
    }

    /// Interpolated value rounded to a non-negative count.
    pub fn map_count(&self, fullness: f64) -> usize {
        self.map(fullness).round().max(0.0) as usize
    }
}

/// Inclusive integer range for randomized counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomRange {
    pub min: usize,
    pub max: usize,
}

impl RandomRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Draw a count in `min..=max`. A reversed range yields `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        if self.max <= self.min {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }
}
