//! Fullness distributions.
//!
//! A distribution draws one scalar "fullness" per node. Every distribution
//! owns its own seeded generator: `reset()` reseeds it, so a reset followed
//! by the same calls reproduces the same sequence, and several
//! distributions never share random state.

use std::f64::consts::PI;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Distribution as _;

use crate::{Error, Result};

/// Seed used by every distribution unless overridden.
pub const DEFAULT_SEED: u64 = 0;

/// A resettable scalar sampler.
pub trait Distribution: fmt::Debug {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Reseed to this distribution's deterministic seed.
    fn reset(&mut self);

    /// Draw one fullness value.
    fn random(&mut self) -> f64;

    /// Probability density at `x`, for layout routines.
    fn pdf(&self, _x: f64) -> Result<f64> {
        Err(Error::MissingDensity(self.name()))
    }
}

/// Every node gets the same fullness.
#[derive(Debug, Clone)]
pub struct Constant {
    value: f64,
}

impl Constant {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Distribution for Constant {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn reset(&mut self) {}

    fn random(&mut self) -> f64 {
        self.value
    }
}

/// Uniform on `[low, high)`.
#[derive(Debug, Clone)]
pub struct Uniform {
    low: f64,
    high: f64,
    seed: u64,
    rng: StdRng,
}

impl Uniform {
    pub fn new(low: f64, high: f64, seed: u64) -> Result<Self> {
        if !(low < high) {
            return Err(Error::Distribution(format!("uniform range [{low}, {high})")));
        }
        Ok(Self {
            low,
            high,
            seed,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Uniform on `[0, 1)`.
    pub fn unit(seed: u64) -> Self {
        Self {
            low: 0.0,
            high: 1.0,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Distribution for Uniform {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    fn random(&mut self) -> f64 {
        self.rng.gen_range(self.low..self.high)
    }

    fn pdf(&self, x: f64) -> Result<f64> {
        if x >= self.low && x < self.high {
            Ok(1.0 / (self.high - self.low))
        } else {
            Ok(0.0)
        }
    }
}

/// Lomax (shifted Pareto) with shape `a`, clamped to `max_value`.
///
/// Most nodes are nearly empty; a heavy right tail produces a few very
/// full ones.
#[derive(Debug, Clone)]
pub struct Pareto {
    a: f64,
    max_value: f64,
    seed: u64,
    rng: StdRng,
    inner: rand_distr::Pareto<f64>,
}

impl Pareto {
    pub fn new(a: f64, max_value: f64, seed: u64) -> Result<Self> {
        let inner = rand_distr::Pareto::new(1.0, a)
            .map_err(|e| Error::Distribution(format!("pareto shape {a}: {e}")))?;
        if !(max_value > 0.0) {
            return Err(Error::Distribution(format!("pareto max value {max_value}")));
        }
        Ok(Self {
            a,
            max_value,
            seed,
            rng: StdRng::seed_from_u64(seed),
            inner,
        })
    }
}

impl Distribution for Pareto {
    fn name(&self) -> &'static str {
        "pareto"
    }

    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    fn random(&mut self) -> f64 {
        (self.inner.sample(&mut self.rng) - 1.0).min(self.max_value)
    }

    fn pdf(&self, x: f64) -> Result<f64> {
        if x < 0.0 || x > self.max_value {
            return Ok(0.0);
        }
        Ok(self.a / (1.0 + x).powf(self.a + 1.0))
    }
}

/// Quarter-circle density `4/pi * sqrt(1 - x^2)` on `[0, 1]`.
///
/// This is the horizontal coordinate of a point spread evenly over a
/// quarter disk, drawn by rejection on the unit square.
#[derive(Debug, Clone)]
pub struct Circle {
    seed: u64,
    rng: StdRng,
}

impl Circle {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Distribution for Circle {
    fn name(&self) -> &'static str {
        "circle"
    }

    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    fn random(&mut self) -> f64 {
        loop {
            let x: f64 = self.rng.gen();
            let y: f64 = self.rng.gen();
            if x * x + y * y <= 1.0 {
                return x;
            }
        }
    }

    fn pdf(&self, x: f64) -> Result<f64> {
        if (0.0..=1.0).contains(&x) {
            Ok(4.0 / PI * (1.0 - x * x).sqrt())
        } else {
            Ok(0.0)
        }
    }
}

/// Beta distribution with shapes `a` and `b`.
#[derive(Debug, Clone)]
pub struct Beta {
    seed: u64,
    rng: StdRng,
    inner: rand_distr::Beta<f64>,
}

impl Beta {
    pub fn new(a: f64, b: f64, seed: u64) -> Result<Self> {
        let inner = rand_distr::Beta::new(a, b)
            .map_err(|e| Error::Distribution(format!("beta({a}, {b}): {e}")))?;
        Ok(Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            inner,
        })
    }
}

impl Distribution for Beta {
    fn name(&self) -> &'static str {
        "beta"
    }

    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    fn random(&mut self) -> f64 {
        self.inner.sample(&mut self.rng)
    }
}

/// Many empty clients, a few servers.
///
/// Returns exactly 0 with probability `client_fraction`; otherwise draws
/// from `inner` and rescales the draw onto `[0.5, 1]`.
#[derive(Debug)]
pub struct ClientServer {
    client_fraction: f64,
    inner: Box<dyn Distribution>,
    seed: u64,
    rng: StdRng,
}

impl ClientServer {
    pub fn new(client_fraction: f64, inner: Box<dyn Distribution>, seed: u64) -> Result<Self> {
        if !(0.0..=1.0).contains(&client_fraction) {
            return Err(Error::Distribution(format!(
                "client fraction {client_fraction}"
            )));
        }
        Ok(Self {
            client_fraction,
            inner,
            seed,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl Distribution for ClientServer {
    fn name(&self) -> &'static str {
        "client_server"
    }

    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
        self.inner.reset();
    }

    fn random(&mut self) -> f64 {
        if self.rng.gen_bool(self.client_fraction) {
            0.0
        } else {
            0.5 + 0.5 * self.inner.random().clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(dist: &mut dyn Distribution, n: usize) -> Vec<f64> {
        (0..n).map(|_| dist.random()).collect()
    }

    #[test]
    fn reset_reproduces_sequence() {
        let mut dists: Vec<Box<dyn Distribution>> = vec![
            Box::new(Uniform::unit(3)),
            Box::new(Pareto::new(1.5, 10.0, 3).unwrap()),
            Box::new(Circle::new(3)),
            Box::new(Beta::new(2.0, 5.0, 3).unwrap()),
            Box::new(ClientServer::new(0.8, Box::new(Uniform::unit(4)), 3).unwrap()),
        ];
        for dist in dists.iter_mut() {
            dist.reset();
            let first = draw(dist.as_mut(), 50);
            dist.reset();
            dist.reset();
            let second = draw(dist.as_mut(), 50);
            assert_eq!(first, second, "{} not reproducible", dist.name());
        }
    }

    #[test]
    fn separate_instances_do_not_interfere() {
        let mut a = Uniform::unit(11);
        let mut b = Uniform::unit(11);
        let first = a.random();
        let _ = draw(&mut b, 10);
        let mut c = Uniform::unit(11);
        assert_eq!(first, c.random());
    }

    #[test]
    fn samples_stay_in_domain() {
        let mut pareto = Pareto::new(1.2, 4.0, 1).unwrap();
        assert!(draw(&mut pareto, 500).iter().all(|x| (0.0..=4.0).contains(x)));

        let mut circle = Circle::new(1);
        assert!(draw(&mut circle, 500).iter().all(|x| (0.0..=1.0).contains(x)));

        let mut beta = Beta::new(0.5, 0.5, 1).unwrap();
        assert!(draw(&mut beta, 500).iter().all(|x| (0.0..=1.0).contains(x)));
    }

    #[test]
    fn client_server_splits_roles() {
        let mut dist = ClientServer::new(0.9, Box::new(Uniform::unit(2)), 5).unwrap();
        let samples = draw(&mut dist, 2000);
        let clients = samples.iter().filter(|x| **x == 0.0).count();
        assert!(clients > 1600 && clients < 1990, "clients = {clients}");
        assert!(samples
            .iter()
            .filter(|x| **x != 0.0)
            .all(|x| (0.5..=1.0).contains(x)));
    }

    #[test]
    fn density_where_defined() {
        assert_eq!(Uniform::unit(0).pdf(0.3), Ok(1.0));
        assert!((Circle::new(0).pdf(0.0).unwrap() - 4.0 / PI).abs() < 1e-12);
        assert_eq!(Circle::new(0).pdf(1.5), Ok(0.0));
        assert_eq!(Pareto::new(2.0, 5.0, 0).unwrap().pdf(0.0), Ok(2.0));
    }

    #[test]
    fn missing_density_is_an_error() {
        assert_eq!(Constant::new(0.5).pdf(0.5), Err(Error::MissingDensity("constant")));
        let beta = Beta::new(2.0, 2.0, 0).unwrap();
        assert_eq!(beta.pdf(0.5), Err(Error::MissingDensity("beta")));
    }

    #[test]
    fn invalid_parameters_rejected() {
        assert!(Uniform::new(1.0, 1.0, 0).is_err());
        assert!(Pareto::new(-1.0, 1.0, 0).is_err());
        assert!(Beta::new(0.0, 1.0, 0).is_err());
        assert!(ClientServer::new(1.5, Box::new(Constant::new(1.0)), 0).is_err());
    }
}
