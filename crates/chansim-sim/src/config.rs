//! Simulation configuration.
//!
//! A [`SimulationConfig`] is plain data, loaded from JSON. Each strategy
//! section is an internally tagged enum (`"kind": "..."`) that knows how to
//! build the matching strategy object. Missing fields fall back to the
//! defaults, which describe a small Kademlia ring network routed globally.

use std::fs;
use std::path::Path;

use chansim_network::{
    hyperbolic_join, kademlia_join, lattice_join, micro_raiden_join, random_join, Beta, Circle,
    ClientServer, Constant, DiskPosition, Distribution, JoinStrategy, KademliaJoinConfig,
    LatticeJoinConfig, LatticePosition, Linear, MicroRaidenJoinConfig, NetworkConfig, Pareto,
    PositionStrategy, RandomJoinConfig, RingPosition, Uniform, DEFAULT_SEED,
};
use chansim_routing::{
    DistanceNetBalancePriority, DistancePriority, FeeModel, GlobalRouting,
    GloballyAssistedPriority, GreedyDepthFirst, NextHopRouting, PriorityStrategy,
    RoutingStrategy,
};
use chansim_topology::Weave;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Fullness distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DistributionConfig {
    Constant {
        value: f64,
    },
    Uniform {
        low: f64,
        high: f64,
        #[serde(default)]
        seed: u64,
    },
    Pareto {
        a: f64,
        max_value: f64,
        #[serde(default)]
        seed: u64,
    },
    Circle {
        #[serde(default)]
        seed: u64,
    },
    Beta {
        a: f64,
        b: f64,
        #[serde(default)]
        seed: u64,
    },
    ClientServer {
        client_fraction: f64,
        inner: Box<DistributionConfig>,
        #[serde(default)]
        seed: u64,
    },
}

impl Default for DistributionConfig {
    fn default() -> Self {
        DistributionConfig::Uniform {
            low: 0.0,
            high: 1.0,
            seed: DEFAULT_SEED,
        }
    }
}

impl DistributionConfig {
    pub fn build(&self) -> Result<Box<dyn Distribution>> {
        Ok(match self {
            DistributionConfig::Constant { value } => Box::new(Constant::new(*value)),
            DistributionConfig::Uniform { low, high, seed } => {
                Box::new(Uniform::new(*low, *high, *seed)?)
            }
            DistributionConfig::Pareto { a, max_value, seed } => {
                Box::new(Pareto::new(*a, *max_value, *seed)?)
            }
            DistributionConfig::Circle { seed } => Box::new(Circle::new(*seed)),
            DistributionConfig::Beta { a, b, seed } => Box::new(Beta::new(*a, *b, *seed)?),
            DistributionConfig::ClientServer {
                client_fraction,
                inner,
                seed,
            } => Box::new(ClientServer::new(*client_fraction, inner.build()?, *seed)?),
        })
    }
}

/// Metric space the nodes live in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PositionConfig {
    /// The circular ID space; distances come from uids.
    #[default]
    Ring,
    Lattice {
        dims: usize,
    },
    WovenLattice {
        dims: usize,
        weave: Weave,
    },
    Hyperbolic {
        radius: f64,
        #[serde(default)]
        approximate: bool,
    },
}

impl PositionConfig {
    pub fn build(&self, id_space: u64) -> Result<Box<dyn PositionStrategy>> {
        Ok(match self {
            PositionConfig::Ring => Box::new(RingPosition::new(id_space)?),
            PositionConfig::Lattice { dims } => Box::new(LatticePosition::new(*dims)?),
            PositionConfig::WovenLattice { dims, weave } => {
                Box::new(LatticePosition::woven(*dims, *weave)?)
            }
            PositionConfig::Hyperbolic {
                radius,
                approximate,
            } => Box::new(DiskPosition::new(*radius, *approximate)?),
        })
    }
}

/// Join strategy with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JoinConfig {
    Kademlia(KademliaJoinConfig),
    Lattice(LatticeJoinConfig),
    Hyperbolic { deposit: Linear },
    MicroRaiden(MicroRaidenJoinConfig),
    Random(RandomJoinConfig),
}

impl Default for JoinConfig {
    fn default() -> Self {
        JoinConfig::Kademlia(KademliaJoinConfig::default())
    }
}

impl JoinConfig {
    pub fn build(&self) -> Box<dyn JoinStrategy> {
        match self {
            JoinConfig::Kademlia(config) => Box::new(kademlia_join(config)),
            JoinConfig::Lattice(config) => Box::new(lattice_join(config)),
            JoinConfig::Hyperbolic { deposit } => Box::new(hyperbolic_join(*deposit)),
            JoinConfig::MicroRaiden(config) => Box::new(micro_raiden_join(config)),
            JoinConfig::Random(config) => Box::new(random_join(config)),
        }
    }
}

/// Priority function for next-hop and greedy routing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriorityConfig {
    #[default]
    Distance,
    DistanceNetBalance,
    GloballyAssisted { inner: Box<PriorityConfig> },
}

impl PriorityConfig {
    pub fn build(&self) -> Box<dyn PriorityStrategy> {
        match self {
            PriorityConfig::Distance => Box::new(DistancePriority),
            PriorityConfig::DistanceNetBalance => Box::new(DistanceNetBalancePriority),
            PriorityConfig::GloballyAssisted { inner } => {
                Box::new(GloballyAssistedPriority::boxed(inner.build()))
            }
        }
    }
}

/// Routing strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoutingKind {
    #[default]
    Global,
    NextHop {
        #[serde(default)]
        priority: PriorityConfig,
        max_paths: usize,
    },
    Greedy {
        #[serde(default)]
        priority: PriorityConfig,
        max_depth: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub strategy: RoutingKind,
    /// Global routing weights and the fee charged per transfer.
    pub fee: FeeModel,
}

impl RoutingConfig {
    pub fn build(&self) -> Result<Box<dyn RoutingStrategy>> {
        Ok(match &self.strategy {
            RoutingKind::Global => Box::new(GlobalRouting::new(self.fee)),
            RoutingKind::NextHop {
                priority,
                max_paths,
            } => Box::new(NextHopRouting::boxed(priority.build(), *max_paths)?),
            RoutingKind::Greedy {
                priority,
                max_depth,
            } => Box::new(GreedyDepthFirst::boxed(priority.build(), *max_depth)?),
        })
    }
}

/// Random transfers to run after construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub count: usize,
    pub min_value: f64,
    pub max_value: f64,
    pub seed: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            count: 100,
            min_value: 1.0,
            max_value: 5.0,
            seed: DEFAULT_SEED,
        }
    }
}

/// Complete description of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub num_nodes: usize,
    pub id_space: u64,
    pub seed: u64,
    pub distribution: DistributionConfig,
    pub position: PositionConfig,
    pub join: JoinConfig,
    pub routing: RoutingConfig,
    pub transfers: TransferConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_nodes: 200,
            id_space: 1 << 16,
            seed: DEFAULT_SEED,
            distribution: DistributionConfig::default(),
            position: PositionConfig::default(),
            join: JoinConfig::default(),
            routing: RoutingConfig::default(),
            transfers: TransferConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_nodes == 0 {
            return Err(Error::InvalidParameter("num_nodes must be positive".into()));
        }
        let TransferConfig {
            min_value,
            max_value,
            ..
        } = self.transfers;
        if !(min_value > 0.0 && min_value <= max_value) {
            return Err(Error::InvalidParameter(format!(
                "transfer values [{min_value}, {max_value}]"
            )));
        }
        Ok(())
    }

    pub fn network(&self) -> NetworkConfig {
        NetworkConfig {
            num_nodes: self.num_nodes,
            id_space: self.id_space,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        let config = SimulationConfig::from_json("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.network().num_nodes, 200);
    }

    #[test]
    fn tagged_sections_parse() {
        let json = r#"{
            "num_nodes": 50,
            "distribution": {
                "kind": "client_server",
                "client_fraction": 0.9,
                "inner": { "kind": "pareto", "a": 1.5, "max_value": 1.0 }
            },
            "position": { "kind": "woven_lattice", "dims": 2,
                          "weave": { "base_factor": 1, "min_order": 1, "max_order": 3 } },
            "join": { "kind": "lattice", "shortcut_channels": { "min": 0.0, "max": 3.0 } },
            "routing": {
                "strategy": { "kind": "next_hop", "max_paths": 500,
                              "priority": { "kind": "globally_assisted",
                                            "inner": { "kind": "distance_net_balance" } } },
                "fee": "imbalance"
            },
            "transfers": { "count": 10 }
        }"#;
        let config = SimulationConfig::from_json(json).unwrap();
        assert_eq!(config.num_nodes, 50);
        assert!(matches!(config.position, PositionConfig::WovenLattice { dims: 2, .. }));
        let JoinConfig::Lattice(lattice) = &config.join else {
            panic!("expected lattice join, got {:?}", config.join);
        };
        assert_eq!(lattice.shortcut_channels, Linear::new(0.0, 3.0));
        assert_eq!(lattice.deposit, LatticeJoinConfig::default().deposit);
        assert_eq!(config.routing.fee, FeeModel::Imbalance);
        assert_eq!(config.transfers.count, 10);
        assert_eq!(config.transfers.max_value, 5.0);

        assert!(config.distribution.build().is_ok());
        assert!(config.position.build(config.id_space).is_ok());
        assert!(config.routing.build().is_ok());
    }

    #[test]
    fn config_round_trips_through_json() {
        let mut config = SimulationConfig::default();
        config.join = JoinConfig::Hyperbolic {
            deposit: Linear::constant(7.0),
        };
        config.position = PositionConfig::Hyperbolic {
            radius: 10.0,
            approximate: true,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(SimulationConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(matches!(
            SimulationConfig::from_json(r#"{ "num_nodes": 0 }"#),
            Err(Error::InvalidParameter(_))
        ));
        let reversed = r#"{ "transfers": { "min_value": 4.0, "max_value": 2.0 } }"#;
        assert!(matches!(
            SimulationConfig::from_json(reversed),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            SimulationConfig::from_json(r#"{ "position": { "kind": "torus" } }"#),
            Err(Error::Config(_))
        ));
        let zero_budget = RoutingConfig {
            strategy: RoutingKind::Greedy {
                priority: PriorityConfig::Distance,
                max_depth: 0,
            },
            fee: FeeModel::Constant,
        };
        assert!(matches!(zero_budget.build(), Err(Error::Routing(_))));
    }
}
