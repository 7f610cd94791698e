//! Simulation driver.
//!
//! Builds a network from a [`SimulationConfig`], then runs transfers over it
//! while recording a [`SimEvent`] timeline.

use chansim_network::{Network, NetworkBuilder, NodeId};
use chansim_routing::{execute_transfer, RoutingStrategy, TransferOutcome};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Error, NetworkSnapshot, Result, SimEvent, SimulationConfig, TransferConfig};

/// Aggregate statistics over a set of transfers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub success_rate: f64,
    /// Mean path length of successful transfers.
    pub mean_hops: f64,
    /// Mean fee of successful transfers.
    pub mean_fee: f64,
    /// Mean number of partial paths searched, failures included.
    pub mean_searched: f64,
}

impl TransferSummary {
    pub fn from_outcomes(outcomes: &[TransferOutcome]) -> Self {
        let attempted = outcomes.len();
        if attempted == 0 {
            return Self::default();
        }
        let succeeded: Vec<&TransferOutcome> = outcomes.iter().filter(|o| o.succeeded()).collect();
        let mean = |total: f64, count: usize| if count == 0 { 0.0 } else { total / count as f64 };
        Self {
            attempted,
            succeeded: succeeded.len(),
            success_rate: succeeded.len() as f64 / attempted as f64,
            mean_hops: mean(
                succeeded.iter().map(|o| o.hops() as f64).sum(),
                succeeded.len(),
            ),
            mean_fee: mean(succeeded.iter().map(|o| o.fee).sum(), succeeded.len()),
            mean_searched: mean(outcomes.iter().map(|o| o.searched as f64).sum(), attempted),
        }
    }
}

/// A built network plus the routing and randomness that exercise it.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    network: Network,
    routing: Box<dyn RoutingStrategy>,
    events: Vec<SimEvent>,
    outcomes: Vec<TransferOutcome>,
    rng: StdRng,
    step: u64,
}

impl Simulation {
    /// Build the configured network and record its construction timeline.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let network = NetworkBuilder::new(
            config.network(),
            config.distribution.build()?,
            config.position.build(config.id_space)?,
            config.join.build(),
        )
        .build()?;
        let routing = config.routing.build()?;
        let rng = StdRng::seed_from_u64(config.transfers.seed);

        let mut sim = Self {
            config,
            network,
            routing,
            events: Vec::new(),
            outcomes: Vec::new(),
            rng,
            step: 0,
        };
        sim.record_construction();
        Ok(sim)
    }

    fn record_construction(&mut self) {
        let raw = &self.network.raw;
        for (step, join) in self.network.report.joins.iter().enumerate() {
            let step = step as u64;
            let Some(node) = raw.node(join.node) else {
                continue;
            };
            self.events.push(SimEvent::NodeJoined {
                node: join.node,
                uid: node.uid(),
                fullness: node.fullness(),
                mandatory: join.mandatory,
                initiated: join.initiated,
                exhausted: join.exhausted,
                step,
            });
            for &partner in &join.partners {
                let deposit = |from, to| raw.channel(from, to).map_or(0.0, |c| c.deposit());
                self.events.push(SimEvent::ChannelOpened {
                    a: join.node,
                    b: partner,
                    deposit_ab: deposit(join.node, partner),
                    deposit_ba: deposit(partner, join.node),
                    step,
                });
            }
        }
        self.step = self.network.report.joins.len() as u64;
        for &node in &self.network.report.pruned {
            self.events.push(SimEvent::NodePruned {
                node,
                step: self.step,
            });
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn node_count(&self) -> usize {
        self.network.raw.node_count()
    }

    pub fn channel_count(&self) -> usize {
        self.network.raw.channel_pair_count()
    }

    /// Every transfer run so far, in order.
    pub fn outcomes(&self) -> &[TransferOutcome] {
        &self.outcomes
    }

    /// Route and execute a single transfer.
    pub fn transfer(
        &mut self,
        source: NodeId,
        target: NodeId,
        value: f64,
    ) -> Result<TransferOutcome> {
        let network = &mut self.network;
        let outcome = execute_transfer(
            &mut network.raw,
            network.position.as_ref(),
            self.routing.as_ref(),
            self.config.routing.fee,
            source,
            target,
            value,
        )?;
        self.step += 1;
        self.events.push(if outcome.succeeded() {
            SimEvent::TransferRouted {
                source,
                target,
                value,
                hops: outcome.hops(),
                fee: outcome.fee,
                searched: outcome.searched,
                step: self.step,
            }
        } else {
            SimEvent::TransferFailed {
                source,
                target,
                value,
                status: outcome.status,
                searched: outcome.searched,
                step: self.step,
            }
        });
        self.outcomes.push(outcome.clone());
        Ok(outcome)
    }

    /// Run `count` transfers between random distinct nodes with values drawn
    /// from the configured range. Returns the summary of this batch.
    pub fn run_transfers(&mut self, count: usize) -> Result<TransferSummary> {
        let ids = self.network.raw.node_ids();
        if ids.len() < 2 {
            return Err(Error::InvalidParameter(format!(
                "transfers need two nodes, network has {}",
                ids.len()
            )));
        }
        let TransferConfig {
            min_value,
            max_value,
            ..
        } = self.config.transfers;
        let first = self.outcomes.len();
        for _ in 0..count {
            let pick: Vec<NodeId> = ids.choose_multiple(&mut self.rng, 2).copied().collect();
            let [source, target] = pick[..] else {
                continue;
            };
            let value = self.rng.gen_range(min_value..=max_value);
            self.transfer(source, target, value)?;
        }
        let summary = TransferSummary::from_outcomes(&self.outcomes[first..]);
        info!(
            "{} transfers: {} succeeded ({:.1}%), mean {:.2} hops",
            summary.attempted,
            summary.succeeded,
            summary.success_rate * 100.0,
            summary.mean_hops
        );
        Ok(summary)
    }

    /// Summary over every transfer run so far.
    pub fn summary(&self) -> TransferSummary {
        TransferSummary::from_outcomes(&self.outcomes)
    }

    /// Detach the channels of a random `fraction` of nodes.
    pub fn freeze(&mut self, fraction: f64) -> Result<Vec<NodeId>> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(Error::InvalidParameter(format!(
                "freeze fraction {fraction} outside [0, 1]"
            )));
        }
        let frozen = self.network.raw.freeze_random(fraction, &mut self.rng);
        info!(
            "froze {} nodes ({} channels detached)",
            frozen.len(),
            self.network.raw.frozen_count()
        );
        Ok(frozen)
    }

    /// Restore every frozen channel. Returns how many came back.
    pub fn unfreeze(&mut self) -> usize {
        self.network.raw.unfreeze()
    }

    /// Zero every balance, keeping deposits and the recorded timeline.
    pub fn reset_balances(&mut self) {
        self.network.raw.reset_balances();
    }

    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            step: self.step,
            nodes: self.network.node_records(),
            channels: self.network.channel_records(),
            frozen: self.network.raw.frozen_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JoinConfig, PositionConfig, RoutingConfig, RoutingKind};
    use chansim_network::{LatticeJoinConfig, Linear};
    use chansim_routing::RouteStatus;
    use proptest::prelude::*;

    fn small() -> SimulationConfig {
        SimulationConfig {
            num_nodes: 60,
            id_space: 1 << 12,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn construction_timeline_matches_network() {
        let sim = Simulation::new(small()).unwrap();
        let report = &sim.network().report;

        let joined = sim
            .events()
            .iter()
            .filter(|e| matches!(e, SimEvent::NodeJoined { .. }))
            .count();
        let opened = sim
            .events()
            .iter()
            .filter(|e| matches!(e, SimEvent::ChannelOpened { .. }))
            .count();
        let pruned = sim
            .events()
            .iter()
            .filter(|e| matches!(e, SimEvent::NodePruned { .. }))
            .count();
        assert_eq!(joined, 60);
        assert_eq!(opened, sim.channel_count());
        assert_eq!(pruned, report.pruned.len());
        assert_eq!(sim.node_count(), 60 - pruned);

        assert!(matches!(sim.events()[0], SimEvent::NodeJoined { step: 0, .. }));
        assert!(sim.events().windows(2).all(|w| w[0].step() <= w[1].step()));
    }

    #[test]
    fn channel_events_carry_deposits() {
        let sim = Simulation::new(small()).unwrap();
        for event in sim.events() {
            if let SimEvent::ChannelOpened {
                a,
                b,
                deposit_ab,
                deposit_ba,
                ..
            } = event
            {
                let raw = &sim.network().raw;
                assert_eq!(raw.channel(*a, *b).unwrap().deposit(), *deposit_ab);
                assert_eq!(raw.channel(*b, *a).unwrap().deposit(), *deposit_ba);
            }
        }
    }

    #[test]
    fn same_config_same_run() {
        let mut first = Simulation::new(small()).unwrap();
        let mut second = Simulation::new(small()).unwrap();
        first.run_transfers(30).unwrap();
        second.run_transfers(30).unwrap();
        assert_eq!(first.events(), second.events());
        assert_eq!(first.snapshot(), second.snapshot());
    }

    #[test]
    fn transfers_are_recorded_and_summarized() {
        let mut sim = Simulation::new(small()).unwrap();
        let before = sim.event_count();
        let summary = sim.run_transfers(40).unwrap();
        assert_eq!(summary.attempted, 40);
        assert!(summary.succeeded > 0);
        assert!(summary.mean_hops >= 1.0);
        assert_eq!(sim.event_count(), before + 40);
        assert_eq!(sim.outcomes().len(), 40);
        assert_eq!(sim.summary(), summary);

        let routed = sim.events()[before..]
            .iter()
            .filter(|e| matches!(e, SimEvent::TransferRouted { .. }))
            .count();
        assert_eq!(routed, summary.succeeded);
    }

    #[test]
    fn reset_clears_balances() {
        let mut sim = Simulation::new(small()).unwrap();
        sim.run_transfers(20).unwrap();
        sim.reset_balances();
        for pair in sim.snapshot().channels {
            assert_eq!(pair.ab.balance(), 0.0);
            assert_eq!(pair.ba.balance(), 0.0);
            assert_eq!(pair.ab.num_transfers(), 0);
        }
    }

    #[test]
    fn freeze_and_unfreeze_restore_channels() {
        let mut sim = Simulation::new(small()).unwrap();
        let channels = sim.channel_count();
        let frozen = sim.freeze(0.5).unwrap();
        assert_eq!(frozen.len(), sim.node_count() / 2 + sim.node_count() % 2);
        assert!(sim.channel_count() < channels);
        assert_eq!(sim.snapshot().frozen, channels - sim.channel_count());

        sim.run_transfers(10).unwrap();
        let detached = channels - sim.channel_count();
        assert_eq!(sim.unfreeze(), detached);
        assert_eq!(sim.channel_count(), channels);
        assert!(matches!(sim.freeze(1.5), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn unknown_endpoint_is_a_failed_transfer() {
        let mut sim = Simulation::new(small()).unwrap();
        let outcome = sim.transfer(NodeId(0), NodeId(10_000), 1.0).unwrap();
        assert_eq!(outcome.status, RouteStatus::Unreachable);
        assert!(matches!(sim.events().last(), Some(SimEvent::TransferFailed { .. })));
    }

    #[test]
    fn lattice_mesh_routes_greedily() {
        let config = SimulationConfig {
            num_nodes: 25,
            position: PositionConfig::Lattice { dims: 2 },
            join: JoinConfig::Lattice(LatticeJoinConfig {
                shortcut_channels: Linear::constant(0.0),
                ..LatticeJoinConfig::default()
            }),
            routing: RoutingConfig {
                strategy: RoutingKind::Greedy {
                    priority: Default::default(),
                    max_depth: 50,
                },
                ..RoutingConfig::default()
            },
            transfers: TransferConfig {
                min_value: 1.0,
                max_value: 1.0,
                ..TransferConfig::default()
            },
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::new(config).unwrap();
        assert_eq!(sim.network().report.pruned.len(), 0);
        // eight unit transfers cannot drain a deposit of at least ten
        let summary = sim.run_transfers(8).unwrap();
        assert_eq!(summary.succeeded, 8);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn transfers_keep_channels_antisymmetric(seed in any::<u64>(), count in 1usize..60) {
            let mut config = small();
            config.transfers.seed = seed;
            let mut sim = Simulation::new(config).unwrap();
            sim.run_transfers(count).unwrap();
            for pair in sim.snapshot().channels {
                prop_assert!((pair.ab.net_balance() + pair.ba.net_balance()).abs() < 1e-9);
                prop_assert!((pair.ab.imbalance() + pair.ba.imbalance()).abs() < 1e-9);
            }
        }
    }
}
