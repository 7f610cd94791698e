//! Join strategies.
//!
//! A join strategy attaches one freshly placed node to the growing network.
//! The generic loop computes a channel target from the node's fullness and
//! pulls candidates from a [`SelectionStrategy`] until the target is met or
//! the candidates run out. Running out is reported in the [`JoinOutcome`]
//! and logged; the node simply stays under-connected.
//!
//! Mesh joins first wire the node to every geometric neighbor its
//! [`PositionStrategy`] reports, then optionally run the generic loop for
//! long-range shortcuts.
//!
//! The preset constructors ([`kademlia_join`], [`lattice_join`],
//! [`hyperbolic_join`], [`micro_raiden_join`], [`random_join`]) assemble the
//! filter, selection and connection pipelines for the standard topologies.

use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    AcceptedLimitFilter, BidirectionalConnection, ConnectionStrategy, DistanceFilter, Error,
    FilterChain, FullerFilter, KademliaBucketFilter, KademliaSelection, Linear,
    MinIncomingDepositFilter, NetworkView, NodeId, PositionStrategy, RandomRange,
    RandomSelection, RawNetwork, Result, SelectionStrategy, ServerOnlyFilter,
    TotalLimitFilter, WeaveSelection,
};

/// What a single join did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinOutcome {
    pub node: NodeId,
    /// Channels opened to geometric neighbors.
    pub mandatory: usize,
    /// Channels opened through selection.
    pub initiated: usize,
    /// How many selected channels the node wanted.
    pub target: usize,
    /// The candidate sequence ran dry before `target` was reached.
    pub exhausted: bool,
    /// Partners of the opened channels, in opening order.
    pub partners: Vec<NodeId>,
}

impl JoinOutcome {
    fn empty(node: NodeId) -> Self {
        Self {
            node,
            mandatory: 0,
            initiated: 0,
            target: 0,
            exhausted: false,
            partners: Vec::new(),
        }
    }

    /// Every channel this join opened.
    pub fn opened(&self) -> usize {
        self.partners.len()
    }
}

/// Attaches one node to the network.
pub trait JoinStrategy: fmt::Debug {
    fn join(
        &mut self,
        network: &mut RawNetwork,
        position: &dyn PositionStrategy,
        node: NodeId,
    ) -> Result<JoinOutcome>;
}

/// Pull candidates until `target` channels are open. Returns the new
/// partners and whether the sequence was exhausted first.
fn fill_channels(
    selection: &mut dyn SelectionStrategy,
    connection: &dyn ConnectionStrategy,
    network: &mut RawNetwork,
    position: &dyn PositionStrategy,
    node: NodeId,
    target: usize,
) -> Result<(Vec<NodeId>, bool)> {
    let mut opened = Vec::with_capacity(target);
    if target == 0 {
        return Ok((opened, false));
    }
    selection.start(&NetworkView::new(network, position), node);
    while opened.len() < target {
        let next = selection.next_target(&NetworkView::new(network, position), node);
        let Some(partner) = next else {
            return Ok((opened, true));
        };
        // filters without NotConnected may offer an existing partner
        if network.has_channel(node, partner) {
            continue;
        }
        connection.connect(network, node, partner)?;
        opened.push(partner);
    }
    Ok((opened, false))
}

fn report(outcome: &JoinOutcome) {
    if outcome.exhausted {
        warn!(
            "{}: candidates exhausted after {} of {} channels",
            outcome.node, outcome.initiated, outcome.target
        );
    } else {
        debug!(
            "{}: joined with {} mandatory and {} selected channels",
            outcome.node, outcome.mandatory, outcome.initiated
        );
    }
}

/// The generic loop: a fullness-derived channel target fed by a selection.
#[derive(Debug)]
pub struct DefaultJoin {
    initiated_channels: Linear,
    selection: Box<dyn SelectionStrategy>,
    connection: Box<dyn ConnectionStrategy>,
}

impl DefaultJoin {
    pub fn new(
        initiated_channels: Linear,
        selection: impl SelectionStrategy + 'static,
        connection: impl ConnectionStrategy + 'static,
    ) -> Self {
        Self {
            initiated_channels,
            selection: Box::new(selection),
            connection: Box::new(connection),
        }
    }

    fn run(
        &mut self,
        network: &mut RawNetwork,
        position: &dyn PositionStrategy,
        node: NodeId,
    ) -> Result<JoinOutcome> {
        let fullness = network.node(node).ok_or(Error::UnknownNode(node))?.fullness();
        let target = self.initiated_channels.map_count(fullness);
        let (partners, exhausted) = fill_channels(
            self.selection.as_mut(),
            self.connection.as_ref(),
            network,
            position,
            node,
            target,
        )?;
        Ok(JoinOutcome {
            initiated: partners.len(),
            target,
            exhausted,
            partners,
            ..JoinOutcome::empty(node)
        })
    }
}

impl JoinStrategy for DefaultJoin {
    fn join(
        &mut self,
        network: &mut RawNetwork,
        position: &dyn PositionStrategy,
        node: NodeId,
    ) -> Result<JoinOutcome> {
        let outcome = self.run(network, position, node)?;
        report(&outcome);
        Ok(outcome)
    }
}

/// Mandatory geometric mesh plus optional selected shortcuts.
///
/// Serves both the lattice join (axis neighbors, weave shortcuts) and the
/// hyperbolic join (inner partners only).
#[derive(Debug)]
pub struct MeshJoin {
    connection: Box<dyn ConnectionStrategy>,
    shortcuts: Option<DefaultJoin>,
}

impl MeshJoin {
    pub fn new(
        connection: impl ConnectionStrategy + 'static,
        shortcuts: Option<DefaultJoin>,
    ) -> Self {
        Self {
            connection: Box::new(connection),
            shortcuts,
        }
    }
}

impl JoinStrategy for MeshJoin {
    fn join(
        &mut self,
        network: &mut RawNetwork,
        position: &dyn PositionStrategy,
        node: NodeId,
    ) -> Result<JoinOutcome> {
        let me = network.node(node).ok_or(Error::UnknownNode(node))?;
        let neighbors = position.geometric_neighbors(me);
        // nothing to draw from is not exhaustion
        let offers_shortcuts = !position.shortcut_candidates(me).is_empty();
        let mut mesh = Vec::with_capacity(neighbors.len());
        for partner in neighbors {
            if partner == node || !network.contains(partner) || network.has_channel(node, partner) {
                continue;
            }
            self.connection.connect(network, node, partner)?;
            mesh.push(partner);
        }
        let mut outcome = match self.shortcuts.as_mut() {
            Some(shortcuts) if offers_shortcuts => shortcuts.run(network, position, node)?,
            _ => JoinOutcome::empty(node),
        };
        outcome.mandatory = mesh.len();
        mesh.append(&mut outcome.partners);
        outcome.partners = mesh;
        report(&outcome);
        Ok(outcome)
    }
}

/// Star topology: clients open a random number of channels to servers,
/// servers never initiate.
#[derive(Debug)]
pub struct MicroRaidenJoin {
    client_channels: RandomRange,
    rng: StdRng,
    selection: Box<dyn SelectionStrategy>,
    connection: Box<dyn ConnectionStrategy>,
}

impl MicroRaidenJoin {
    pub fn new(
        client_channels: RandomRange,
        seed: u64,
        selection: impl SelectionStrategy + 'static,
        connection: impl ConnectionStrategy + 'static,
    ) -> Self {
        Self {
            client_channels,
            rng: StdRng::seed_from_u64(seed),
            selection: Box::new(selection),
            connection: Box::new(connection),
        }
    }
}

impl JoinStrategy for MicroRaidenJoin {
    fn join(
        &mut self,
        network: &mut RawNetwork,
        position: &dyn PositionStrategy,
        node: NodeId,
    ) -> Result<JoinOutcome> {
        let me = network.node(node).ok_or(Error::UnknownNode(node))?;
        let target = if me.is_server() {
            0
        } else {
            self.client_channels.sample(&mut self.rng)
        };
        let (partners, exhausted) = fill_channels(
            self.selection.as_mut(),
            self.connection.as_ref(),
            network,
            position,
            node,
            target,
        )?;
        let outcome = JoinOutcome {
            initiated: partners.len(),
            target,
            exhausted,
            partners,
            ..JoinOutcome::empty(node)
        };
        report(&outcome);
        Ok(outcome)
    }
}

/// Parameters of the Kademlia-style ring join.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KademliaJoinConfig {
    pub deposit: Linear,
    pub initiated_channels: Linear,
    /// Upper bound on partner distance; unbounded when absent.
    pub max_distance: Option<f64>,
    pub min_incoming_deposit: f64,
    pub num_buckets: usize,
    /// Low buckets merged into bucket 0; derived from node density when absent.
    pub merge_count: Option<u32>,
    /// Cap on an acceptor's total channels.
    pub max_channels: Option<Linear>,
}

impl Default for KademliaJoinConfig {
    fn default() -> Self {
        Self {
            deposit: Linear::new(10.0, 20.0),
            initiated_channels: Linear::new(2.0, 6.0),
            max_distance: None,
            min_incoming_deposit: 0.2,
            num_buckets: 16,
            merge_count: None,
            max_channels: None,
        }
    }
}

/// Ring join approximating Kademlia while leaning towards fuller partners.
pub fn kademlia_join(config: &KademliaJoinConfig) -> DefaultJoin {
    let mut filters = FilterChain::basic().with(FullerFilter);
    if let Some(max_distance) = config.max_distance {
        filters = filters.with(DistanceFilter { max_distance });
    }
    filters = filters.with(MinIncomingDepositFilter {
        deposit: config.deposit,
        min_incoming_deposit: config.min_incoming_deposit,
    });
    if let Some(max_channels) = config.max_channels {
        filters = filters.with(TotalLimitFilter { max_channels });
    }
    let filters = filters.with(KademliaBucketFilter {
        num_buckets: config.num_buckets,
        merge_count: config.merge_count,
    });
    DefaultJoin::new(
        config.initiated_channels,
        KademliaSelection::new(filters),
        BidirectionalConnection::new(config.deposit),
    )
}

/// Parameters of the (woven) lattice join.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeJoinConfig {
    pub deposit: Linear,
    /// Optional weave shortcuts per node.
    pub shortcut_channels: Linear,
    pub max_accepted: Option<Linear>,
    pub seed: u64,
}

impl Default for LatticeJoinConfig {
    fn default() -> Self {
        Self {
            deposit: Linear::new(10.0, 20.0),
            shortcut_channels: Linear::new(0.0, 2.0),
            max_accepted: None,
            seed: 0,
        }
    }
}

/// Lattice mesh with weave shortcuts drawn from the position's partners.
pub fn lattice_join(config: &LatticeJoinConfig) -> MeshJoin {
    let mut filters = FilterChain::basic();
    if let Some(max_channels) = config.max_accepted {
        filters = filters.with(AcceptedLimitFilter { max_channels });
    }
    let connection = BidirectionalConnection::new(config.deposit);
    let shortcuts = DefaultJoin::new(
        config.shortcut_channels,
        WeaveSelection::new(filters, config.seed),
        connection,
    );
    MeshJoin::new(connection, Some(shortcuts))
}

/// Hyperbolic disk mesh: inner partners only.
pub fn hyperbolic_join(deposit: Linear) -> MeshJoin {
    MeshJoin::new(BidirectionalConnection::new(deposit), None)
}

/// Parameters of the client/server star join.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroRaidenJoinConfig {
    pub deposit: Linear,
    pub client_channels: RandomRange,
    /// Cap on a server's accepted channels.
    pub max_accepted: Linear,
    pub seed: u64,
}

impl Default for MicroRaidenJoinConfig {
    fn default() -> Self {
        Self {
            deposit: Linear::new(5.0, 100.0),
            client_channels: RandomRange::new(1, 3),
            max_accepted: Linear::new(0.0, 200.0),
            seed: 0,
        }
    }
}

pub fn micro_raiden_join(config: &MicroRaidenJoinConfig) -> MicroRaidenJoin {
    let filters = FilterChain::basic()
        .with(ServerOnlyFilter)
        .with(AcceptedLimitFilter {
            max_channels: config.max_accepted,
        });
    MicroRaidenJoin::new(
        config.client_channels,
        config.seed,
        RandomSelection::new(filters, config.seed),
        BidirectionalConnection::new(config.deposit),
    )
}

/// Parameters of the unstructured random join.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomJoinConfig {
    pub deposit: Linear,
    pub initiated_channels: Linear,
    pub max_channels: Option<Linear>,
    pub seed: u64,
}

impl Default for RandomJoinConfig {
    fn default() -> Self {
        Self {
            deposit: Linear::new(10.0, 20.0),
            initiated_channels: Linear::new(1.0, 4.0),
            max_channels: None,
            seed: 0,
        }
    }
}

/// Random partners under a total channel cap. Baseline for comparisons.
pub fn random_join(config: &RandomJoinConfig) -> DefaultJoin {
    let mut filters = FilterChain::basic();
    if let Some(max_channels) = config.max_channels {
        filters = filters.with(TotalLimitFilter { max_channels });
    }
    DefaultJoin::new(
        config.initiated_channels,
        RandomSelection::new(filters, config.seed),
        BidirectionalConnection::new(config.deposit),
    )
}
