//! Connection strategies: committing a matched pair into the graph.

use std::fmt;

use tracing::trace;

use crate::{Error, Linear, NodeId, RawNetwork, Result};

/// Commits a channel between an initiator and an acceptor.
pub trait ConnectionStrategy: fmt::Debug {
    fn connect(&self, network: &mut RawNetwork, a: NodeId, b: NodeId) -> Result<()>;
}

/// Opens both directions, each funded from its owner's fullness.
#[derive(Debug, Clone, Copy)]
pub struct BidirectionalConnection {
    pub deposit: Linear,
}

impl BidirectionalConnection {
    pub fn new(deposit: Linear) -> Self {
        Self { deposit }
    }
}

impl ConnectionStrategy for BidirectionalConnection {
    fn connect(&self, network: &mut RawNetwork, a: NodeId, b: NodeId) -> Result<()> {
        let fa = network.node(a).ok_or(Error::UnknownNode(a))?.fullness();
        let fb = network.node(b).ok_or(Error::UnknownNode(b))?.fullness();
        let (d_ab, d_ba) = (self.deposit.map(fa), self.deposit.map(fb));
        network.open_channel(a, b, d_ab, d_ba)?;
        network.count_connection(a, b)?;
        trace!("opened {} <-> {} with deposits {} / {}", a, b, d_ab, d_ba);
        Ok(())
    }
}
