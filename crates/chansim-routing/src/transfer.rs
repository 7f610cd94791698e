//! Transfer execution: route, price, then move the value.

use chansim_network::{NetworkView, NodeId, PositionStrategy, RawNetwork};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{FeeModel, Result, RouteStatus, RoutingStrategy};

/// Everything statistics need to know about one transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub source: NodeId,
    pub target: NodeId,
    pub value: f64,
    pub status: RouteStatus,
    pub path: Vec<NodeId>,
    /// Summed fee along the path, priced before balances moved.
    pub fee: f64,
    /// Partial paths the search dequeued.
    pub searched: usize,
}

impl TransferOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == RouteStatus::Found
    }

    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// Route `value` from `source` to `target` and apply it to the channel
/// balances. A failed search leaves the network untouched.
pub fn execute_transfer(
    network: &mut RawNetwork,
    position: &dyn PositionStrategy,
    routing: &dyn RoutingStrategy,
    fee: FeeModel,
    source: NodeId,
    target: NodeId,
    value: f64,
) -> Result<TransferOutcome> {
    let route = routing.route(&NetworkView::new(network, position), source, target, value);
    let mut outcome = TransferOutcome {
        source,
        target,
        value,
        status: route.status,
        path: Vec::new(),
        fee: 0.0,
        searched: route.history.len(),
    };
    if !route.is_found() {
        debug!("transfer {} -> {} of {} failed: {:?}", source, target, value, route.status);
        return Ok(outcome);
    }
    outcome.fee = fee.path_fee(network, &route.path, value).unwrap_or(0.0);
    network.do_transfer(&route.path, value)?;
    outcome.path = route.path;
    Ok(outcome)
}
