//! Common routing contract.

use std::fmt;

use chansim_network::{NetworkView, NodeId};
use serde::{Deserialize, Serialize};

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Found,
    /// The search space was exhausted without reaching the target.
    Unreachable,
    /// The search stopped at its `max_paths` or `max_depth` cap.
    BudgetExhausted,
}

/// A path (empty unless found) plus the partial paths the search dequeued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub path: Vec<NodeId>,
    pub history: Vec<Vec<NodeId>>,
    pub status: RouteStatus,
}

impl RouteResult {
    pub fn found(path: Vec<NodeId>, history: Vec<Vec<NodeId>>) -> Self {
        Self {
            path,
            history,
            status: RouteStatus::Found,
        }
    }

    pub fn unreachable(history: Vec<Vec<NodeId>>) -> Self {
        Self {
            path: Vec::new(),
            history,
            status: RouteStatus::Unreachable,
        }
    }

    pub fn budget_exhausted(history: Vec<Vec<NodeId>>) -> Self {
        Self {
            path: Vec::new(),
            history,
            status: RouteStatus::BudgetExhausted,
        }
    }

    pub fn is_found(&self) -> bool {
        self.status == RouteStatus::Found
    }

    /// Number of channels the path crosses.
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// Finds a path able to carry `value` from `source` to `target`.
///
/// Searches only read the network. Every directed edge of a returned path
/// can carry `value`.
pub trait RoutingStrategy: fmt::Debug {
    fn route(&self, view: &NetworkView<'_>, source: NodeId, target: NodeId, value: f64)
        -> RouteResult;
}
