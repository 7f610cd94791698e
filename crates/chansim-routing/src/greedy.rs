//! Greedy depth-first routing with backtracking.
//!
//! Always steps to the single best-priority unvisited neighbor. At a dead
//! end the walk backs up one hop and tries the next best. Visited nodes stay
//! visited after backtracking, so each node is entered at most once and the
//! walk terminates. Paths longer than `max_depth` hops are never extended.

use std::collections::HashSet;

use chansim_network::{NetworkView, NodeId};
use tracing::debug;

use crate::{Error, PriorityStrategy, Result, RouteResult, RoutingStrategy};

#[derive(Debug)]
pub struct GreedyDepthFirst {
    priority: Box<dyn PriorityStrategy>,
    max_depth: usize,
}

impl GreedyDepthFirst {
    pub fn new(priority: impl PriorityStrategy + 'static, max_depth: usize) -> Result<Self> {
        Self::boxed(Box::new(priority), max_depth)
    }

    pub fn boxed(priority: Box<dyn PriorityStrategy>, max_depth: usize) -> Result<Self> {
        if max_depth == 0 {
            return Err(Error::InvalidBudget("max_depth"));
        }
        Ok(Self {
            priority,
            max_depth,
        })
    }

    fn best_step(
        &self,
        view: &NetworkView<'_>,
        tail: NodeId,
        target: NodeId,
        value: f64,
        visited: &HashSet<NodeId>,
    ) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;
        for (next, channel) in view.network.neighbors(tail) {
            if visited.contains(&next) || channel.capacity() < value {
                continue;
            }
            let score = self.priority.priority(view, tail, next, target, value);
            match best {
                Some((_, best_score)) if score >= best_score => {}
                _ => best = Some((next, score)),
            }
        }
        best.map(|(node, _)| node)
    }
}

impl RoutingStrategy for GreedyDepthFirst {
    fn route(
        &self,
        view: &NetworkView<'_>,
        source: NodeId,
        target: NodeId,
        value: f64,
    ) -> RouteResult {
        if !view.network.contains(source) || !view.network.contains(target) {
            return RouteResult::unreachable(Vec::new());
        }

        let mut path = vec![source];
        let mut visited = HashSet::from([source]);
        let mut history = Vec::new();
        let mut truncated = false;

        while let Some(&tail) = path.last() {
            history.push(path.clone());
            if tail == target {
                debug!("greedy route {} -> {}: {} hops", source, target, path.len() - 1);
                return RouteResult::found(path, history);
            }
            let step = if path.len() > self.max_depth {
                truncated |= self.best_step(view, tail, target, value, &visited).is_some();
                None
            } else {
                self.best_step(view, tail, target, value, &visited)
            };
            match step {
                Some(next) => {
                    visited.insert(next);
                    path.push(next);
                }
                None => {
                    path.pop();
                }
            }
        }

        if truncated {
            debug!("greedy route {} -> {}: depth {} reached", source, target, self.max_depth);
            RouteResult::budget_exhausted(history)
        } else {
            debug!("greedy route {} -> {}: unreachable", source, target);
            RouteResult::unreachable(history)
        }
    }
}
