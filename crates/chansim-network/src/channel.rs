//! Per-direction channel accounting.
//!
//! A channel between `u` and `v` is stored as two directed records. Each
//! record owns its `deposit` and `balance`; `net_balance`, `capacity` and
//! `imbalance` are caches derived from both directions and must be
//! recomputed for the pair whenever a deposit or balance changes:
//!
//! ```text
//! net_balance(u->v) = balance(u->v) - balance(v->u)
//! capacity(u->v)    = deposit(u->v) - net_balance(u->v)
//! imbalance(u->v)   = deposit(v->u) - deposit(u->v) + 2 * net_balance(u->v)
//! ```
//!
//! The only way to touch deposit or balance is through methods on
//! [`RawNetwork`](crate::RawNetwork), which always finish with
//! [`recompute_pair`].

use serde::{Deserialize, Serialize};

/// One direction of a bidirectional channel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelState {
    deposit: f64,
    balance: f64,
    net_balance: f64,
    capacity: f64,
    imbalance: f64,
    num_transfers: u64,
}

impl ChannelState {
    /// A fresh direction with the given collateral and no transfers.
    pub(crate) fn with_deposit(deposit: f64) -> Self {
        Self {
            deposit,
            ..Self::default()
        }
    }

    /// Collateral committed by the owner of this direction.
    pub fn deposit(&self) -> f64 {
        self.deposit
    }

    /// Cumulative value sent in this direction.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Value sent in this direction minus value received back.
    pub fn net_balance(&self) -> f64 {
        self.net_balance
    }

    /// Value still spendable in this direction. Negative after an overdraft.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Deposit-adjusted unevenness of the pair as seen from this direction.
    pub fn imbalance(&self) -> f64 {
        self.imbalance
    }

    /// Number of executed transfer hops over this channel, either direction.
    pub fn num_transfers(&self) -> u64 {
        self.num_transfers
    }

    pub(crate) fn set_deposit(&mut self, deposit: f64) {
        self.deposit = deposit;
    }

    pub(crate) fn add_balance(&mut self, value: f64) {
        self.balance += value;
    }

    pub(crate) fn record_transfer(&mut self) {
        self.num_transfers += 1;
    }

    pub(crate) fn clear_balance(&mut self) {
        self.balance = 0.0;
        self.num_transfers = 0;
    }
}

/// Restore the derived fields of both directions of a channel.
///
/// The reverse direction takes the negated forward values so the pair stays
/// exactly antisymmetric.
pub(crate) fn recompute_pair(uv: &mut ChannelState, vu: &mut ChannelState) {
    uv.net_balance = uv.balance - vu.balance;
    vu.net_balance = -uv.net_balance;
    uv.capacity = uv.deposit - uv.net_balance;
    vu.capacity = vu.deposit - vu.net_balance;
    uv.imbalance = vu.deposit - uv.deposit + 2.0 * uv.net_balance;
    vu.imbalance = -uv.imbalance;
}
