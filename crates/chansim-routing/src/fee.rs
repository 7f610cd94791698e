//! Fee models.
//!
//! A fee model prices moving `value` over one directed channel. The
//! sigmoid models penalize hops that push a channel further out of balance;
//! every model returns a strictly positive fee so shortest-path search over
//! fees stays correct.

use chansim_network::{ChannelState, NodeId, RawNetwork};
use serde::{Deserialize, Serialize};

/// `1 / (1 + e^-x)`: 0.5 at zero, tending to 0 and 1 at the extremes.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Per-hop price of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeModel {
    /// One per hop: shortest hop count.
    #[default]
    Constant,
    /// `sigmoid(net_balance + value)`.
    NetBalance,
    /// `sigmoid(imbalance + 2 * value)`.
    Imbalance,
}

impl FeeModel {
    pub fn fee(&self, channel: &ChannelState, value: f64) -> f64 {
        match self {
            FeeModel::Constant => 1.0,
            FeeModel::NetBalance => sigmoid(channel.net_balance() + value),
            FeeModel::Imbalance => sigmoid(channel.imbalance() + 2.0 * value),
        }
    }

    /// Summed fee along `path`, or `None` if a hop is missing.
    pub fn path_fee(&self, network: &RawNetwork, path: &[NodeId], value: f64) -> Option<f64> {
        path.windows(2)
            .map(|hop| network.channel(hop[0], hop[1]).map(|c| self.fee(c, value)))
            .sum()
    }
}
