use serde::{Deserialize, Serialize};
use shared::ChildWallet;

/// Precomputed lifetime aggregate for one child, as exposed by the rollup
/// table. The authoritative wallet source when it is reachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRollup {
    pub child_id: String,
    pub lifetime_earned_pts: i64,
    pub spent_cashout_pts: i64,
    pub reserved_pts: i64,
    pub spent_total_pts: i64,
    pub available_pts: i64,
    pub balance_pts: i64,
}

impl WalletRollup {
    /// Field-for-field mapping onto the caller-facing wallet.
    pub fn to_wallet(&self) -> ChildWallet {
        ChildWallet {
            total_points: self.lifetime_earned_pts,
            reserved_points: self.reserved_pts,
            available_points: self.available_pts,
            spent_points: self.spent_total_pts,
            balance_points: self.balance_pts,
        }
    }
}
