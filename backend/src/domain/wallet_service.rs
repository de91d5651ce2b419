//! Wallet computation for the points backend.
//!
//! A child's wallet is served from the precomputed rollup whenever the
//! rollup is reachable; when it is not, the same figures are derived from
//! the raw ledger rows and the accepted reward offers. Both paths produce
//! numerically identical wallets for the same underlying data, and a genuine
//! outage of every path surfaces as an error, never as a zero wallet.

use log::info;
use std::sync::Arc;

use crate::domain::errors::{PointsError, PointsResult};
use crate::domain::fallback::{first_resolved, StrategyFuture, Unavailable};
use crate::domain::identity_service::IdentityService;
use crate::domain::models::LedgerEntry;
use crate::domain::reward_service::RewardService;
use crate::storage::traits::{ChildStore, LedgerStore, RollupStore};
use shared::{ChildIdentifiers, ChildWallet, ChildWalletSummary};

#[derive(Clone)]
pub struct WalletService {
    rollup_store: Arc<dyn RollupStore>,
    ledger_store: Arc<dyn LedgerStore>,
    child_store: Arc<dyn ChildStore>,
    reward_service: RewardService,
    identity: IdentityService,
}

impl WalletService {
    pub fn new(
        rollup_store: Arc<dyn RollupStore>,
        ledger_store: Arc<dyn LedgerStore>,
        child_store: Arc<dyn ChildStore>,
        reward_service: RewardService,
        identity: IdentityService,
    ) -> Self {
        Self {
            rollup_store,
            ledger_store,
            child_store,
            reward_service,
            identity,
        }
    }

    /// Compute the canonical wallet for a child, by either id form.
    pub async fn fetch_wallet(&self, child_id: &str) -> PointsResult<ChildWallet> {
        let ids = self.identity.resolve_identifiers(child_id).await?;

        let strategies: Vec<(&'static str, StrategyFuture<'_, ChildWallet>)> = vec![
            ("rollup", Box::pin(self.wallet_from_rollup(&ids))),
            ("ledger", Box::pin(self.wallet_from_ledger(&ids))),
        ];

        first_resolved("wallet", strategies).await
    }

    /// Authoritative path: map the rollup row field for field. A reachable
    /// rollup with no row for this child is a new child, not an error.
    async fn wallet_from_rollup(&self, ids: &ChildIdentifiers) -> Result<ChildWallet, Unavailable> {
        let rollup = self
            .rollup_store
            .rollup_for_child(&ids.query_forms())
            .await
            .map_err(Unavailable)?;

        match rollup {
            Some(rollup) => Ok(rollup.to_wallet()),
            None => Ok(ChildWallet::default()),
        }
    }

    /// Fallback path: derive the same figures from the merged ledgers and
    /// the accepted offers.
    async fn wallet_from_ledger(&self, ids: &ChildIdentifiers) -> Result<ChildWallet, Unavailable> {
        let entries = self
            .ledger_store
            .merged_entries(&ids.query_forms())
            .await
            .map_err(Unavailable)?;

        if entries.is_empty() {
            return Ok(ChildWallet::default());
        }

        let reserved = self
            .reward_service
            .reserved_from_offers(ids)
            .await
            .map_err(Unavailable)?;

        Ok(wallet_from_entries(&entries, reserved))
    }

    /// Wallets for every child of a family, each computed with the same
    /// per-child precedence chain.
    pub async fn family_wallets(&self, family_id: &str) -> PointsResult<Vec<ChildWalletSummary>> {
        let family_id = IdentityService::require_uuid(family_id)?;

        let children = self
            .child_store
            .list_children_for_family(&family_id)
            .await
            .map_err(|e| PointsError::backend_unavailable("family children", e))?;

        info!("computing wallets for {} children of family {}", children.len(), family_id);

        let mut wallets = Vec::with_capacity(children.len());
        for child in children {
            let wallet = self.fetch_wallet(&child.id).await?;
            wallets.push(ChildWalletSummary { child, wallet });
        }
        Ok(wallets)
    }
}

/// Derive a wallet from raw ledger entries and the offer-reserved total.
///
/// `earned` counts only strictly positive deltas: negative entries are
/// spends or corrections and reduce `net`, never lifetime earnings. An empty
/// ledger is an all-zero wallet regardless of offers.
pub fn wallet_from_entries(entries: &[LedgerEntry], reserved_from_offers: i64) -> ChildWallet {
    if entries.is_empty() {
        return ChildWallet::default();
    }

    let net: i64 = entries.iter().map(|e| e.delta).sum();
    let earned: i64 = entries.iter().map(|e| e.delta.max(0)).sum();

    let reserved = reserved_from_offers.max(0);
    let available = (net - reserved).max(0);
    let spent = (earned - available - reserved).max(0);

    ChildWallet {
        total_points: earned,
        reserved_points: reserved,
        available_points: available,
        spent_points: spent,
        balance_points: available + reserved,
    }
}
