//! # Storage Traits
//!
//! Storage abstraction for the points backend. Domain services hold these as
//! trait objects so the SQLite repositories can be swapped for doubles in
//! tests, in particular failing rollup stores for exercising the wallet
//! fallback chain.

use anyhow::Result;
use async_trait::async_trait;
use shared::Child;

use crate::domain::models::{LedgerEntry, Reward, RewardOffer, WalletRollup};

/// Child-entity lookups and writes.
#[async_trait]
pub trait ChildStore: Send + Sync {
    /// Store a new child.
    async fn store_child(&self, child: &Child) -> Result<()>;

    /// Find a child whose canonical id OR legacy uid equals `id`.
    async fn find_by_any_id(&self, id: &str) -> Result<Option<Child>>;

    /// List a family's children ordered by name.
    async fn list_children_for_family(&self, family_id: &str) -> Result<Vec<Child>>;

    /// Update an existing child.
    async fn update_child(&self, child: &Child) -> Result<()>;
}

/// Read/append access to the two ledger tables.
///
/// Two parallel tables record the same concept under different field names
/// (`delta` vs `points`); each access method is an adapter producing the one
/// internal `LedgerEntry` shape.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Entries from the current ledger table for any of the given id forms.
    async fn canonical_entries(&self, child_refs: &[String]) -> Result<Vec<LedgerEntry>>;

    /// Entries from the pre-migration ledger table for any of the given id
    /// forms.
    async fn legacy_entries(&self, child_refs: &[String]) -> Result<Vec<LedgerEntry>>;

    /// Plain append to the current table. Carries no idempotency guarantee;
    /// idempotent writes go through [`AwardStore::award_idempotent`].
    async fn insert_entry(&self, entry: &LedgerEntry) -> Result<()>;

    /// Both ledger tables merged into one chronological stream.
    async fn merged_entries(&self, child_refs: &[String]) -> Result<Vec<LedgerEntry>> {
        let mut entries = self.canonical_entries(child_refs).await?;
        entries.extend(self.legacy_entries(child_refs).await?);
        entries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(entries)
    }
}

/// Reward-offer reads and writes.
#[async_trait]
pub trait OfferStore: Send + Sync {
    /// All accepted offers for any of the given child id forms.
    async fn accepted_offers(&self, child_refs: &[String]) -> Result<Vec<RewardOffer>>;

    /// Store a new offer.
    async fn store_offer(&self, offer: &RewardOffer) -> Result<()>;
}

/// Reward-catalog lookups.
#[async_trait]
pub trait RewardCatalogStore: Send + Sync {
    /// Costs for the given reward ids in one batched query. Unknown ids are
    /// simply absent from the result.
    async fn costs_for(&self, reward_ids: &[String]) -> Result<Vec<(String, i64)>>;

    /// Store a catalog entry.
    async fn store_reward(&self, reward: &Reward) -> Result<()>;
}

/// Precomputed wallet rollups.
#[async_trait]
pub trait RollupStore: Send + Sync {
    /// The rollup row for any of the given child id forms, if one exists.
    /// `Ok(None)` means the rollup answered and the child has no row yet;
    /// an `Err` means the rollup itself is unreachable.
    async fn rollup_for_child(&self, child_refs: &[String]) -> Result<Option<WalletRollup>>;

    /// Insert or replace a child's rollup row.
    async fn upsert_rollup(&self, rollup: &WalletRollup) -> Result<()>;
}

/// Result of the atomic award-if-new operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardOutcome {
    /// True when a new ledger row was recorded; false when the idempotency
    /// key had already been applied.
    pub awarded: bool,
    /// The row recorded now, or the one previously recorded under the key.
    pub ledger_id: Option<String>,
}

/// Atomic "award unless this key was already applied".
#[async_trait]
pub trait AwardStore: Send + Sync {
    /// Record `entry` and bind it to `idem_key` in a single transaction.
    /// When the key already exists, nothing is written and the prior
    /// ledger id is returned with `awarded: false`.
    async fn award_idempotent(&self, entry: &LedgerEntry, idem_key: &str) -> Result<AwardOutcome>;
}
