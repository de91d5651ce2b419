//! Earnings-breakdown classification.
//!
//! Partitions a child's positive ledger entries into earning-source buckets
//! by pattern-matching the entry's reason text. The classifier is a pure
//! function over the reason string so it can be unit-tested without storage
//! and reused as a migration tool for legacy data.
//!
//! Matching operates on two forms of the reason: `r`, the trimmed
//! lower-cased text, and `s`, a collapsed form with everything but
//! alphanumerics removed (so "Math Sprint" and "math_sprint" both read as
//! "mathsprint"). First match wins, in a fixed rule order.

use log::debug;
use std::sync::Arc;

use crate::domain::errors::{PointsError, PointsResult};
use crate::domain::identity_service::IdentityService;
use crate::domain::models::LedgerEntry;
use crate::storage::traits::LedgerStore;
use shared::EarningsBreakdown;

/// Game-name tokens recognized in the collapsed reason form.
const GAME_TOKENS: &[&str] = &[
    "starcatcher",
    "mathsprint",
    "wordbuilder",
    "memorymatch",
    "jumpplatformer",
    "jumpinggame",
    "jumpgame",
    "quizgame",
    "trivia",
];

/// Activity titles that award against a target but carry no keyword.
const KNOWN_ACTIVITY_TITLES: &[&str] = &[
    "morning routine",
    "reading adventure",
    "kindness challenge",
    "family story time",
];

/// One earning-source bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarningsBucket {
    Daily,
    Checklists,
    Games,
    Targets,
    Wishlist,
    RewardEncourage,
    RewardRedemption,
    Other,
}

/// Classify one reason string. `None` means the entry is a debug/test row
/// and must be excluded from the breakdown entirely, not bucketed.
pub fn classify_reason(reason: &str) -> Option<EarningsBucket> {
    let r = reason.trim().to_lowercase();
    let s: String = r.chars().filter(|c| c.is_alphanumeric()).collect();

    if r.contains("rpc debug award") || r.starts_with("debug") {
        return None;
    }
    if GAME_TOKENS.iter().any(|token| s.contains(token)) || s.contains("game") {
        return Some(EarningsBucket::Games);
    }
    if r.contains("daily activity") {
        return Some(EarningsBucket::Daily);
    }
    if r.contains("checklist") {
        return Some(EarningsBucket::Checklists);
    }
    if r.contains("target") {
        return Some(EarningsBucket::Targets);
    }
    if r.contains("wishlist") || r.contains("wish") {
        return Some(EarningsBucket::Wishlist);
    }
    if KNOWN_ACTIVITY_TITLES.iter().any(|title| r == *title) {
        return Some(EarningsBucket::Targets);
    }
    if r.contains("encourage reward")
        || r.contains("encouragement reward")
        || r.starts_with("encouragement:")
    {
        return Some(EarningsBucket::RewardEncourage);
    }
    if r.contains("redemption reward")
        || r.starts_with("reward redemption")
        || r.starts_with("redeem reward")
    {
        return Some(EarningsBucket::RewardRedemption);
    }
    Some(EarningsBucket::Other)
}

/// Partition the strictly positive entries into buckets.
///
/// `total` accumulates alongside the buckets and is therefore always their
/// sum; it is never recomputed separately. Negative entries never appear in
/// the breakdown, and debug rows are dropped entirely.
pub fn classify_entries(entries: &[LedgerEntry]) -> EarningsBreakdown {
    let mut breakdown = EarningsBreakdown::default();

    for entry in entries.iter().filter(|e| e.delta > 0) {
        let bucket = match classify_reason(&entry.reason) {
            Some(bucket) => bucket,
            None => {
                debug!("excluding debug ledger entry {} from breakdown", entry.id);
                continue;
            }
        };

        let slot = match bucket {
            EarningsBucket::Daily => &mut breakdown.daily,
            EarningsBucket::Checklists => &mut breakdown.checklists,
            EarningsBucket::Games => &mut breakdown.games,
            EarningsBucket::Targets => &mut breakdown.targets,
            EarningsBucket::Wishlist => &mut breakdown.wishlist,
            EarningsBucket::RewardEncourage => &mut breakdown.reward_encourage,
            EarningsBucket::RewardRedemption => &mut breakdown.reward_redemption,
            EarningsBucket::Other => &mut breakdown.other,
        };
        *slot += entry.delta;
        breakdown.total += entry.delta;
    }

    breakdown
}

#[derive(Clone)]
pub struct BreakdownService {
    ledger_store: Arc<dyn LedgerStore>,
    identity: IdentityService,
}

impl BreakdownService {
    pub fn new(ledger_store: Arc<dyn LedgerStore>, identity: IdentityService) -> Self {
        Self {
            ledger_store,
            identity,
        }
    }

    /// The categorized earnings for a child, over both ledger tables and
    /// both id forms.
    pub async fn fetch_earnings_breakdown(&self, child_id: &str) -> PointsResult<EarningsBreakdown> {
        let ids = self.identity.resolve_identifiers(child_id).await?;

        let entries = self
            .ledger_store
            .merged_entries(&ids.query_forms())
            .await
            .map_err(|e| PointsError::backend_unavailable("earnings breakdown", e))?;

        Ok(classify_entries(&entries))
    }
}
