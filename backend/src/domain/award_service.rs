//! Idempotent point awards.
//!
//! An award is applied at most once per idempotency key, scoped as
//! `{canonical}:{reference}`. The primary path is the storage layer's atomic
//! award-if-new operation; when that path fails outright, the award falls
//! back to a plain ledger append. The fallback sacrifices the idempotency
//! guarantee rather than silently losing a legitimate award, which is the
//! accepted tradeoff for this write path. A successful primary round-trip
//! reporting a duplicate key is authoritative and does NOT fall back.

use chrono::{NaiveDate, Utc};
use log::{info, warn};
use std::sync::Arc;

use crate::domain::errors::{PointsError, PointsResult};
use crate::domain::identity_service::IdentityService;
use crate::domain::models::LedgerEntry;
use crate::events::{PointsChanged, PointsEvents};
use crate::storage::traits::{AwardOutcome, AwardStore, LedgerStore};
use shared::{AwardPointsRequest, AwardPointsResponse};

/// Deterministic idempotency reference for a subject/segment pair, so
/// repeated calls for the same logical event collapse to one ledger effect.
pub fn make_idem_key(subject: &str, segment: &str) -> String {
    format!("{}:{}", subject.trim(), segment.trim())
}

/// Daily variant: the same game segment can award again on a new day.
pub fn make_idem_key_daily(game: &str, segment: &str, date: NaiveDate) -> String {
    format!("{}:{}:{}", game.trim(), segment.trim(), date.format("%Y-%m-%d"))
}

/// Key actually stored: the caller's reference scoped per child.
fn scoped_idem_key(canonical_child_id: &str, reference: &str) -> String {
    format!("{}:{}", canonical_child_id, reference)
}

#[derive(Clone)]
pub struct AwardService {
    award_store: Arc<dyn AwardStore>,
    ledger_store: Arc<dyn LedgerStore>,
    identity: IdentityService,
    events: PointsEvents,
}

impl AwardService {
    pub fn new(
        award_store: Arc<dyn AwardStore>,
        ledger_store: Arc<dyn LedgerStore>,
        identity: IdentityService,
        events: PointsEvents,
    ) -> Self {
        Self {
            award_store,
            ledger_store,
            identity,
            events,
        }
    }

    /// Apply a point delta to a child's ledger, at most once per reference.
    pub async fn award_points(&self, request: AwardPointsRequest) -> PointsResult<AwardPointsResponse> {
        self.validate_request(&request)?;

        let ids = self.identity.resolve_identifiers(&request.child_id).await?;

        let entry = LedgerEntry {
            id: LedgerEntry::generate_id(),
            child_ref: ids.canonical.clone(),
            delta: request.delta,
            reason: request.reason.trim().to_string(),
            created_at: Utc::now().to_rfc3339(),
        };

        let outcome = match &request.reference {
            Some(reference) => {
                let idem_key = scoped_idem_key(&ids.canonical, reference);
                self.award_with_key(&entry, &idem_key).await?
            }
            // No reference, no idempotency guarantee requested
            None => self.plain_insert(&entry).await?,
        };

        if outcome.awarded {
            info!(
                "awarded {} points to child {} ({})",
                entry.delta, ids.canonical, entry.reason
            );
            self.events.publish(PointsChanged {
                child_id: ids.canonical.clone(),
            });
        } else {
            info!(
                "duplicate award reference for child {}, no new ledger row",
                ids.canonical
            );
        }

        Ok(AwardPointsResponse {
            awarded: outcome.awarded,
            ledger_id: outcome.ledger_id,
        })
    }

    async fn award_with_key(&self, entry: &LedgerEntry, idem_key: &str) -> PointsResult<AwardOutcome> {
        match self.award_store.award_idempotent(entry, idem_key).await {
            Ok(outcome) => Ok(outcome),
            Err(source) => {
                // Could not confirm idempotency; prefer a possible duplicate
                // over a lost award.
                warn!(
                    "{}",
                    PointsError::AwardUnconfirmed(format!(
                        "key {}: {:#}, falling back to plain insert",
                        idem_key, source
                    ))
                );
                self.plain_insert(entry).await
            }
        }
    }

    async fn plain_insert(&self, entry: &LedgerEntry) -> PointsResult<AwardOutcome> {
        self.ledger_store
            .insert_entry(entry)
            .await
            .map_err(|e| PointsError::backend_unavailable("recording award", e))?;
        Ok(AwardOutcome {
            awarded: true,
            ledger_id: Some(entry.id.clone()),
        })
    }

    fn validate_request(&self, request: &AwardPointsRequest) -> PointsResult<()> {
        if request.reason.trim().is_empty() {
            return Err(PointsError::Validation("Award reason cannot be empty".to_string()));
        }
        if request.reason.len() > 256 {
            return Err(PointsError::Validation(
                "Award reason cannot exceed 256 characters".to_string(),
            ));
        }
        if request.delta == 0 {
            return Err(PointsError::Validation("Award delta cannot be zero".to_string()));
        }
        if let Some(reference) = &request.reference {
            if reference.trim().is_empty() {
                return Err(PointsError::Validation(
                    "Award reference cannot be blank when supplied".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sqlite::{AwardRepository, ChildRepository, DbConnection, LedgerRepository};
    use crate::storage::traits::ChildStore;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    const CHILD: &str = "0b8c9c5e-6f2a-4f3b-9d2e-1a2b3c4d5e6f";
    const LEGACY: &str = "9f8e7d6c-5b4a-4938-8271-605f4e3d2c1b";

    /// Award double simulating a broken idempotent path.
    struct FailingAwardStore;

    #[async_trait]
    impl AwardStore for FailingAwardStore {
        async fn award_idempotent(
            &self,
            _entry: &LedgerEntry,
            _idem_key: &str,
        ) -> Result<AwardOutcome> {
            Err(anyhow!("award procedure offline"))
        }
    }

    struct Fixture {
        service: AwardService,
        ledger: LedgerRepository,
        child_store: Arc<dyn ChildStore>,
        events: PointsEvents,
    }

    async fn setup_test(award_fails: bool) -> Fixture {
        let db = DbConnection::init_test()
            .await
            .expect("Failed to create test database");

        let child_store: Arc<dyn ChildStore> = Arc::new(ChildRepository::new(db.clone()));
        let ledger = LedgerRepository::new(db.clone());
        let award_store: Arc<dyn AwardStore> = if award_fails {
            Arc::new(FailingAwardStore)
        } else {
            Arc::new(AwardRepository::new(db.clone()))
        };
        let events = PointsEvents::new();

        let service = AwardService::new(
            award_store,
            Arc::new(ledger.clone()),
            IdentityService::new(child_store.clone()),
            events.clone(),
        );

        Fixture {
            service,
            ledger,
            child_store,
            events,
        }
    }

    fn request(delta: i64, reference: Option<&str>) -> AwardPointsRequest {
        AwardPointsRequest {
            child_id: CHILD.to_string(),
            delta,
            reason: "Quiz game level complete".to_string(),
            reference: reference.map(|s| s.to_string()),
        }
    }

    #[tokio::test]
    async fn test_same_reference_awards_once() {
        let fixture = setup_test(false).await;

        let first = fixture
            .service
            .award_points(request(15, Some("quiz:level-3")))
            .await
            .expect("Failed to award");
        assert!(first.awarded);

        let second = fixture
            .service
            .award_points(request(15, Some("quiz:level-3")))
            .await
            .expect("Duplicate must not be an error");
        assert!(!second.awarded);
        assert_eq!(second.ledger_id, first.ledger_id);

        let entries = fixture
            .ledger
            .canonical_entries(&[CHILD.to_string()])
            .await
            .expect("Failed to read ledger");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].delta, 15);
    }

    #[tokio::test]
    async fn test_without_reference_every_call_appends() {
        let fixture = setup_test(false).await;

        fixture.service.award_points(request(10, None)).await.unwrap();
        fixture.service.award_points(request(10, None)).await.unwrap();

        let entries = fixture
            .ledger
            .canonical_entries(&[CHILD.to_string()])
            .await
            .expect("Failed to read ledger");
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_primary_path_falls_back_to_plain_insert() {
        let fixture = setup_test(true).await;

        let response = fixture
            .service
            .award_points(request(20, Some("quiz:level-1")))
            .await
            .expect("Fallback must keep the award");
        assert!(response.awarded);

        let entries = fixture
            .ledger
            .canonical_entries(&[CHILD.to_string()])
            .await
            .expect("Failed to read ledger");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].delta, 20);
    }

    #[tokio::test]
    async fn test_award_resolves_legacy_uid_to_canonical() {
        let fixture = setup_test(false).await;

        let now = Utc::now().to_rfc3339();
        fixture
            .child_store
            .store_child(&shared::Child {
                id: CHILD.to_string(),
                legacy_uid: Some(LEGACY.to_string()),
                family_id: shared::Child::generate_id(),
                name: "Alice".to_string(),
                nickname: None,
                created_at: now.clone(),
                updated_at: now,
            })
            .await
            .expect("Failed to store child");

        let mut req = request(30, Some("daily:2026-08-07"));
        req.child_id = LEGACY.to_string();
        fixture.service.award_points(req).await.expect("Failed to award");

        // The row lands under the canonical id, not the legacy uid
        let entries = fixture
            .ledger
            .canonical_entries(&[CHILD.to_string()])
            .await
            .expect("Failed to read ledger");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].child_ref, CHILD);
    }

    #[tokio::test]
    async fn test_successful_award_publishes_points_changed() {
        let fixture = setup_test(false).await;
        let mut rx = fixture.events.subscribe();

        fixture
            .service
            .award_points(request(5, Some("quiz:level-9")))
            .await
            .expect("Failed to award");

        let event = rx.recv().await.expect("Failed to receive event");
        assert_eq!(event.child_id, CHILD);
    }

    #[tokio::test]
    async fn test_duplicate_award_does_not_publish() {
        let fixture = setup_test(false).await;

        fixture
            .service
            .award_points(request(5, Some("quiz:level-9")))
            .await
            .unwrap();

        let mut rx = fixture.events.subscribe();
        fixture
            .service
            .award_points(request(5, Some("quiz:level-9")))
            .await
            .unwrap();

        assert!(rx.try_recv().is_err(), "Duplicate must not publish");
    }

    #[tokio::test]
    async fn test_validation_rejects_bad_requests() {
        let fixture = setup_test(false).await;

        let mut empty_reason = request(10, None);
        empty_reason.reason = "   ".to_string();
        assert!(matches!(
            fixture.service.award_points(empty_reason).await,
            Err(PointsError::Validation(_))
        ));

        assert!(matches!(
            fixture.service.award_points(request(0, None)).await,
            Err(PointsError::Validation(_))
        ));

        let mut bad_child = request(10, None);
        bad_child.child_id = "not-a-uuid".to_string();
        assert!(matches!(
            fixture.service.award_points(bad_child).await,
            Err(PointsError::InvalidIdentifier(_))
        ));
    }

    #[tokio::test]
    async fn test_negative_deltas_are_recorded() {
        let fixture = setup_test(false).await;

        let mut req = request(-30, None);
        req.reason = "Reward redemption: toy".to_string();
        let response = fixture.service.award_points(req).await.expect("Failed to deduct");
        assert!(response.awarded);

        let entries = fixture
            .ledger
            .canonical_entries(&[CHILD.to_string()])
            .await
            .unwrap();
        assert_eq!(entries[0].delta, -30);
    }

    #[test]
    fn test_idem_keys_are_deterministic() {
        assert_eq!(make_idem_key("reading", "chapter-4"), "reading:chapter-4");
        assert_eq!(
            make_idem_key(" reading ", "chapter-4"),
            make_idem_key("reading", " chapter-4 ")
        );

        let day = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        assert_eq!(
            make_idem_key_daily("quiz", "level-3", day),
            "quiz:level-3:2026-08-07"
        );
        assert_eq!(
            make_idem_key_daily("quiz", "level-3", day),
            make_idem_key_daily("quiz", "level-3", day)
        );
    }
}
