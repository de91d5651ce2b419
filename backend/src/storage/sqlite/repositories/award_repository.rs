use anyhow::Result;
use async_trait::async_trait;
use sqlx::Row;

use crate::domain::models::LedgerEntry;
use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::{AwardOutcome, AwardStore};

/// The atomic award-if-new operation.
///
/// The idempotency-key insert and the ledger append run in one transaction,
/// so a duplicate key can never leave a second ledger row behind and a
/// recorded key can never exist without its row.
#[derive(Clone)]
pub struct AwardRepository {
    db: DbConnection,
}

impl AwardRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AwardStore for AwardRepository {
    async fn award_idempotent(&self, entry: &LedgerEntry, idem_key: &str) -> Result<AwardOutcome> {
        let mut tx = self.db.pool().begin().await?;

        let claimed = sqlx::query(
            r#"
            INSERT INTO ledger_idempotency (idem_key, ledger_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(idem_key) DO NOTHING
            "#,
        )
        .bind(idem_key)
        .bind(&entry.id)
        .bind(&entry.created_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if claimed == 0 {
            // Key already applied; report the row it was bound to.
            let existing = sqlx::query(
                "SELECT ledger_id FROM ledger_idempotency WHERE idem_key = ?",
            )
            .bind(idem_key)
            .fetch_optional(&mut *tx)
            .await?;

            tx.commit().await?;

            return Ok(AwardOutcome {
                awarded: false,
                ledger_id: existing.map(|row| row.get("ledger_id")),
            });
        }

        sqlx::query(
            r#"
            INSERT INTO points_ledger (id, child_id, delta, reason, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.child_ref)
        .bind(entry.delta)
        .bind(&entry.reason)
        .bind(&entry.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(AwardOutcome {
            awarded: true,
            ledger_id: Some(entry.id.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test() -> AwardRepository {
        let db = DbConnection::init_test()
            .await
            .expect("Failed to create test database");
        AwardRepository::new(db)
    }

    fn entry(delta: i64) -> LedgerEntry {
        LedgerEntry {
            id: LedgerEntry::generate_id(),
            child_ref: "child-a".to_string(),
            delta,
            reason: "Quiz game level complete".to_string(),
            created_at: "2026-04-01T12:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_same_key_applies_once() {
        let repo = setup_test().await;

        let first = entry(15);
        let outcome = repo
            .award_idempotent(&first, "child-a:quiz:level-3")
            .await
            .expect("Failed to award");
        assert!(outcome.awarded);
        assert_eq!(outcome.ledger_id.as_deref(), Some(first.id.as_str()));

        let second = entry(15);
        let outcome = repo
            .award_idempotent(&second, "child-a:quiz:level-3")
            .await
            .expect("Failed to award");
        assert!(!outcome.awarded);
        // The key reports the original row, not the rejected one
        assert_eq!(outcome.ledger_id.as_deref(), Some(first.id.as_str()));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM points_ledger")
            .fetch_one(repo.db.pool())
            .await
            .expect("Failed to count rows");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_both_apply() {
        let repo = setup_test().await;

        repo.award_idempotent(&entry(10), "child-a:quiz:level-1")
            .await
            .expect("Failed to award");
        repo.award_idempotent(&entry(10), "child-a:quiz:level-2")
            .await
            .expect("Failed to award");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM points_ledger")
            .fetch_one(repo.db.pool())
            .await
            .expect("Failed to count rows");
        assert_eq!(count, 2);
    }
}
