use anyhow::Result;
use async_trait::async_trait;
use sqlx::Row;

use crate::domain::models::LedgerEntry;
use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::LedgerStore;

/// Repository adapting both ledger tables to the internal entry shape.
#[derive(Clone)]
pub struct LedgerRepository {
    db: DbConnection,
}

impl LedgerRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn placeholders(count: usize) -> String {
        vec!["?"; count].join(",")
    }
}

#[async_trait]
impl LedgerStore for LedgerRepository {
    async fn canonical_entries(&self, child_refs: &[String]) -> Result<Vec<LedgerEntry>> {
        if child_refs.is_empty() {
            return Ok(vec![]);
        }

        let query_str = format!(
            "SELECT id, child_id, delta, reason, created_at
             FROM points_ledger
             WHERE child_id IN ({})
             ORDER BY created_at ASC",
            Self::placeholders(child_refs.len())
        );

        let mut query = sqlx::query(&query_str);
        for child_ref in child_refs {
            query = query.bind(child_ref);
        }

        let rows = query.fetch_all(self.db.pool()).await?;

        Ok(rows
            .iter()
            .map(|row| LedgerEntry {
                id: row.get("id"),
                child_ref: row.get("child_id"),
                delta: row.get("delta"),
                reason: row.get("reason"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn legacy_entries(&self, child_refs: &[String]) -> Result<Vec<LedgerEntry>> {
        if child_refs.is_empty() {
            return Ok(vec![]);
        }

        // Old table spells the same concept `points`/`note`
        let query_str = format!(
            "SELECT id, child_uid, points, note, created_at
             FROM child_points_ledger
             WHERE child_uid IN ({})
             ORDER BY created_at ASC",
            Self::placeholders(child_refs.len())
        );

        let mut query = sqlx::query(&query_str);
        for child_ref in child_refs {
            query = query.bind(child_ref);
        }

        let rows = query.fetch_all(self.db.pool()).await?;

        Ok(rows
            .iter()
            .map(|row| LedgerEntry {
                id: row.get("id"),
                child_ref: row.get("child_uid"),
                delta: row.get("points"),
                reason: row.get("note"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn insert_entry(&self, entry: &LedgerEntry) -> Result<()> {
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
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}
