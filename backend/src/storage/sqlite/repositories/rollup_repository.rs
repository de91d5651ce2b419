use anyhow::Result;
use async_trait::async_trait;
use sqlx::Row;

use crate::domain::models::WalletRollup;
use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::RollupStore;

/// Repository for the precomputed wallet rollups
#[derive(Clone)]
pub struct RollupRepository {
    db: DbConnection,
}

impl RollupRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RollupStore for RollupRepository {
    async fn rollup_for_child(&self, child_refs: &[String]) -> Result<Option<WalletRollup>> {
        if child_refs.is_empty() {
            return Ok(None);
        }

        let placeholders = child_refs.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query_str = format!(
            "SELECT child_id, lifetime_earned_pts, spent_cashout_pts, reserved_pts,
                    spent_total_pts, available_pts, balance_pts
             FROM wallet_rollups
             WHERE child_id IN ({})
             LIMIT 1",
            placeholders
        );

        let mut query = sqlx::query(&query_str);
        for child_ref in child_refs {
            query = query.bind(child_ref);
        }

        let row = query.fetch_optional(self.db.pool()).await?;

        Ok(row.map(|r| WalletRollup {
            child_id: r.get("child_id"),
            lifetime_earned_pts: r.get("lifetime_earned_pts"),
            spent_cashout_pts: r.get("spent_cashout_pts"),
            reserved_pts: r.get("reserved_pts"),
            spent_total_pts: r.get("spent_total_pts"),
            available_pts: r.get("available_pts"),
            balance_pts: r.get("balance_pts"),
        }))
    }

    async fn upsert_rollup(&self, rollup: &WalletRollup) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO wallet_rollups (child_id, lifetime_earned_pts, spent_cashout_pts,
                                        reserved_pts, spent_total_pts, available_pts, balance_pts)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(child_id) DO UPDATE SET
                lifetime_earned_pts = excluded.lifetime_earned_pts,
                spent_cashout_pts = excluded.spent_cashout_pts,
                reserved_pts = excluded.reserved_pts,
                spent_total_pts = excluded.spent_total_pts,
                available_pts = excluded.available_pts,
                balance_pts = excluded.balance_pts
            "#,
        )
        .bind(&rollup.child_id)
        .bind(rollup.lifetime_earned_pts)
        .bind(rollup.spent_cashout_pts)
        .bind(rollup.reserved_pts)
        .bind(rollup.spent_total_pts)
        .bind(rollup.available_pts)
        .bind(rollup.balance_pts)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}
