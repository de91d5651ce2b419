use anyhow::Result;
use async_trait::async_trait;
use sqlx::Row;

use crate::domain::models::Reward;
use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::RewardCatalogStore;

/// Repository for the reward catalog
#[derive(Clone)]
pub struct RewardRepository {
    db: DbConnection,
}

impl RewardRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RewardCatalogStore for RewardRepository {
    async fn costs_for(&self, reward_ids: &[String]) -> Result<Vec<(String, i64)>> {
        if reward_ids.is_empty() {
            return Ok(vec![]);
        }

        let placeholders = reward_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query_str = format!(
            "SELECT id, points_cost FROM rewards WHERE id IN ({})",
            placeholders
        );

        let mut query = sqlx::query(&query_str);
        for reward_id in reward_ids {
            query = query.bind(reward_id);
        }

        let rows = query.fetch_all(self.db.pool()).await?;

        Ok(rows
            .iter()
            .map(|row| (row.get("id"), row.get("points_cost")))
            .collect())
    }

    async fn store_reward(&self, reward: &Reward) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO rewards (id, title, points_cost)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&reward.id)
        .bind(&reward.title)
        .bind(reward.points_cost)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}
