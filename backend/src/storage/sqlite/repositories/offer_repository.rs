use anyhow::Result;
use async_trait::async_trait;
use sqlx::Row;

use crate::domain::models::{OfferStatus, RewardOffer};
use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::OfferStore;

/// Repository for reward-offer operations
#[derive(Clone)]
pub struct OfferRepository {
    db: DbConnection,
}

impl OfferRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OfferStore for OfferRepository {
    async fn accepted_offers(&self, child_refs: &[String]) -> Result<Vec<RewardOffer>> {
        if child_refs.is_empty() {
            return Ok(vec![]);
        }

        let placeholders = child_refs.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query_str = format!(
            "SELECT id, child_id, reward_id, status, points_cost, points_cost_override, created_at
             FROM reward_offers
             WHERE status = 'accepted' AND child_id IN ({})
             ORDER BY created_at ASC",
            placeholders
        );

        let mut query = sqlx::query(&query_str);
        for child_ref in child_refs {
            query = query.bind(child_ref);
        }

        let rows = query.fetch_all(self.db.pool()).await?;

        Ok(rows
            .iter()
            .map(|row| RewardOffer {
                id: row.get("id"),
                child_id: row.get("child_id"),
                reward_id: row.get("reward_id"),
                status: OfferStatus::parse(&row.get::<String, _>("status")),
                points_cost: row.get("points_cost"),
                points_cost_override: row.get("points_cost_override"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn store_offer(&self, offer: &RewardOffer) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reward_offers (id, child_id, reward_id, status, points_cost, points_cost_override, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&offer.id)
        .bind(&offer.child_id)
        .bind(&offer.reward_id)
        .bind(offer.status.as_str())
        .bind(offer.points_cost)
        .bind(offer.points_cost_override)
        .bind(&offer.created_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test() -> OfferRepository {
        let db = DbConnection::init_test()
            .await
            .expect("Failed to create test database");
        OfferRepository::new(db)
    }

    fn offer(child_id: &str, status: OfferStatus, cost: Option<i64>) -> RewardOffer {
        RewardOffer {
            id: RewardOffer::generate_id(),
            child_id: child_id.to_string(),
            reward_id: None,
            status,
            points_cost: cost,
            points_cost_override: None,
            created_at: "2026-03-01T00:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_only_accepted_offers_are_returned() {
        let repo = setup_test().await;

        repo.store_offer(&offer("child-a", OfferStatus::Accepted, Some(40)))
            .await
            .expect("Failed to store offer");
        repo.store_offer(&offer("child-a", OfferStatus::Pending, Some(10)))
            .await
            .expect("Failed to store offer");
        repo.store_offer(&offer("child-a", OfferStatus::Redeemed, Some(99)))
            .await
            .expect("Failed to store offer");
        repo.store_offer(&offer("child-b", OfferStatus::Accepted, Some(5)))
            .await
            .expect("Failed to store offer");

        let accepted = repo
            .accepted_offers(&["child-a".to_string()])
            .await
            .expect("Failed to list accepted offers");

        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].points_cost, Some(40));
        assert_eq!(accepted[0].status, OfferStatus::Accepted);
    }
}
