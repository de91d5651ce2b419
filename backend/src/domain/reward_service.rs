//! Reserved-points computation.
//!
//! Reserved points are the sum of the effective costs of every accepted
//! reward offer for a child. The effective cost of one offer follows a
//! strict precedence: parent-set override, then the cost copied onto the
//! offer, then a catalog lookup by reward reference, then zero.

use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::errors::PointsResult;
use crate::domain::fallback::{first_resolved, StrategyFuture, Unavailable};
use crate::domain::identity_service::IdentityService;
use crate::storage::traits::{OfferStore, RewardCatalogStore, RollupStore};
use shared::ChildIdentifiers;

#[derive(Clone)]
pub struct RewardService {
    offer_store: Arc<dyn OfferStore>,
    catalog_store: Arc<dyn RewardCatalogStore>,
    rollup_store: Arc<dyn RollupStore>,
    identity: IdentityService,
}

impl RewardService {
    pub fn new(
        offer_store: Arc<dyn OfferStore>,
        catalog_store: Arc<dyn RewardCatalogStore>,
        rollup_store: Arc<dyn RollupStore>,
        identity: IdentityService,
    ) -> Self {
        Self {
            offer_store,
            catalog_store,
            rollup_store,
            identity,
        }
    }

    /// Reserved points for a child, preferring the rollup's precomputed
    /// figure and falling back to summing the accepted offers.
    pub async fn fetch_reserved_points(&self, child_id: &str) -> PointsResult<i64> {
        let ids = self.identity.resolve_identifiers(child_id).await?;

        let strategies: Vec<(&'static str, StrategyFuture<'_, i64>)> = vec![
            ("rollup", Box::pin(self.reserved_from_rollup(&ids))),
            ("offers", Box::pin(self.reserved_from_offers_checked(&ids))),
        ];

        first_resolved("reserved points", strategies).await
    }

    async fn reserved_from_rollup(&self, ids: &ChildIdentifiers) -> Result<i64, Unavailable> {
        let rollup = self
            .rollup_store
            .rollup_for_child(&ids.query_forms())
            .await
            .map_err(Unavailable)?;

        match rollup {
            Some(rollup) => Ok(rollup.reserved_pts),
            // Unlike the wallet path, a missing rollup row says nothing
            // about offers, so hand over to the offer sum.
            None => Err(Unavailable(anyhow::anyhow!(
                "no rollup row for child {}",
                ids.canonical
            ))),
        }
    }

    async fn reserved_from_offers_checked(&self, ids: &ChildIdentifiers) -> Result<i64, Unavailable> {
        self.reserved_from_offers(ids).await.map_err(Unavailable)
    }

    /// Sum the effective costs of all accepted offers.
    ///
    /// Offers missing both the override and the direct cost are resolved
    /// against the catalog in one batched query over the distinct reward
    /// references, never one query per offer. An offer whose reference
    /// cannot be resolved contributes zero.
    pub async fn reserved_from_offers(&self, ids: &ChildIdentifiers) -> anyhow::Result<i64> {
        let offers = self.offer_store.accepted_offers(&ids.query_forms()).await?;
        if offers.is_empty() {
            return Ok(0);
        }

        let mut missing: Vec<String> = offers
            .iter()
            .filter(|offer| offer.local_cost().is_none())
            .filter_map(|offer| offer.reward_id.clone())
            .collect();
        missing.sort();
        missing.dedup();

        let catalog_costs: HashMap<String, i64> = if missing.is_empty() {
            HashMap::new()
        } else {
            self.catalog_store
                .costs_for(&missing)
                .await?
                .into_iter()
                .collect()
        };

        let mut reserved = 0i64;
        for offer in &offers {
            let cost = match offer.local_cost() {
                Some(cost) => cost,
                None => match &offer.reward_id {
                    Some(reward_id) => match catalog_costs.get(reward_id) {
                        Some(cost) => *cost,
                        None => {
                            warn!(
                                "offer {} references unknown reward {}, counting 0",
                                offer.id, reward_id
                            );
                            0
                        }
                    },
                    None => {
                        debug!("offer {} has no cost and no reward reference", offer.id);
                        0
                    }
                },
            };
            reserved += cost;
        }

        Ok(reserved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{OfferStatus, Reward, RewardOffer, WalletRollup};
    use crate::storage::sqlite::{
        ChildRepository, DbConnection, OfferRepository, RewardRepository, RollupRepository,
    };
    use crate::storage::traits::{ChildStore, RewardCatalogStore};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CHILD: &str = "0b8c9c5e-6f2a-4f3b-9d2e-1a2b3c4d5e6f";

    /// Catalog double that counts queries, for the batching assertion.
    struct CountingCatalog {
        inner: RewardRepository,
        queries: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RewardCatalogStore for CountingCatalog {
        async fn costs_for(&self, reward_ids: &[String]) -> Result<Vec<(String, i64)>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.inner.costs_for(reward_ids).await
        }

        async fn store_reward(&self, reward: &Reward) -> Result<()> {
            self.inner.store_reward(reward).await
        }
    }

    struct Fixture {
        service: RewardService,
        offers: OfferRepository,
        rewards: RewardRepository,
        rollups: RollupRepository,
        catalog_queries: Arc<AtomicUsize>,
    }

    async fn setup_test() -> Fixture {
        let db = DbConnection::init_test()
            .await
            .expect("Failed to create test database");
        let child_store: Arc<dyn ChildStore> = Arc::new(ChildRepository::new(db.clone()));
        let offers = OfferRepository::new(db.clone());
        let rewards = RewardRepository::new(db.clone());
        let rollups = RollupRepository::new(db.clone());
        let catalog_queries = Arc::new(AtomicUsize::new(0));

        let service = RewardService::new(
            Arc::new(offers.clone()),
            Arc::new(CountingCatalog {
                inner: rewards.clone(),
                queries: catalog_queries.clone(),
            }),
            Arc::new(rollups.clone()),
            IdentityService::new(child_store),
        );

        Fixture {
            service,
            offers,
            rewards,
            rollups,
            catalog_queries,
        }
    }

    fn offer(
        reward_id: Option<&str>,
        cost: Option<i64>,
        cost_override: Option<i64>,
    ) -> RewardOffer {
        RewardOffer {
            id: RewardOffer::generate_id(),
            child_id: CHILD.to_string(),
            reward_id: reward_id.map(|s| s.to_string()),
            status: OfferStatus::Accepted,
            points_cost: cost,
            points_cost_override: cost_override,
            created_at: "2026-03-01T00:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_effective_cost_precedence() {
        let fixture = setup_test().await;

        fixture
            .rewards
            .store_reward(&Reward {
                id: "reward-1".to_string(),
                title: "Cinema trip".to_string(),
                points_cost: 100,
            })
            .await
            .expect("Failed to store reward");

        // Override wins over direct cost and catalog
        fixture
            .offers
            .store_offer(&offer(Some("reward-1"), Some(50), Some(40)))
            .await
            .expect("Failed to store offer");
        // Direct cost wins over catalog
        fixture
            .offers
            .store_offer(&offer(Some("reward-1"), Some(30), None))
            .await
            .expect("Failed to store offer");
        // Catalog resolves the rest
        fixture
            .offers
            .store_offer(&offer(Some("reward-1"), None, None))
            .await
            .expect("Failed to store offer");

        let reserved = fixture
            .service
            .fetch_reserved_points(CHILD)
            .await
            .expect("Failed to fetch reserved points");
        assert_eq!(reserved, 40 + 30 + 100);
    }

    #[tokio::test]
    async fn test_catalog_lookup_is_batched() {
        let fixture = setup_test().await;

        for (id, cost) in [("reward-1", 10), ("reward-2", 20)] {
            fixture
                .rewards
                .store_reward(&Reward {
                    id: id.to_string(),
                    title: id.to_string(),
                    points_cost: cost,
                })
                .await
                .expect("Failed to store reward");
        }

        // Four offers needing the catalog, two distinct references
        for reward_id in ["reward-1", "reward-1", "reward-2", "reward-2"] {
            fixture
                .offers
                .store_offer(&offer(Some(reward_id), None, None))
                .await
                .expect("Failed to store offer");
        }

        let reserved = fixture
            .service
            .fetch_reserved_points(CHILD)
            .await
            .expect("Failed to fetch reserved points");
        assert_eq!(reserved, 10 + 10 + 20 + 20);
        assert_eq!(fixture.catalog_queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unresolved_references_contribute_zero() {
        let fixture = setup_test().await;

        fixture
            .offers
            .store_offer(&offer(Some("vanished-reward"), None, None))
            .await
            .expect("Failed to store offer");
        fixture
            .offers
            .store_offer(&offer(None, None, None))
            .await
            .expect("Failed to store offer");
        fixture
            .offers
            .store_offer(&offer(None, Some(15), None))
            .await
            .expect("Failed to store offer");

        let reserved = fixture
            .service
            .fetch_reserved_points(CHILD)
            .await
            .expect("Failed to fetch reserved points");
        assert_eq!(reserved, 15);
    }

    #[tokio::test]
    async fn test_rollup_figure_preferred_when_present() {
        let fixture = setup_test().await;

        fixture
            .offers
            .store_offer(&offer(None, Some(15), None))
            .await
            .expect("Failed to store offer");
        fixture
            .rollups
            .upsert_rollup(&WalletRollup {
                child_id: CHILD.to_string(),
                lifetime_earned_pts: 100,
                spent_cashout_pts: 0,
                reserved_pts: 55,
                spent_total_pts: 0,
                available_pts: 45,
                balance_pts: 100,
            })
            .await
            .expect("Failed to store rollup");

        let reserved = fixture
            .service
            .fetch_reserved_points(CHILD)
            .await
            .expect("Failed to fetch reserved points");
        assert_eq!(reserved, 55);
        assert_eq!(fixture.catalog_queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_offers_reserves_nothing() {
        let fixture = setup_test().await;

        let reserved = fixture
            .service
            .fetch_reserved_points(CHILD)
            .await
            .expect("Failed to fetch reserved points");
        assert_eq!(reserved, 0);
    }
}
