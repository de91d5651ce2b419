use serde::{Deserialize, Serialize};

/// Lifecycle of a reward offer. Only `Accepted` offers reserve points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferStatus {
    Pending,
    Accepted,
    Redeemed,
    Declined,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Redeemed => "redeemed",
            OfferStatus::Declined => "declined",
        }
    }

    /// Parse a stored status. Unknown values read as `Pending`, which never
    /// reserves points.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "accepted" => OfferStatus::Accepted,
            "redeemed" => OfferStatus::Redeemed,
            "declined" => OfferStatus::Declined,
            _ => OfferStatus::Pending,
        }
    }
}

/// A reward a child has been offered or has accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardOffer {
    pub id: String,
    pub child_id: String,
    /// Catalog reference; absent for ad-hoc offers.
    pub reward_id: Option<String>,
    pub status: OfferStatus,
    /// Cost copied onto the offer when it was made.
    pub points_cost: Option<i64>,
    /// Parent-set override; takes precedence over everything else.
    pub points_cost_override: Option<i64>,
    pub created_at: String,
}

impl RewardOffer {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// The cost known without consulting the catalog: override first, then
    /// the offer's own cost. `None` means a catalog lookup is required.
    pub fn local_cost(&self) -> Option<i64> {
        self.points_cost_override.or(self.points_cost)
    }
}

/// Catalog entry a reward offer may reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub title: String,
    pub points_cost: i64,
}
