use serde::{Deserialize, Serialize};

/// Canonical point wallet for a single child.
///
/// Invariants (enforced by the backend, relied on by every consumer):
/// `balance_points == available_points + reserved_points` and
/// `spent_points == max(0, total_points - available_points - reserved_points)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChildWallet {
    /// Lifetime earned points (sum of strictly positive ledger deltas).
    pub total_points: i64,
    /// Points earmarked against accepted-but-not-redeemed reward offers.
    pub reserved_points: i64,
    /// Points currently spendable.
    pub available_points: i64,
    /// Points already spent or cashed out.
    pub spent_points: i64,
    /// Available plus reserved.
    pub balance_points: i64,
}

/// Both identifier forms for one child entity.
///
/// A child may be addressed by its current primary key or by the identifier
/// it carried before the schema migration; ledger history can be split across
/// the two, so reads must cover both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildIdentifiers {
    pub legacy: String,
    pub canonical: String,
}

impl ChildIdentifiers {
    /// The distinct id forms to use in ledger/offer/rollup queries.
    pub fn query_forms(&self) -> Vec<String> {
        let mut forms = vec![self.canonical.clone()];
        if self.legacy != self.canonical {
            forms.push(self.legacy.clone());
        }
        forms
    }
}

/// Partition of a child's positive ledger entries by earning source.
///
/// `total` is always the sum of the eight buckets; debug/test entries are
/// excluded from the breakdown entirely (they still count toward the wallet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EarningsBreakdown {
    pub daily: i64,
    pub checklists: i64,
    pub games: i64,
    pub targets: i64,
    pub wishlist: i64,
    pub reward_encourage: i64,
    pub reward_redemption: i64,
    pub other: i64,
    pub total: i64,
}

/// A child as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    /// Primary-key identifier in the current schema (a UUID string).
    pub id: String,
    /// Identifier from the previous schema, if this child predates the migration.
    pub legacy_uid: Option<String>,
    /// Family this child belongs to.
    pub family_id: String,
    pub name: String,
    pub nickname: Option<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 last-update timestamp.
    pub updated_at: String,
}

impl Child {
    /// Generate a fresh canonical id.
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// The name to show in child-facing views.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChildRequest {
    pub name: String,
    pub family_id: String,
    pub nickname: Option<String>,
    /// Carried through when migrating a child from the previous schema.
    pub legacy_uid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateChildRequest {
    pub name: Option<String>,
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildResponse {
    pub child: Child,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildListResponse {
    pub children: Vec<Child>,
}

/// Request to apply a point delta to a child's ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardPointsRequest {
    /// Canonical id or legacy uid; the backend resolves either form.
    pub child_id: String,
    /// Signed point amount (negative for deductions).
    pub delta: i64,
    pub reason: String,
    /// Caller-supplied reference for idempotency. When present, the same
    /// `{child, reference}` pair is applied at most once; when absent no
    /// idempotency guarantee is requested.
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardPointsResponse {
    /// Whether a new ledger row was recorded (false means the reference was
    /// already applied and the call was a no-op).
    pub awarded: bool,
    pub ledger_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletResponse {
    pub child_id: String,
    pub wallet: ChildWallet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservedPointsResponse {
    pub child_id: String,
    pub reserved_points: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownResponse {
    pub child_id: String,
    pub breakdown: EarningsBreakdown,
}

/// One child's wallet inside a family-wide listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildWalletSummary {
    pub child: Child,
    pub wallet: ChildWallet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyWalletsResponse {
    pub wallets: Vec<ChildWalletSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_forms_deduplicates_identical_ids() {
        let ids = ChildIdentifiers {
            legacy: "a".to_string(),
            canonical: "a".to_string(),
        };
        assert_eq!(ids.query_forms(), vec!["a".to_string()]);

        let ids = ChildIdentifiers {
            legacy: "b".to_string(),
            canonical: "a".to_string(),
        };
        assert_eq!(ids.query_forms(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn display_name_prefers_nickname() {
        let mut child = Child {
            id: Child::generate_id(),
            legacy_uid: None,
            family_id: Child::generate_id(),
            name: "Alexandra".to_string(),
            nickname: Some("Alex".to_string()),
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert_eq!(child.display_name(), "Alex");
        child.nickname = None;
        assert_eq!(child.display_name(), "Alexandra");
    }
}
