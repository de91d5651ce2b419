//! Canonical/legacy identifier resolution.
//!
//! A child is addressable by two interchangeable UUIDs: the current primary
//! key and the uid it carried before the schema migration. Ledger history
//! can be split across the two, so every read path resolves an incoming id
//! to the full pair first and queries with both forms.

use log::{debug, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::{PointsError, PointsResult};
use crate::storage::traits::ChildStore;
use shared::ChildIdentifiers;

#[derive(Clone)]
pub struct IdentityService {
    child_store: Arc<dyn ChildStore>,
}

impl IdentityService {
    pub fn new(child_store: Arc<dyn ChildStore>) -> Self {
        Self { child_store }
    }

    /// Validate that `raw` is a well-formed UUID before any storage call.
    pub fn require_uuid(raw: &str) -> PointsResult<String> {
        let trimmed = raw.trim();
        if Uuid::parse_str(trimmed).is_err() {
            return Err(PointsError::InvalidIdentifier(raw.to_string()));
        }
        Ok(trimmed.to_string())
    }

    /// Resolve an id that may be either form into the full pair.
    ///
    /// A child not present in the store is not an error: a brand-new child
    /// may not be materialized yet, and callers must still be able to render
    /// a zero state. The input then stands in for both forms. The same soft
    /// recovery applies when the lookup itself fails, since downstream reads
    /// can still answer from other sources.
    pub async fn resolve_identifiers(&self, id: &str) -> PointsResult<ChildIdentifiers> {
        let id = Self::require_uuid(id)?;

        match self.child_store.find_by_any_id(&id).await {
            Ok(Some(child)) => Ok(ChildIdentifiers {
                legacy: child.legacy_uid.unwrap_or_else(|| child.id.clone()),
                canonical: child.id,
            }),
            Ok(None) => {
                debug!("child {} not found, using the id as both forms", id);
                Ok(ChildIdentifiers {
                    legacy: id.clone(),
                    canonical: id,
                })
            }
            Err(e) => {
                warn!("child lookup for {} failed, using the id as both forms: {:#}", id, e);
                Ok(ChildIdentifiers {
                    legacy: id.clone(),
                    canonical: id,
                })
            }
        }
    }
}
