use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::storage::traits::ChildStore;
use shared::{Child, ChildListResponse, ChildResponse, CreateChildRequest, UpdateChildRequest};

/// Service for managing children in the points tracking system
#[derive(Clone)]
pub struct ChildService {
    child_store: Arc<dyn ChildStore>,
}

impl ChildService {
    /// Create a new ChildService
    pub fn new(child_store: Arc<dyn ChildStore>) -> Self {
        Self { child_store }
    }

    /// Create a new child
    pub async fn create_child(&self, request: CreateChildRequest) -> Result<ChildResponse> {
        info!("Creating child: name={}, family={}", request.name, request.family_id);

        self.validate_create_request(&request)?;

        let now = Utc::now().to_rfc3339();
        let child = Child {
            id: Child::generate_id(),
            legacy_uid: request.legacy_uid,
            family_id: request.family_id,
            name: request.name.trim().to_string(),
            nickname: request.nickname.map(|n| n.trim().to_string()),
            created_at: now.clone(),
            updated_at: now,
        };

        self.child_store.store_child(&child).await?;

        info!("Created child: {} with ID: {}", child.name, child.id);

        Ok(ChildResponse {
            child,
            success_message: "Child created successfully".to_string(),
        })
    }

    /// Get a child by either id form
    pub async fn get_child(&self, child_id: &str) -> Result<Option<Child>> {
        info!("Getting child: {}", child_id);

        let child = self.child_store.find_by_any_id(child_id).await?;

        if child.is_none() {
            warn!("Child not found: {}", child_id);
        }

        Ok(child)
    }

    /// List a family's children
    pub async fn list_children(&self, family_id: &str) -> Result<ChildListResponse> {
        info!("Listing children for family {}", family_id);

        let children = self.child_store.list_children_for_family(family_id).await?;

        info!("Found {} children", children.len());

        Ok(ChildListResponse { children })
    }

    /// Update an existing child
    pub async fn update_child(&self, child_id: &str, request: UpdateChildRequest) -> Result<ChildResponse> {
        info!("Updating child: {}", child_id);

        let mut child = self
            .child_store
            .find_by_any_id(child_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Child not found: {}", child_id))?;

        self.validate_update_request(&request)?;

        if let Some(name) = request.name {
            child.name = name.trim().to_string();
        }
        if let Some(nickname) = request.nickname {
            let nickname = nickname.trim().to_string();
            child.nickname = if nickname.is_empty() { None } else { Some(nickname) };
        }
        child.updated_at = Utc::now().to_rfc3339();

        self.child_store.update_child(&child).await?;

        info!("Updated child: {} with ID: {}", child.name, child.id);

        Ok(ChildResponse {
            child,
            success_message: "Child updated successfully".to_string(),
        })
    }

    /// Validate create child request
    fn validate_create_request(&self, request: &CreateChildRequest) -> Result<()> {
        if request.name.trim().is_empty() {
            return Err(anyhow::anyhow!("Child name cannot be empty"));
        }
        if request.name.len() > 100 {
            return Err(anyhow::anyhow!("Child name cannot exceed 100 characters"));
        }
        if Uuid::parse_str(&request.family_id).is_err() {
            return Err(anyhow::anyhow!("Family id must be a UUID"));
        }
        if let Some(legacy_uid) = &request.legacy_uid {
            if Uuid::parse_str(legacy_uid).is_err() {
                return Err(anyhow::anyhow!("Legacy uid must be a UUID"));
            }
        }
        Ok(())
    }

    /// Validate update child request
    fn validate_update_request(&self, request: &UpdateChildRequest) -> Result<()> {
        if let Some(ref name) = request.name {
            if name.trim().is_empty() {
                return Err(anyhow::anyhow!("Child name cannot be empty"));
            }
            if name.len() > 100 {
                return Err(anyhow::anyhow!("Child name cannot exceed 100 characters"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sqlite::{ChildRepository, DbConnection};

    async fn setup_test() -> ChildService {
        let db = DbConnection::init_test()
            .await
            .expect("Failed to create test database");
        ChildService::new(Arc::new(ChildRepository::new(db)))
    }

    fn create_request(name: &str) -> CreateChildRequest {
        CreateChildRequest {
            name: name.to_string(),
            family_id: Child::generate_id(),
            nickname: None,
            legacy_uid: None,
        }
    }

    #[tokio::test]
    async fn test_create_child() {
        let service = setup_test().await;

        let response = service
            .create_child(create_request("Alice Smith"))
            .await
            .expect("Failed to create child");

        assert_eq!(response.child.name, "Alice Smith");
        assert!(Uuid::parse_str(&response.child.id).is_ok());
        assert!(!response.child.created_at.is_empty());
        assert_eq!(response.success_message, "Child created successfully");
    }

    #[tokio::test]
    async fn test_create_child_validation() {
        let service = setup_test().await;

        // Empty name
        assert!(service.create_child(create_request("")).await.is_err());

        // Family id must be a UUID
        let mut request = create_request("Alice");
        request.family_id = "family-1".to_string();
        assert!(service.create_child(request).await.is_err());

        // Legacy uid, when given, must be a UUID
        let mut request = create_request("Alice");
        request.legacy_uid = Some("old-id".to_string());
        assert!(service.create_child(request).await.is_err());
    }

    #[tokio::test]
    async fn test_get_child_by_either_form() {
        let service = setup_test().await;

        let legacy_uid = Child::generate_id();
        let mut request = create_request("Bob Johnson");
        request.legacy_uid = Some(legacy_uid.clone());
        let created = service.create_child(request).await.expect("Failed to create child");

        let by_canonical = service
            .get_child(&created.child.id)
            .await
            .expect("Failed to get child");
        assert!(by_canonical.is_some());

        let by_legacy = service
            .get_child(&legacy_uid)
            .await
            .expect("Failed to get child");
        assert_eq!(by_legacy, by_canonical);
    }

    #[tokio::test]
    async fn test_get_nonexistent_child() {
        let service = setup_test().await;

        let child = service
            .get_child(&Child::generate_id())
            .await
            .expect("Failed to query child");
        assert!(child.is_none());
    }

    #[tokio::test]
    async fn test_list_children_is_family_scoped_and_ordered() {
        let service = setup_test().await;
        let family_id = Child::generate_id();

        for name in ["Bob", "Alice"] {
            let mut request = create_request(name);
            request.family_id = family_id.clone();
            service.create_child(request).await.expect("Failed to create child");
        }
        // A child in another family stays out of the listing
        service
            .create_child(create_request("Carol"))
            .await
            .expect("Failed to create child");

        let response = service
            .list_children(&family_id)
            .await
            .expect("Failed to list children");
        assert_eq!(response.children.len(), 2);
        assert_eq!(response.children[0].name, "Alice");
        assert_eq!(response.children[1].name, "Bob");
    }

    #[tokio::test]
    async fn test_update_child() {
        let service = setup_test().await;

        let created = service
            .create_child(create_request("Original Name"))
            .await
            .expect("Failed to create child");

        let updated = service
            .update_child(
                &created.child.id,
                UpdateChildRequest {
                    name: Some("Updated Name".to_string()),
                    nickname: Some("Newbie".to_string()),
                },
            )
            .await
            .expect("Failed to update child");

        assert_eq!(updated.child.name, "Updated Name");
        assert_eq!(updated.child.nickname.as_deref(), Some("Newbie"));
        assert_eq!(updated.child.created_at, created.child.created_at);
    }

    #[tokio::test]
    async fn test_update_nonexistent_child() {
        let service = setup_test().await;

        let result = service
            .update_child(
                &Child::generate_id(),
                UpdateChildRequest {
                    name: Some("Updated".to_string()),
                    nickname: None,
                },
            )
            .await;
        assert!(result.is_err());
    }
}
