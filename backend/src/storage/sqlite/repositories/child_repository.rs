use anyhow::Result;
use async_trait::async_trait;
use sqlx::Row;

use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::ChildStore;
use shared::Child;

/// Repository for child operations
#[derive(Clone)]
pub struct ChildRepository {
    db: DbConnection,
}

impl ChildRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_child(row: &sqlx::sqlite::SqliteRow) -> Child {
        Child {
            id: row.get("id"),
            legacy_uid: row.get("legacy_uid"),
            family_id: row.get("family_id"),
            name: row.get("name"),
            nickname: row.get("nickname"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl ChildStore for ChildRepository {
    async fn store_child(&self, child: &Child) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO children (id, legacy_uid, family_id, name, nickname, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&child.id)
        .bind(&child.legacy_uid)
        .bind(&child.family_id)
        .bind(&child.name)
        .bind(&child.nickname)
        .bind(&child.created_at)
        .bind(&child.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn find_by_any_id(&self, id: &str) -> Result<Option<Child>> {
        let row = sqlx::query(
            r#"
            SELECT id, legacy_uid, family_id, name, nickname, created_at, updated_at
            FROM children
            WHERE id = ? OR legacy_uid = ?
            "#,
        )
        .bind(id)
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(Self::row_to_child))
    }

    async fn list_children_for_family(&self, family_id: &str) -> Result<Vec<Child>> {
        let rows = sqlx::query(
            r#"
            SELECT id, legacy_uid, family_id, name, nickname, created_at, updated_at
            FROM children
            WHERE family_id = ?
            ORDER BY name ASC
            "#,
        )
        .bind(family_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(Self::row_to_child).collect())
    }

    async fn update_child(&self, child: &Child) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE children
            SET name = ?, nickname = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&child.name)
        .bind(&child.nickname)
        .bind(&child.updated_at)
        .bind(&child.id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}
