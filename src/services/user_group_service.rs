use chrono::Utc;
use sqlx::SqlitePool;

use crate::dto::user_group_dto::{CreateGroupPayload, UpdateGroupPayload};
use crate::error::{Error, Result};
use crate::models::user_group::{PermissionMap, UserGroup};

#[derive(Clone)]
pub struct UserGroupService {
    pool: SqlitePool,
}

impl UserGroupService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<UserGroup> {
        sqlx::query_as::<_, UserGroup>("SELECT * FROM user_groups WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user group {} not found", id)))
    }

    pub async fn list(&self) -> Result<Vec<UserGroup>> {
        let groups = sqlx::query_as::<_, UserGroup>("SELECT * FROM user_groups ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(groups)
    }

    pub async fn create(&self, payload: CreateGroupPayload) -> Result<UserGroup> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO user_groups (name, permissions, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&payload.name)
        .bind(serde_json::to_string(&payload.permissions)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.message().contains("UNIQUE") => {
                Error::Conflict(format!("a group named {} already exists", payload.name))
            }
            _ => Error::from(e),
        })?;
        self.get_by_id(result.last_insert_rowid()).await
    }

    /// Name and permission map move together, so the two writes share a
    /// transaction.
    pub async fn update(&self, id: i64, payload: UpdateGroupPayload) -> Result<UserGroup> {
        self.get_by_id(id).await?;
        let mut tx = self.pool.begin().await?;

        if let Some(name) = &payload.name {
            sqlx::query("UPDATE user_groups SET name = ?, updated_at = ? WHERE id = ?")
                .bind(name)
                .bind(Utc::now())
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        if let Some(permissions) = &payload.permissions {
            sqlx::query("UPDATE user_groups SET permissions = ?, updated_at = ? WHERE id = ?")
                .bind(serde_json::to_string(permissions)?)
                .bind(Utc::now())
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE group_id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if in_use > 0 {
            return Err(Error::Conflict(format!(
                "group is assigned to {} user(s)",
                in_use
            )));
        }
        let result = sqlx::query("DELETE FROM user_groups WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("user group {} not found", id)));
        }
        Ok(())
    }

    /// Permission map for a user's group; empty map when the user has no
    /// group (deny-by-default).
    pub async fn permissions_for(&self, group_id: Option<i64>) -> Result<PermissionMap> {
        let Some(group_id) = group_id else {
            return Ok(PermissionMap::default());
        };
        let group = self.get_by_id(group_id).await?;
        Ok(group.permission_map())
    }
}
