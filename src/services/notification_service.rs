use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{Error, Result};
use crate::models::notification::Notification;

/// Append-only notification rows, polled by the front end. Inserts are
/// best-effort at every call site: a failed notification never fails the
/// request that triggered it.
#[derive(Clone)]
pub struct NotificationService {
    pool: SqlitePool,
}

impl NotificationService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn notify(
        &self,
        user_id: i64,
        title: &str,
        body: Option<&str>,
        link: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, title, body, link, is_read, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(body)
        .bind(link)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn poll(&self, user_id: i64) -> Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = ? AND is_read = 0
            ORDER BY created_at DESC, id DESC
            LIMIT 50
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn mark_read(&self, id: i64, user_id: i64) -> Result<()> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("notification not found".to_string()));
        }
        Ok(())
    }
}
