use chrono::Utc;
use sqlx::SqlitePool;

use crate::dto::message_dto::SendMessagePayload;
use crate::error::Result;
use crate::models::message::Message;

#[derive(Clone)]
pub struct MessageService {
    pool: SqlitePool,
}

impl MessageService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn send(&self, sender_id: i64, payload: SendMessagePayload) -> Result<Message> {
        let result = sqlx::query(
            r#"
            INSERT INTO messages (sender_id, recipient_id, application_id, body, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(sender_id)
        .bind(payload.recipient_id)
        .bind(payload.application_id)
        .bind(&payload.body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let message = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(&self.pool)
            .await?;
        Ok(message)
    }

    /// Both directions of the conversation, oldest first. Fetching a thread
    /// marks the caller's inbound messages read.
    pub async fn thread(&self, me: i64, other: i64) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE (sender_id = ? AND recipient_id = ?)
               OR (sender_id = ? AND recipient_id = ?)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(me)
        .bind(other)
        .bind(other)
        .bind(me)
        .fetch_all(&self.pool)
        .await?;

        sqlx::query(
            r#"
            UPDATE messages SET read_at = ?
            WHERE recipient_id = ? AND sender_id = ? AND read_at IS NULL
            "#,
        )
        .bind(Utc::now())
        .bind(me)
        .bind(other)
        .execute(&self.pool)
        .await?;

        Ok(messages)
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM messages WHERE recipient_id = ? AND read_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0)
    }
}
