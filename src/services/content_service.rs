use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::dto::content_dto::{ContentListQuery, CreateContentPayload, UpdateContentPayload};
use crate::error::{Error, Result};
use crate::models::content::{ContentItem, ContentKind};

/// One CRUD service for every hospital-content collection. The kind is
/// part of every query, so an item created under /api/blogs can never be
/// read or deleted through /api/sliders.
#[derive(Clone)]
pub struct ContentService {
    pool: SqlitePool,
}

pub struct ContentList {
    pub items: Vec<ContentItem>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl ContentService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, kind: ContentKind, id: i64) -> Result<ContentItem> {
        sqlx::query_as::<_, ContentItem>("SELECT * FROM content_items WHERE id = ? AND kind = ?")
            .bind(id)
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("{} {} not found", kind.as_str(), id)))
    }

    pub async fn create(&self, kind: ContentKind, payload: CreateContentPayload) -> Result<ContentItem> {
        let now = Utc::now();
        let extra = payload
            .extra
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let result = sqlx::query(
            r#"
            INSERT INTO content_items (kind, title, slug, body, image_url, author, extra,
                                       published, sort_order, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(kind.as_str())
        .bind(&payload.title)
        .bind(&payload.slug)
        .bind(&payload.body)
        .bind(&payload.image_url)
        .bind(&payload.author)
        .bind(extra)
        .bind(payload.published.unwrap_or(false))
        .bind(payload.sort_order.unwrap_or(0))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        self.get(kind, result.last_insert_rowid()).await
    }

    pub async fn update(
        &self,
        kind: ContentKind,
        id: i64,
        payload: UpdateContentPayload,
    ) -> Result<ContentItem> {
        self.get(kind, id).await?;
        let extra = payload
            .extra
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        sqlx::query(
            r#"
            UPDATE content_items SET
                title = COALESCE(?, title),
                slug = COALESCE(?, slug),
                body = COALESCE(?, body),
                image_url = COALESCE(?, image_url),
                author = COALESCE(?, author),
                extra = COALESCE(?, extra),
                published = COALESCE(?, published),
                sort_order = COALESCE(?, sort_order),
                updated_at = ?
            WHERE id = ? AND kind = ?
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.slug)
        .bind(&payload.body)
        .bind(&payload.image_url)
        .bind(&payload.author)
        .bind(extra)
        .bind(payload.published)
        .bind(payload.sort_order)
        .bind(Utc::now())
        .bind(id)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await?;
        self.get(kind, id).await
    }

    pub async fn delete(&self, kind: ContentKind, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM content_items WHERE id = ? AND kind = ?")
            .bind(id)
            .bind(kind.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("{} {} not found", kind.as_str(), id)));
        }
        Ok(())
    }

    pub async fn list(&self, kind: ContentKind, query: ContentListQuery) -> Result<ContentList> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM content_items WHERE kind = ");
        count_qb.push_bind(kind.as_str());
        let mut list_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM content_items WHERE kind = ");
        list_qb.push_bind(kind.as_str());
        for qb in [&mut count_qb, &mut list_qb] {
            if let Some(published) = query.published {
                qb.push(" AND published = ").push_bind(published);
            }
        }

        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;
        // Sliders care about sort_order; everything else falls back to
        // newest-first because sort_order defaults to zero.
        list_qb
            .push(" ORDER BY sort_order ASC, created_at DESC, id DESC LIMIT ")
            .push_bind(per_page)
            .push(" OFFSET ")
            .push_bind((page - 1) * per_page);
        let items = list_qb
            .build_query_as::<ContentItem>()
            .fetch_all(&self.pool)
            .await?;

        Ok(ContentList {
            items,
            total,
            page,
            per_page,
            total_pages: (total + per_page - 1) / per_page,
        })
    }
}
