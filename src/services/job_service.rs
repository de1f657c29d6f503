use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::dto::job_dto::{CreateJobPayload, JobListQuery, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::models::job::{Job, JobStatus};

#[derive(Clone)]
pub struct JobService {
    pool: SqlitePool,
}

pub struct JobList {
    pub items: Vec<Job>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl JobService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, payload: CreateJobPayload, created_by: i64) -> Result<Job> {
        let status = match &payload.status {
            Some(raw) => JobStatus::parse(raw)
                .ok_or_else(|| Error::BadRequest(format!("unknown job status: {}", raw)))?,
            None => JobStatus::Draft,
        };
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO jobs (
                title, department, location, employment_type, salary_min, salary_max,
                description, qualifications, experience_level, status, created_by,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.department)
        .bind(&payload.location)
        .bind(&payload.employment_type)
        .bind(payload.salary_min)
        .bind(payload.salary_max)
        .bind(&payload.description)
        .bind(&payload.qualifications)
        .bind(&payload.experience_level)
        .bind(status.as_str())
        .bind(created_by)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid()).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Job> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("job {} not found", id)))?;
        Ok(job)
    }

    pub async fn update(&self, id: i64, payload: UpdateJobPayload) -> Result<Job> {
        self.get_by_id(id).await?;
        if let Some(raw) = &payload.status {
            JobStatus::parse(raw)
                .ok_or_else(|| Error::BadRequest(format!("unknown job status: {}", raw)))?;
        }

        sqlx::query(
            r#"
            UPDATE jobs SET
                title = COALESCE(?, title),
                department = COALESCE(?, department),
                location = COALESCE(?, location),
                employment_type = COALESCE(?, employment_type),
                salary_min = COALESCE(?, salary_min),
                salary_max = COALESCE(?, salary_max),
                description = COALESCE(?, description),
                qualifications = COALESCE(?, qualifications),
                experience_level = COALESCE(?, experience_level),
                status = COALESCE(?, status),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.department)
        .bind(&payload.location)
        .bind(&payload.employment_type)
        .bind(payload.salary_min)
        .bind(payload.salary_max)
        .bind(&payload.description)
        .bind(&payload.qualifications)
        .bind(&payload.experience_level)
        .bind(payload.status.as_deref().map(str::to_lowercase))
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("job {} not found", id)));
        }
        Ok(())
    }

    pub async fn list(&self, query: JobListQuery) -> Result<JobList> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM jobs WHERE 1 = 1");
        let mut list_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM jobs WHERE 1 = 1");
        for qb in [&mut count_qb, &mut list_qb] {
            if let Some(status) = &query.status {
                qb.push(" AND status = ").push_bind(status.to_lowercase());
            }
            if let Some(department) = &query.department {
                qb.push(" AND department = ").push_bind(department.clone());
            }
            if let Some(search) = &query.search {
                let like = format!("%{}%", search);
                qb.push(" AND (title LIKE ")
                    .push_bind(like.clone())
                    .push(" OR description LIKE ")
                    .push_bind(like)
                    .push(")");
            }
        }

        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        list_qb
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(per_page)
            .push(" OFFSET ")
            .push_bind((page - 1) * per_page);
        let items = list_qb
            .build_query_as::<Job>()
            .fetch_all(&self.pool)
            .await?;

        Ok(JobList {
            items,
            total,
            page,
            per_page,
            total_pages: (total + per_page - 1) / per_page,
        })
    }

    /// Candidate-facing listing: active postings only.
    pub async fn list_active(&self, limit: i64) -> Result<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE status = 'active' ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }
}
