use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::warn;

use crate::dto::application_dto::{ApplicationListQuery, ApplyPayload, PanelPayload};
use crate::error::{Error, Result};
use crate::models::application::{
    ApplicationEvent, ApplicationStatus, InterviewPanelist, JobApplication,
};
use crate::models::job::{Job, JobStatus};
use crate::models::profile::{CandidateEducation, CandidateExperience};
use crate::services::notification_service::NotificationService;
use crate::services::scoring;
use crate::services::user_service;

#[derive(Clone)]
pub struct ApplicationService {
    pool: SqlitePool,
    notifications: NotificationService,
}

pub struct ApplicationList {
    pub items: Vec<JobApplication>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl ApplicationService {
    pub fn new(pool: SqlitePool, notifications: NotificationService) -> Self {
        Self {
            pool,
            notifications,
        }
    }

    /// The full ingestion pipeline in one transaction: find-or-create the
    /// candidate, refresh the profile, replace the experience/education
    /// rows, enforce the single-active-application rule and insert the
    /// application. The notification afterwards is best-effort.
    pub async fn apply(
        &self,
        payload: ApplyPayload,
        resume_path: Option<String>,
    ) -> Result<JobApplication> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?")
            .bind(payload.job_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("job {} not found", payload.job_id)))?;
        if JobStatus::parse(&job.status) != Some(JobStatus::Active) {
            return Err(Error::BadRequest(
                "this position is not open for applications".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let user_id = user_service::upsert_candidate_tx(
            &mut *tx,
            &payload.name,
            &payload.email,
            payload.phone.as_deref(),
            payload.city.as_deref(),
            payload.linkedin_url.as_deref(),
            payload.github_url.as_deref(),
            payload.portfolio_url.as_deref(),
        )
        .await?;

        user_service::replace_experience_tx(&mut *tx, user_id, &payload.experience).await?;
        user_service::replace_education_tx(&mut *tx, user_id, &payload.education).await?;

        let open: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM job_applications
            WHERE user_id = ? AND status NOT IN ('rejected', 'withdrawn', 'hired')
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        if open > 0 {
            return Err(Error::Conflict(
                "you already have an application in progress; withdraw it before applying again"
                    .to_string(),
            ));
        }

        if let Some(path) = &resume_path {
            sqlx::query("UPDATE users SET resume_url = ?, updated_at = ? WHERE id = ?")
                .bind(path)
                .bind(Utc::now())
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        let now = Utc::now();
        let insert = sqlx::query(
            r#"
            INSERT INTO job_applications (job_id, user_id, status, score, resume_path,
                                          created_at, updated_at)
            VALUES (?, ?, 'new', 0, ?, ?, ?)
            "#,
        )
        .bind(payload.job_id)
        .bind(user_id)
        .bind(&resume_path)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| match &e {
            // The partial unique index backs the read-then-write check
            // against concurrent submissions.
            sqlx::Error::Database(db) if db.message().contains("UNIQUE") => Error::Conflict(
                "you already have an application in progress; withdraw it before applying again"
                    .to_string(),
            ),
            _ => Error::from(e),
        })?;
        let application_id = insert.last_insert_rowid();

        sqlx::query(
            r#"
            INSERT INTO application_events (application_id, actor_id, from_status, to_status,
                                            note, created_at)
            VALUES (?, ?, NULL, 'new', 'application received', ?)
            "#,
        )
        .bind(application_id)
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if let Some(owner) = job.created_by {
            if let Err(e) = self
                .notifications
                .notify(
                    owner,
                    &format!("New application for {}", job.title),
                    Some(&format!("{} applied via the careers page", payload.name)),
                    Some(&format!("/applications/{}", application_id)),
                )
                .await
            {
                warn!(error = ?e, application_id, "failed to notify job owner");
            }
        }

        self.get_raw(application_id).await
    }

    async fn get_raw(&self, id: i64) -> Result<JobApplication> {
        sqlx::query_as::<_, JobApplication>("SELECT * FROM job_applications WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("application {} not found", id)))
    }

    pub async fn get(&self, id: i64) -> Result<JobApplication> {
        let application = self.get_raw(id).await?;
        self.ensure_scored(application).await
    }

    pub async fn events(&self, application_id: i64) -> Result<Vec<ApplicationEvent>> {
        let events = sqlx::query_as::<_, ApplicationEvent>(
            "SELECT * FROM application_events WHERE application_id = ? ORDER BY id ASC",
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    pub async fn list(&self, query: ApplicationListQuery) -> Result<ApplicationList> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM job_applications WHERE 1 = 1");
        let mut list_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM job_applications WHERE 1 = 1");
        for qb in [&mut count_qb, &mut list_qb] {
            if let Some(job_id) = query.job_id {
                qb.push(" AND job_id = ").push_bind(job_id);
            }
            if let Some(status) = &query.status {
                qb.push(" AND status = ").push_bind(status.to_lowercase());
            }
        }
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        // Score before sorting so freshly submitted applications take their
        // place in the ranking on first read.
        list_qb.push(" ORDER BY id ASC");
        let unscored = list_qb
            .build_query_as::<JobApplication>()
            .fetch_all(&self.pool)
            .await?;
        let mut items = Vec::with_capacity(unscored.len());
        for application in unscored {
            items.push(self.ensure_scored(application).await?);
        }
        items.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });

        let start = ((page - 1) * per_page) as usize;
        let items: Vec<JobApplication> = items
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();

        Ok(ApplicationList {
            items,
            total,
            page,
            per_page,
            total_pages: (total + per_page - 1) / per_page,
        })
    }

    /// Lazy scoring: compute once while the cached score is zero, then
    /// serve the stored value forever after.
    async fn ensure_scored(&self, application: JobApplication) -> Result<JobApplication> {
        if application.score != 0.0 {
            return Ok(application);
        }
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?")
            .bind(application.job_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(job) = job else {
            return Ok(application);
        };
        let experience = sqlx::query_as::<_, CandidateExperience>(
            "SELECT * FROM candidate_experience WHERE user_id = ? ORDER BY id DESC",
        )
        .bind(application.user_id)
        .fetch_all(&self.pool)
        .await?;
        let education = sqlx::query_as::<_, CandidateEducation>(
            "SELECT * FROM candidate_education WHERE user_id = ? ORDER BY id DESC",
        )
        .bind(application.user_id)
        .fetch_all(&self.pool)
        .await?;

        let score = scoring::fit_score(&job, &experience, &education);
        if score == 0.0 {
            return Ok(application);
        }
        sqlx::query("UPDATE job_applications SET score = ? WHERE id = ?")
            .bind(score)
            .bind(application.id)
            .execute(&self.pool)
            .await?;
        Ok(JobApplication {
            score,
            ..application
        })
    }

    /// The only place a status column is written. Validates the move,
    /// updates the row and appends the audit event in one transaction.
    pub async fn transition(
        &self,
        id: i64,
        to: ApplicationStatus,
        actor_id: Option<i64>,
        note: Option<String>,
    ) -> Result<JobApplication> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(String,)> =
            sqlx::query_as("SELECT status FROM job_applications WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((current,)) = current else {
            return Err(Error::NotFound(format!("application {} not found", id)));
        };
        let from = ApplicationStatus::parse(&current)
            .ok_or_else(|| Error::Internal(format!("corrupt status: {}", current)))?;
        if !from.can_transition_to(to) {
            return Err(Error::BadRequest(format!(
                "cannot move application from {} to {}",
                from.as_str(),
                to.as_str()
            )));
        }

        let now = Utc::now();
        sqlx::query("UPDATE job_applications SET status = ?, updated_at = ? WHERE id = ?")
            .bind(to.as_str())
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO application_events (application_id, actor_id, from_status, to_status,
                                            note, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(actor_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(&note)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let application = self.get_raw(id).await?;
        if let Err(e) = self
            .notifications
            .notify(
                application.user_id,
                &format!("Your application is now {}", to.as_str()),
                note.as_deref(),
                Some(&format!("/applications/{}", id)),
            )
            .await
        {
            warn!(error = ?e, application_id = id, "failed to notify candidate");
        }
        Ok(application)
    }

    pub async fn withdraw(&self, id: i64, user_id: i64) -> Result<JobApplication> {
        let application = self.get_raw(id).await?;
        if application.user_id != user_id {
            return Err(Error::Forbidden(
                "only the applicant can withdraw an application".to_string(),
            ));
        }
        self.transition(id, ApplicationStatus::Withdrawn, Some(user_id), None)
            .await
    }

    pub async fn attach_letter(
        &self,
        id: i64,
        appointment: bool,
        letter_url: &str,
        actor_id: Option<i64>,
    ) -> Result<JobApplication> {
        let application = self.get_raw(id).await?;
        let column = if appointment {
            "appointment_letter_url"
        } else {
            "offer_letter_url"
        };
        sqlx::query(&format!(
            "UPDATE job_applications SET {} = ?, updated_at = ? WHERE id = ?",
            column
        ))
        .bind(letter_url)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        // Offer letters drive the status; appointment letters for an
        // already offered or hired candidate leave it untouched.
        let status = ApplicationStatus::parse(&application.status);
        match status {
            Some(s) if s.can_transition_to(ApplicationStatus::Offered) => {
                self.transition(
                    id,
                    ApplicationStatus::Offered,
                    actor_id,
                    Some("letter issued".to_string()),
                )
                .await
            }
            _ => self.get_raw(id).await,
        }
    }

    pub async fn panel(&self, application_id: i64) -> Result<Vec<InterviewPanelist>> {
        let rows = sqlx::query_as::<_, InterviewPanelist>(
            "SELECT * FROM interview_panel WHERE application_id = ? ORDER BY id ASC",
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn add_panelist(
        &self,
        application_id: i64,
        payload: PanelPayload,
    ) -> Result<InterviewPanelist> {
        self.get_raw(application_id).await?;
        let result = sqlx::query(
            r#"
            INSERT INTO interview_panel (application_id, user_id, panel_role, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(application_id)
        .bind(payload.user_id)
        .bind(&payload.panel_role)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.message().contains("UNIQUE") => {
                Error::Conflict("this user is already on the panel".to_string())
            }
            _ => Error::from(e),
        })?;

        let row = sqlx::query_as::<_, InterviewPanelist>(
            "SELECT * FROM interview_panel WHERE id = ?",
        )
        .bind(result.last_insert_rowid())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn remove_panelist(&self, application_id: i64, user_id: i64) -> Result<()> {
        let result =
            sqlx::query("DELETE FROM interview_panel WHERE application_id = ? AND user_id = ?")
                .bind(application_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("panelist not found".to_string()));
        }
        Ok(())
    }
}
