use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::dto::application_dto::{EducationEntry, ExperienceEntry};
use crate::dto::user_dto::{
    CreateUserPayload, ImportReport, ImportUsersPayload, UpdateUserPayload, UserListQuery,
};
use crate::error::{Error, Result};
use crate::models::profile::{CandidateEducation, CandidateExperience};
use crate::models::user::{Role, User};
use crate::utils::normalize;

#[derive(Clone)]
pub struct UserService {
    pool: SqlitePool,
}

pub struct UserList {
    pub items: Vec<User>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl UserService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user {} not found", id)))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(normalize::normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn create(&self, payload: CreateUserPayload) -> Result<User> {
        let email = normalize::normalize_email(&payload.email);
        if self.get_by_email(&email).await?.is_some() {
            return Err(Error::Conflict(format!(
                "a user with email {} already exists",
                email
            )));
        }
        let role = match &payload.role {
            Some(raw) => Role::parse(raw)
                .ok_or_else(|| Error::BadRequest(format!("unknown role: {}", raw)))?,
            None => Role::User,
        };
        let password_hash = match &payload.password {
            Some(plain) => Some(
                crate::utils::crypto::hash_password(plain)
                    .map_err(|e| Error::Internal(format!("password hashing failed: {}", e)))?,
            ),
            None => None,
        };
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, phone, city, role, password_hash, group_id,
                               is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(normalize::clean_text(&payload.name))
        .bind(&email)
        .bind(payload.phone.as_deref().map(normalize::normalize_phone))
        .bind(&payload.city)
        .bind(role.as_str())
        .bind(password_hash)
        .bind(payload.group_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid()).await
    }

    pub async fn update(&self, id: i64, payload: UpdateUserPayload) -> Result<User> {
        self.get_by_id(id).await?;
        if let Some(raw) = &payload.role {
            Role::parse(raw).ok_or_else(|| Error::BadRequest(format!("unknown role: {}", raw)))?;
        }
        sqlx::query(
            r#"
            UPDATE users SET
                name = COALESCE(?, name),
                phone = COALESCE(?, phone),
                city = COALESCE(?, city),
                linkedin_url = COALESCE(?, linkedin_url),
                github_url = COALESCE(?, github_url),
                portfolio_url = COALESCE(?, portfolio_url),
                resume_url = COALESCE(?, resume_url),
                role = COALESCE(?, role),
                group_id = COALESCE(?, group_id),
                is_active = COALESCE(?, is_active),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(payload.name.as_deref().map(normalize::clean_text))
        .bind(payload.phone.as_deref().map(normalize::normalize_phone))
        .bind(&payload.city)
        .bind(&payload.linkedin_url)
        .bind(&payload.github_url)
        .bind(&payload.portfolio_url)
        .bind(&payload.resume_url)
        .bind(payload.role.as_deref().map(str::to_lowercase))
        .bind(payload.group_id)
        .bind(payload.is_active)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM candidate_experience WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM candidate_education WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("user {} not found", id)));
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn list(&self, query: UserListQuery) -> Result<UserList> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1 = 1");
        let mut list_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM users WHERE 1 = 1");
        for qb in [&mut count_qb, &mut list_qb] {
            if let Some(role) = &query.role {
                qb.push(" AND role = ").push_bind(role.to_lowercase());
            }
            if let Some(search) = &query.search {
                let like = format!("%{}%", search);
                qb.push(" AND (name LIKE ")
                    .push_bind(like.clone())
                    .push(" OR email LIKE ")
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
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await?;

        Ok(UserList {
            items,
            total,
            page,
            per_page,
            total_pages: (total + per_page - 1) / per_page,
        })
    }

    pub async fn experience(&self, user_id: i64) -> Result<Vec<CandidateExperience>> {
        let rows = sqlx::query_as::<_, CandidateExperience>(
            "SELECT * FROM candidate_experience WHERE user_id = ? ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn education(&self, user_id: i64) -> Result<Vec<CandidateEducation>> {
        let rows = sqlx::query_as::<_, CandidateEducation>(
            "SELECT * FROM candidate_education WHERE user_id = ? ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Bulk ingestion of spreadsheet rows. Every cell goes through the
    /// normalization helpers; rows without a usable email are reported and
    /// skipped, existing emails are skipped silently.
    pub async fn import(&self, payload: ImportUsersPayload) -> Result<ImportReport> {
        let mut report = ImportReport {
            imported: 0,
            skipped: 0,
            errors: Vec::new(),
        };

        for (idx, raw_row) in payload.rows.iter().enumerate() {
            let mut row = std::collections::HashMap::new();
            for (header, value) in raw_row {
                row.insert(normalize::canonical_header(header), value.clone());
            }

            let email = row
                .get("email")
                .or_else(|| row.get("e_mail"))
                .or_else(|| row.get("e_mail_address"))
                .and_then(|v| normalize::non_empty(v))
                .map(|v| normalize::normalize_email(&v));
            let Some(email) = email else {
                report.errors.push(format!("row {}: missing email", idx + 1));
                report.skipped += 1;
                continue;
            };
            let name = row
                .get("name")
                .or_else(|| row.get("full_name"))
                .and_then(|v| normalize::non_empty(v))
                .unwrap_or_else(|| email.clone());

            if self.get_by_email(&email).await?.is_some() {
                report.skipped += 1;
                continue;
            }

            let now = Utc::now();
            sqlx::query(
                r#"
                INSERT INTO users (name, email, phone, city, role, is_active, created_at, updated_at)
                VALUES (?, ?, ?, ?, 'user', 1, ?, ?)
                "#,
            )
            .bind(&name)
            .bind(&email)
            .bind(
                row.get("phone")
                    .and_then(|v| normalize::non_empty(v))
                    .map(|v| normalize::normalize_phone(&v)),
            )
            .bind(row.get("city").and_then(|v| normalize::non_empty(v)))
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await?;
            report.imported += 1;
        }

        Ok(report)
    }
}

/// Find-or-create by email plus COALESCE profile update, inside the
/// caller's transaction. Returns the user id.
pub async fn upsert_candidate_tx(
    conn: &mut SqliteConnection,
    name: &str,
    email: &str,
    phone: Option<&str>,
    city: Option<&str>,
    linkedin_url: Option<&str>,
    github_url: Option<&str>,
    portfolio_url: Option<&str>,
) -> Result<i64> {
    let email = normalize::normalize_email(email);
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&mut *conn)
        .await?;

    let now = Utc::now();
    match existing {
        Some((id,)) => {
            sqlx::query(
                r#"
                UPDATE users SET
                    name = COALESCE(?, name),
                    phone = COALESCE(?, phone),
                    city = COALESCE(?, city),
                    linkedin_url = COALESCE(?, linkedin_url),
                    github_url = COALESCE(?, github_url),
                    portfolio_url = COALESCE(?, portfolio_url),
                    updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(normalize::non_empty(name))
            .bind(phone.map(normalize::normalize_phone))
            .bind(city)
            .bind(linkedin_url)
            .bind(github_url)
            .bind(portfolio_url)
            .bind(now)
            .bind(id)
            .execute(&mut *conn)
            .await?;
            Ok(id)
        }
        None => {
            let result = sqlx::query(
                r#"
                INSERT INTO users (name, email, phone, city, linkedin_url, github_url,
                                   portfolio_url, role, is_active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, 'candidate', 1, ?, ?)
                "#,
            )
            .bind(normalize::clean_text(name))
            .bind(&email)
            .bind(phone.map(normalize::normalize_phone))
            .bind(city)
            .bind(linkedin_url)
            .bind(github_url)
            .bind(portfolio_url)
            .bind(now)
            .bind(now)
            .execute(&mut *conn)
            .await?;
            Ok(result.last_insert_rowid())
        }
    }
}

/// Last write wins: the child rows are wholly owned by the most recent
/// profile write, so the old set is dropped and the new one inserted.
pub async fn replace_experience_tx(
    conn: &mut SqliteConnection,
    user_id: i64,
    entries: &[ExperienceEntry],
) -> Result<()> {
    sqlx::query("DELETE FROM candidate_experience WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    for entry in entries {
        sqlx::query(
            r#"
            INSERT INTO candidate_experience
                (user_id, title, company, start_date, end_date, is_current, description)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&entry.title)
        .bind(&entry.company)
        .bind(&entry.start_date)
        .bind(&entry.end_date)
        .bind(entry.is_current)
        .bind(&entry.description)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn replace_education_tx(
    conn: &mut SqliteConnection,
    user_id: i64,
    entries: &[EducationEntry],
) -> Result<()> {
    sqlx::query("DELETE FROM candidate_education WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    for entry in entries {
        sqlx::query(
            r#"
            INSERT INTO candidate_education
                (user_id, degree, field_of_study, institution, start_year, end_year)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&entry.degree)
        .bind(&entry.field_of_study)
        .bind(&entry.institution)
        .bind(entry.start_year)
        .bind(entry.end_year)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
