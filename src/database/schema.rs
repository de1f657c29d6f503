//! Versioned schema management.
//!
//! The whole schema is applied at startup as an ordered list of numbered
//! steps; the last applied step is recorded in `schema_version`. Re-running
//! is a no-op, and a database created by an older build is upgraded in place.

use crate::error::Result;
use sqlx::SqlitePool;
use tracing::info;

const SCHEMA_VERSION: i64 = 3;

pub async fn init(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
    )
    .execute(pool)
    .await?;

    let current = current_version(pool).await?;
    if current >= SCHEMA_VERSION {
        return Ok(());
    }

    if current < 1 {
        apply_v1(pool).await?;
        set_version(pool, 1).await?;
        info!(version = 1, "applied schema step");
    }
    if current < 2 {
        apply_v2(pool).await?;
        set_version(pool, 2).await?;
        info!(version = 2, "applied schema step");
    }
    if current < 3 {
        apply_v3(pool).await?;
        set_version(pool, 3).await?;
        info!(version = 3, "applied schema step");
    }

    Ok(())
}

pub async fn current_version(pool: &SqlitePool) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version LIMIT 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.0).unwrap_or(0))
}

async fn set_version(pool: &SqlitePool, version: i64) -> Result<()> {
    sqlx::query("DELETE FROM schema_version").execute(pool).await?;
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Upgrade a database only up to `target`. Test hook for the in-place
/// upgrade property; production code always runs the full `init`.
pub async fn init_up_to(pool: &SqlitePool, target: i64) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
    )
    .execute(pool)
    .await?;
    let current = current_version(pool).await?;
    if current < 1 && target >= 1 {
        apply_v1(pool).await?;
        set_version(pool, 1).await?;
    }
    if current < 2 && target >= 2 {
        apply_v2(pool).await?;
        set_version(pool, 2).await?;
    }
    if current < 3 && target >= 3 {
        apply_v3(pool).await?;
        set_version(pool, 3).await?;
    }
    Ok(())
}

async fn apply_v1(pool: &SqlitePool) -> Result<()> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            phone TEXT,
            city TEXT,
            linkedin_url TEXT,
            github_url TEXT,
            portfolio_url TEXT,
            resume_url TEXT,
            role TEXT NOT NULL DEFAULT 'candidate',
            password_hash TEXT,
            group_id INTEGER,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS user_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            permissions TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            department TEXT,
            location TEXT,
            employment_type TEXT,
            salary_min REAL,
            salary_max REAL,
            description TEXT,
            qualifications TEXT,
            experience_level TEXT,
            status TEXT NOT NULL DEFAULT 'draft',
            created_by INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS job_applications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'new',
            score REAL NOT NULL DEFAULT 0,
            resume_path TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS candidate_experience (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            company TEXT,
            start_date TEXT,
            end_date TEXT,
            is_current INTEGER NOT NULL DEFAULT 0,
            description TEXT
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS candidate_education (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            degree TEXT NOT NULL,
            field_of_study TEXT,
            institution TEXT,
            start_year INTEGER,
            end_year INTEGER
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS interview_panel (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            application_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            panel_role TEXT,
            created_at TEXT NOT NULL,
            UNIQUE (application_id, user_id)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS application_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            application_id INTEGER NOT NULL,
            actor_id INTEGER,
            from_status TEXT,
            to_status TEXT NOT NULL,
            note TEXT,
            created_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            body TEXT,
            link TEXT,
            is_read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id INTEGER NOT NULL,
            recipient_id INTEGER NOT NULL,
            application_id INTEGER,
            body TEXT NOT NULL,
            read_at TEXT,
            created_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS content_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL,
            title TEXT NOT NULL,
            slug TEXT,
            body TEXT,
            image_url TEXT,
            author TEXT,
            extra TEXT,
            published INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        "CREATE INDEX IF NOT EXISTS idx_applications_job ON job_applications (job_id)",
        "CREATE INDEX IF NOT EXISTS idx_applications_user ON job_applications (user_id)",
        "CREATE INDEX IF NOT EXISTS idx_experience_user ON candidate_experience (user_id)",
        "CREATE INDEX IF NOT EXISTS idx_education_user ON candidate_education (user_id)",
        "CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications (user_id, is_read)",
        "CREATE INDEX IF NOT EXISTS idx_messages_recipient ON messages (recipient_id, read_at)",
        "CREATE INDEX IF NOT EXISTS idx_events_application ON application_events (application_id)",
        "CREATE INDEX IF NOT EXISTS idx_content_kind ON content_items (kind)",
        // One live application per candidate, enforced below the
        // read-then-write check in the apply transaction.
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_one_active_application
        ON job_applications (user_id)
        WHERE status NOT IN ('rejected', 'withdrawn', 'hired')
        "#,
    ];

    for stmt in statements {
        sqlx::query(stmt).execute(pool).await?;
    }
    Ok(())
}

// Offer and appointment letter URLs landed after the first release.
async fn apply_v2(pool: &SqlitePool) -> Result<()> {
    sqlx::query("ALTER TABLE job_applications ADD COLUMN offer_letter_url TEXT")
        .execute(pool)
        .await?;
    sqlx::query("ALTER TABLE job_applications ADD COLUMN appointment_letter_url TEXT")
        .execute(pool)
        .await?;
    Ok(())
}

// Slider ordering.
async fn apply_v3(pool: &SqlitePool) -> Result<()> {
    sqlx::query("ALTER TABLE content_items ADD COLUMN sort_order INTEGER NOT NULL DEFAULT 0")
        .execute(pool)
        .await?;
    Ok(())
}
