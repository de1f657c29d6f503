use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub description: Option<String>,
    pub qualifications: Option<String>,
    pub experience_level: Option<String>,
    pub status: String,
    pub created_by: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Draft,
    Active,
    Inactive,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Active => "active",
            JobStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<JobStatus> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Some(JobStatus::Draft),
            "active" => Some(JobStatus::Active),
            "inactive" => Some(JobStatus::Inactive),
            _ => None,
        }
    }
}
