use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::application::{ApplicationEvent, InterviewPanelist, JobApplication};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExperienceEntry {
    pub title: String,
    pub company: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_current: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EducationEntry {
    pub degree: String,
    pub field_of_study: Option<String>,
    pub institution: Option<String>,
    pub start_year: Option<i64>,
    pub end_year: Option<i64>,
}

/// Structured application form. The résumé file, when present, travels as a
/// sibling multipart field and is stored before this payload is processed.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApplyPayload {
    pub job_id: i64,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StatusUpdatePayload {
    #[validate(length(min = 1))]
    pub status: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PanelPayload {
    pub user_id: i64,
    pub panel_role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationListQuery {
    pub job_id: Option<i64>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationListResponse {
    pub items: Vec<JobApplication>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDetailResponse {
    pub application: JobApplication,
    pub events: Vec<ApplicationEvent>,
    pub panel: Vec<InterviewPanelist>,
}
