use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateExperience {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub company: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub is_current: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateEducation {
    pub id: i64,
    pub user_id: i64,
    pub degree: String,
    pub field_of_study: Option<String>,
    pub institution: Option<String>,
    pub start_year: Option<i64>,
    pub end_year: Option<i64>,
}
