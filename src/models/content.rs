use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::user_group::Module;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentItem {
    pub id: i64,
    pub kind: String,
    pub title: String,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub extra: Option<String>,
    pub published: bool,
    pub sort_order: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// The hospital-content collections. Each kind keeps its own URL prefix and
/// permission module but shares one table and one CRUD service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Blog,
    CareerPage,
    Consultant,
    Slider,
    Publication,
    ManagementTeam,
    HrTraining,
    Testimonial,
}

impl ContentKind {
    pub const ALL: [ContentKind; 8] = [
        ContentKind::Blog,
        ContentKind::CareerPage,
        ContentKind::Consultant,
        ContentKind::Slider,
        ContentKind::Publication,
        ContentKind::ManagementTeam,
        ContentKind::HrTraining,
        ContentKind::Testimonial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Blog => "blog",
            ContentKind::CareerPage => "career_page",
            ContentKind::Consultant => "consultant",
            ContentKind::Slider => "slider",
            ContentKind::Publication => "publication",
            ContentKind::ManagementTeam => "management_team",
            ContentKind::HrTraining => "hr_training",
            ContentKind::Testimonial => "testimonial",
        }
    }

    /// URL segment under /api, matching the original route names.
    pub fn route_segment(&self) -> &'static str {
        match self {
            ContentKind::Blog => "blogs",
            ContentKind::CareerPage => "careers",
            ContentKind::Consultant => "consultants",
            ContentKind::Slider => "sliders",
            ContentKind::Publication => "publications",
            ContentKind::ManagementTeam => "management-team",
            ContentKind::HrTraining => "hr-training",
            ContentKind::Testimonial => "testimonials",
        }
    }

    pub fn module(&self) -> Module {
        match self {
            ContentKind::Blog => Module::Blogs,
            ContentKind::CareerPage => Module::Careers,
            ContentKind::Consultant => Module::Consultants,
            ContentKind::Slider => Module::Sliders,
            ContentKind::Publication => Module::Publications,
            ContentKind::ManagementTeam => Module::ManagementTeam,
            ContentKind::HrTraining => Module::HrTraining,
            ContentKind::Testimonial => Module::Testimonials,
        }
    }
}
