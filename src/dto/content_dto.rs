use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

use crate::models::content::ContentItem;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateContentPayload {
    #[validate(length(min = 1))]
    pub title: String,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub extra: Option<JsonValue>,
    pub published: Option<bool>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateContentPayload {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub extra: Option<JsonValue>,
    pub published: Option<bool>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentListQuery {
    pub published: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentListResponse {
    pub items: Vec<ContentItem>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}
