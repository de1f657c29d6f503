use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateLetterPayload {
    pub application_id: i64,
    /// Template selector: "locum", "full_time" or "appointment".
    #[validate(length(min = 1))]
    pub template: String,
    #[serde(default)]
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LetterResponse {
    pub application_id: i64,
    pub letter_url: String,
    pub status: String,
}
