use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Json},
};

use crate::{
    error::{Error, Result},
    AppState,
};

/// Parse an uploaded résumé into the structured profile used to prefill
/// the application form. Public: candidates use it before they have any
/// account.
#[axum::debug_handler]
pub async fn parse_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("resume.pdf").to_string();
        let bytes = field.bytes().await?;
        let profile = state.resume_service.parse(&bytes, &name).await?;
        return Ok(Json(profile));
    }
    Err(Error::BadRequest("missing file part".to_string()))
}
