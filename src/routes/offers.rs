use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::offer_dto::{GenerateLetterPayload, LetterResponse},
    error::{Error, Result},
    middleware::auth::AuthContext,
    models::user_group::{Action, Module},
    AppState,
};

/// Render a letter template for an application, attach the file to the
/// application record and, for offer letters, move it to offered.
#[axum::debug_handler]
pub async fn generate_letter(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<GenerateLetterPayload>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Offers, Action::New)?;
    payload.validate()?;

    let application_id = payload.application_id;
    let (stored, appointment) = state.document_service.generate(payload).await?;
    let application = state
        .application_service
        .attach_letter(application_id, appointment, &stored.url, Some(ctx.user_id))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LetterResponse {
            application_id,
            letter_url: stored.url,
            status: application.status,
        }),
    ))
}

/// Upload mode: store a caller-provided letter as-is, no templating. A
/// `kind` part of `appointment` files it under the appointment column.
#[axum::debug_handler]
pub async fn upload_letter(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Offers, Action::New)?;

    let mut appointment = false;
    let mut file: Option<(String, bytes::Bytes)> = None;
    while let Some(field) = multipart.next_field().await? {
        let part = field.name().map(str::to_string);
        match part.as_deref() {
            Some("kind") => {
                appointment = field.text().await? == "appointment";
            }
            Some("file") => {
                let name = field.file_name().unwrap_or("letter.docx").to_string();
                file = Some((name, field.bytes().await?));
            }
            _ => {}
        }
    }
    let (name, bytes) =
        file.ok_or_else(|| Error::BadRequest("missing file part".to_string()))?;

    let stored = state.upload_service.store("letters", &name, bytes).await?;
    let application = state
        .application_service
        .attach_letter(id, appointment, &stored.url, Some(ctx.user_id))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LetterResponse {
            application_id: id,
            letter_url: stored.url,
            status: application.status,
        }),
    ))
}
