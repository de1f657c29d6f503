use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::application_dto::{
        ApplicationDetailResponse, ApplicationListQuery, ApplicationListResponse, ApplyPayload,
        PanelPayload, StatusUpdatePayload,
    },
    error::{Error, Result},
    middleware::auth::AuthContext,
    models::application::ApplicationStatus,
    models::user_group::{Action, Module},
    AppState,
};

/// JSON-only application form (no résumé attached).
#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    Json(payload): Json<ApplyPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let application = state.application_service.apply(payload, None).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// Multipart variant: a `payload` part carrying the JSON form plus an
/// optional `resume` file part. The file is stored before the pipeline runs
/// so the application row can reference it.
#[axum::debug_handler]
pub async fn apply_with_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut payload: Option<ApplyPayload> = None;
    let mut resume: Option<(String, bytes::Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        let part = field.name().map(str::to_string);
        match part.as_deref() {
            Some("payload") => {
                let raw = field.text().await?;
                payload = Some(serde_json::from_str(&raw)?);
            }
            Some("resume") => {
                let name = field
                    .file_name()
                    .unwrap_or("resume.pdf")
                    .to_string();
                let bytes = field.bytes().await?;
                resume = Some((name, bytes));
            }
            _ => {}
        }
    }

    let payload = payload
        .ok_or_else(|| Error::BadRequest("missing payload part".to_string()))?;
    payload.validate()?;

    let resume_path = match resume {
        Some((name, bytes)) => {
            let stored = state.upload_service.store("resumes", &name, bytes).await?;
            Some(stored.url)
        }
        None => None,
    };

    let application = state.application_service.apply(payload, resume_path).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Applications, Action::View)?;
    let result = state.application_service.list(query).await?;
    Ok(Json(ApplicationListResponse {
        items: result.items,
        total: result.total,
        page: result.page,
        per_page: result.per_page,
        total_pages: result.total_pages,
    }))
}

#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Applications, Action::View)?;
    let application = state.application_service.get(id).await?;
    let events = state.application_service.events(id).await?;
    let panel = state.application_service.panel(id).await?;
    Ok(Json(ApplicationDetailResponse {
        application,
        events,
        panel,
    }))
}

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdatePayload>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Applications, Action::Edit)?;
    payload.validate()?;
    let to = ApplicationStatus::parse(&payload.status)
        .ok_or_else(|| Error::BadRequest(format!("unknown status: {}", payload.status)))?;
    let application = state
        .application_service
        .transition(id, to, Some(ctx.user_id), payload.note)
        .await?;
    Ok(Json(application))
}

/// Candidates withdraw their own applications; no module permission, just
/// ownership.
#[axum::debug_handler]
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let application = state.application_service.withdraw(id, ctx.user_id).await?;
    Ok(Json(application))
}

#[axum::debug_handler]
pub async fn list_panel(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Applications, Action::View)?;
    let panel = state.application_service.panel(id).await?;
    Ok(Json(panel))
}

#[axum::debug_handler]
pub async fn add_panelist(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(payload): Json<PanelPayload>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Applications, Action::Edit)?;
    let panelist = state.application_service.add_panelist(id, payload).await?;
    Ok((StatusCode::CREATED, Json(panelist)))
}

#[axum::debug_handler]
pub async fn remove_panelist(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Applications, Action::Edit)?;
    state.application_service.remove_panelist(id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
