use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    dto::job_dto::{CreateJobPayload, JobListQuery, JobListResponse, UpdateJobPayload},
    error::Result,
    middleware::auth::AuthContext,
    models::user_group::{Action, Module},
    AppState,
};

#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Jobs, Action::New)?;
    payload.validate()?;
    let job = state.job_service.create(payload, ctx.user_id).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateJobPayload>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Jobs, Action::Edit)?;
    payload.validate()?;
    let job = state.job_service.update(id, payload).await?;
    Ok(Json(job))
}

#[axum::debug_handler]
pub async fn delete_job(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Jobs, Action::Delete)?;
    state.job_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Jobs, Action::View)?;
    let job = state.job_service.get_by_id(id).await?;
    Ok(Json(job))
}

#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<JobListQuery>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Jobs, Action::View)?;
    let result = state.job_service.list(query).await?;
    Ok(Json(JobListResponse {
        items: result.items,
        total: result.total,
        page: result.page,
        per_page: result.per_page,
        total_pages: result.total_pages,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PublicJobsQuery {
    pub limit: Option<i64>,
}

#[axum::debug_handler]
pub async fn list_public_jobs(
    State(state): State<AppState>,
    Query(query): Query<PublicJobsQuery>,
) -> Result<impl IntoResponse> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let jobs = state.job_service.list_active(limit).await?;
    Ok(Json(jobs))
}

/// Candidate-facing job page; only active postings resolve.
#[axum::debug_handler]
pub async fn get_public_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let job = state.job_service.get_by_id(id).await?;
    if job.status != "active" {
        return Err(crate::error::Error::NotFound(format!(
            "job {} not found",
            id
        )));
    }
    Ok(Json(job))
}
