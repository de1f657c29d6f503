use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use validator::Validate;

use crate::{
    dto::user_dto::{
        CreateUserPayload, ImportUsersPayload, UpdateUserPayload, UserListQuery, UserListResponse,
    },
    error::Result,
    middleware::auth::AuthContext,
    models::user_group::{Action, Module},
    AppState,
};

#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Users, Action::New)?;
    payload.validate()?;
    let user = state.user_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Users, Action::Edit)?;
    payload.validate()?;
    let user = state.user_service.update(id, payload).await?;
    Ok(Json(user))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Users, Action::Delete)?;
    state.user_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Users, Action::View)?;
    let user = state.user_service.get_by_id(id).await?;
    Ok(Json(user))
}

/// User plus the candidate profile rows that hang off it.
#[axum::debug_handler]
pub async fn get_user_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Users, Action::View)?;
    let user = state.user_service.get_by_id(id).await?;
    let experience = state.user_service.experience(id).await?;
    let education = state.user_service.education(id).await?;
    Ok(Json(json!({
        "user": user,
        "experience": experience,
        "education": education,
    })))
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<UserListQuery>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Users, Action::View)?;
    let result = state.user_service.list(query).await?;
    Ok(Json(UserListResponse {
        items: result.items,
        total: result.total,
        page: result.page,
        per_page: result.per_page,
        total_pages: result.total_pages,
    }))
}

#[axum::debug_handler]
pub async fn import_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<ImportUsersPayload>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Users, Action::Import)?;
    let report = state.user_service.import(payload).await?;
    Ok(Json(report))
}
