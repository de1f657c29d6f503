use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::user_group_dto::{CreateGroupPayload, GroupResponse, UpdateGroupPayload},
    error::Result,
    middleware::auth::AuthContext,
    models::user_group::{Action, Module},
    AppState,
};

#[axum::debug_handler]
pub async fn create_group(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<CreateGroupPayload>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::UserGroups, Action::New)?;
    payload.validate()?;
    let group = state.user_group_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(GroupResponse::from(group))))
}

#[axum::debug_handler]
pub async fn update_group(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateGroupPayload>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::UserGroups, Action::Edit)?;
    payload.validate()?;
    let group = state.user_group_service.update(id, payload).await?;
    Ok(Json(GroupResponse::from(group)))
}

#[axum::debug_handler]
pub async fn delete_group(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::UserGroups, Action::Delete)?;
    state.user_group_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn get_group(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::UserGroups, Action::View)?;
    let group = state.user_group_service.get_by_id(id).await?;
    Ok(Json(GroupResponse::from(group)))
}

#[axum::debug_handler]
pub async fn list_groups(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::UserGroups, Action::View)?;
    let groups = state.user_group_service.list().await?;
    let groups: Vec<GroupResponse> = groups.into_iter().map(GroupResponse::from).collect();
    Ok(Json(groups))
}
