use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::message_dto::{SendMessagePayload, UnreadCountResponse},
    error::Result,
    middleware::auth::AuthContext,
    models::user_group::{Action, Module},
    AppState,
};

#[axum::debug_handler]
pub async fn send_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Messages, Action::New)?;
    payload.validate()?;
    let message = state.message_service.send(ctx.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[axum::debug_handler]
pub async fn get_thread(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(other_id): Path<i64>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Messages, Action::View)?;
    let messages = state.message_service.thread(ctx.user_id, other_id).await?;
    Ok(Json(messages))
}

#[axum::debug_handler]
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse> {
    let unread = state.message_service.unread_count(ctx.user_id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}
