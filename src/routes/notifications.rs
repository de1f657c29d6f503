use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};

use crate::{error::Result, middleware::auth::AuthContext, AppState};

#[axum::debug_handler]
pub async fn poll(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse> {
    let notifications = state.notification_service.poll(ctx.user_id).await?;
    Ok(Json(notifications))
}

#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.notification_service.mark_read(id, ctx.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
