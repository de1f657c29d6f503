use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension,
};

use crate::{
    error::Result,
    middleware::auth::AuthContext,
    models::user_group::{Action, Module},
    AppState,
};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn xlsx_response(prefix: &str, buffer: Vec<u8>) -> impl IntoResponse {
    let filename = format!("{}_{}.xlsx", prefix, chrono::Utc::now().format("%Y%m%d"));
    let disposition = format!("attachment; filename=\"{}\"", filename);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    )
}

#[axum::debug_handler]
pub async fn export_applications(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Applications, Action::Export)?;
    let buffer = state.export_service.applications_xlsx().await?;
    Ok(xlsx_response("applications", buffer))
}

#[axum::debug_handler]
pub async fn export_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse> {
    ctx.require(Module::Users, Action::Export)?;
    let buffer = state.export_service.users_xlsx().await?;
    Ok(xlsx_response("users", buffer))
}
