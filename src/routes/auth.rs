use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::auth_dto::{LoginPayload, LoginResponse},
    error::{Error, Result},
    middleware::auth::{issue_token, AuthContext},
    models::user::Role,
    AppState,
};

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let user = state
        .user_service
        .get_by_email(&payload.email)
        .await?
        .ok_or_else(|| Error::Unauthorized("invalid email or password".to_string()))?;
    if !user.is_active {
        return Err(Error::Unauthorized("account is disabled".to_string()));
    }
    let Some(hash) = &user.password_hash else {
        return Err(Error::Unauthorized("invalid email or password".to_string()));
    };
    let ok = crate::utils::crypto::verify_password(&payload.password, hash)
        .map_err(|e| Error::Internal(format!("password verification failed: {}", e)))?;
    if !ok {
        return Err(Error::Unauthorized("invalid email or password".to_string()));
    }

    let role = Role::parse(&user.role).unwrap_or(Role::User);
    let perms = state
        .user_group_service
        .permissions_for(user.group_id)
        .await?;
    let token = issue_token(user.id, role, perms)?;

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        name: user.name,
        role: user.role,
    }))
}

/// Who the presented token belongs to.
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.get_by_id(ctx.user_id).await?;
    Ok(Json(user))
}
