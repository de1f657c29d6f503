use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::models::user::Role;
use crate::models::user_group::{Action, Module, PermissionMap};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: String,
    pub perms: PermissionMap,
    pub exp: usize,
}

/// Authorization context passed explicitly to every protected handler.
/// Superadmin bypasses the permission matrix; everyone else is checked
/// against the per-module action flags resolved at login time.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: Role,
    pub perms: PermissionMap,
}

impl AuthContext {
    pub fn require(&self, module: Module, action: Action) -> Result<()> {
        if self.role == Role::Superadmin {
            return Ok(());
        }
        if self.perms.allows(module, action) {
            return Ok(());
        }
        Err(Error::Forbidden(format!(
            "missing {} permission on {}",
            action.as_str(),
            module.as_str()
        )))
    }
}

impl From<&Claims> for AuthContext {
    fn from(claims: &Claims) -> Self {
        AuthContext {
            user_id: claims.sub,
            role: Role::parse(&claims.role).unwrap_or(Role::Candidate),
            perms: claims.perms.clone(),
        }
    }
}

pub fn issue_token(user_id: i64, role: Role, perms: PermissionMap) -> Result<String> {
    let config = crate::config::get_config();
    let exp = chrono::Utc::now() + chrono::Duration::hours(12);
    let claims = Claims {
        sub: user_id,
        role: role.as_str().to_string(),
        perms,
        exp: exp.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| Error::Unauthorized(format!("token issue failed: {}", e)))
}

pub async fn require_bearer_auth(mut req: Request, next: Next) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"missing_authorization"})),
        )
            .into_response();
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"bad_authorization"})),
        )
            .into_response();
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"unsupported_scheme"})),
        )
            .into_response();
    };

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => {
            let ctx = AuthContext::from(&data.claims);
            req.extensions_mut().insert(data.claims);
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"invalid_token"})),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user_group::ModulePermissions;

    fn ctx(role: Role, perms: PermissionMap) -> AuthContext {
        AuthContext {
            user_id: 1,
            role,
            perms,
        }
    }

    #[test]
    fn superadmin_bypasses_matrix() {
        let c = ctx(Role::Superadmin, PermissionMap::default());
        assert!(c.require(Module::UserGroups, Action::Delete).is_ok());
    }

    #[test]
    fn missing_permission_is_forbidden() {
        let c = ctx(Role::User, PermissionMap::default());
        let err = c.require(Module::Blogs, Action::Edit).unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[test]
    fn granted_permission_passes() {
        let mut perms = PermissionMap::default();
        perms.grant(
            Module::Blogs,
            ModulePermissions {
                edit: true,
                ..Default::default()
            },
        );
        let c = ctx(Role::User, perms);
        assert!(c.require(Module::Blogs, Action::Edit).is_ok());
        assert!(c.require(Module::Blogs, Action::Delete).is_err());
    }
}
