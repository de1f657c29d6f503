use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user_group::{PermissionMap, UserGroup};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGroupPayload {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub permissions: PermissionMap,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateGroupPayload {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub permissions: Option<PermissionMap>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupResponse {
    pub id: i64,
    pub name: String,
    pub permissions: PermissionMap,
}

impl From<UserGroup> for GroupResponse {
    fn from(group: UserGroup) -> Self {
        let permissions = group.permission_map();
        GroupResponse {
            id: group.id,
            name: group.name,
            permissions,
        }
    }
}
