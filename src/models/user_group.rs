use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserGroup {
    pub id: i64,
    pub name: String,
    /// JSON-serialized [`PermissionMap`].
    pub permissions: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserGroup {
    pub fn permission_map(&self) -> PermissionMap {
        serde_json::from_str(&self.permissions).unwrap_or_default()
    }
}

/// API surfaces gated by the permission matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    Jobs,
    Applications,
    Users,
    UserGroups,
    Messages,
    Offers,
    Blogs,
    Careers,
    Consultants,
    Sliders,
    Publications,
    ManagementTeam,
    HrTraining,
    Testimonials,
}

impl Module {
    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Jobs => "jobs",
            Module::Applications => "applications",
            Module::Users => "users",
            Module::UserGroups => "user_groups",
            Module::Messages => "messages",
            Module::Offers => "offers",
            Module::Blogs => "blogs",
            Module::Careers => "careers",
            Module::Consultants => "consultants",
            Module::Sliders => "sliders",
            Module::Publications => "publications",
            Module::ManagementTeam => "management_team",
            Module::HrTraining => "hr_training",
            Module::Testimonials => "testimonials",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    New,
    Edit,
    Delete,
    Export,
    Import,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::New => "new",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Export => "export",
            Action::Import => "import",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModulePermissions {
    #[serde(default)]
    pub view: bool,
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub edit: bool,
    #[serde(default)]
    pub delete: bool,
    #[serde(default)]
    pub export: bool,
    #[serde(default)]
    pub import: bool,
}

impl ModulePermissions {
    pub fn all() -> Self {
        Self {
            view: true,
            new: true,
            edit: true,
            delete: true,
            export: true,
            import: true,
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.view,
            Action::New => self.new,
            Action::Edit => self.edit,
            Action::Delete => self.delete,
            Action::Export => self.export,
            Action::Import => self.import,
        }
    }
}

/// Per-module action flags carried in the JWT claims. Unlisted modules
/// deny everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionMap(pub HashMap<String, ModulePermissions>);

impl PermissionMap {
    pub fn allows(&self, module: Module, action: Action) -> bool {
        self.0
            .get(module.as_str())
            .map(|p| p.allows(action))
            .unwrap_or(false)
    }

    pub fn grant(&mut self, module: Module, perms: ModulePermissions) {
        self.0.insert(module.as_str().to_string(), perms);
    }

    pub fn full() -> Self {
        let mut map = PermissionMap::default();
        for module in [
            Module::Jobs,
            Module::Applications,
            Module::Users,
            Module::UserGroups,
            Module::Messages,
            Module::Offers,
            Module::Blogs,
            Module::Careers,
            Module::Consultants,
            Module::Sliders,
            Module::Publications,
            Module::ManagementTeam,
            Module::HrTraining,
            Module::Testimonials,
        ] {
            map.grant(module, ModulePermissions::all());
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlisted_module_denies() {
        let map = PermissionMap::default();
        assert!(!map.allows(Module::Jobs, Action::View));
    }

    #[test]
    fn partial_grant_only_allows_named_actions() {
        let mut map = PermissionMap::default();
        map.grant(
            Module::Blogs,
            ModulePermissions {
                view: true,
                edit: true,
                ..Default::default()
            },
        );
        assert!(map.allows(Module::Blogs, Action::View));
        assert!(map.allows(Module::Blogs, Action::Edit));
        assert!(!map.allows(Module::Blogs, Action::Delete));
        assert!(!map.allows(Module::Sliders, Action::View));
    }

    #[test]
    fn survives_json_round_trip_with_missing_flags() {
        let json = r#"{"jobs":{"view":true,"new":true}}"#;
        let map: PermissionMap = serde_json::from_str(json).unwrap();
        assert!(map.allows(Module::Jobs, Action::New));
        assert!(!map.allows(Module::Jobs, Action::Delete));
    }
}
