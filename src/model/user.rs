use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Stored user row, including the password hash. Never serialized directly;
/// use [`SafeUser`] for responses.
#[derive(Clone, Debug, PartialEq)]
pub struct CmsUser {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub locale: Option<String>,
    /// Legacy role name, kept as a shadow of `role_id`.
    pub role: String,
    pub role_id: Option<String>,
    pub active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user without credentials.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeUser {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub locale: Option<String>,
    pub role: String,
    pub role_id: Option<String>,
    pub active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CmsUser> for SafeUser {
    fn from(user: CmsUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            name: user.name,
            avatar: user.avatar,
            locale: user.locale,
            role: user.role,
            role_id: user.role_id,
            active: user.active,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Publish,
    /// Implies every other action.
    Manage,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Publish => "publish",
            Action::Manage => "manage",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Action::Create),
            "read" => Ok(Action::Read),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "publish" => Ok(Action::Publish),
            "manage" => Ok(Action::Manage),
            other => Err(format!("unknown action `{}`", other)),
        }
    }
}

/// Resource families a role grants actions on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Collections,
    Singletons,
    Media,
    Users,
    Roles,
    Settings,
}

impl Resource {
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Collections => "collections",
            Resource::Singletons => "singletons",
            Resource::Media => "media",
            Resource::Users => "users",
            Resource::Roles => "roles",
            Resource::Settings => "settings",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-name grants. The key `*` applies to every name.
pub type NamedGrants = BTreeMap<String, Vec<Action>>;

/// Everything a role may do. Absent sections grant nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections: Option<NamedGrants>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singletons: Option<NamedGrants>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<Action>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<Action>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Action>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Vec<Action>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub permissions: RolePermissions,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Key/value row; `value` is serialized JSON.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_permissions_deserialize_with_wildcards() {
        let permissions: RolePermissions = serde_json::from_value(json!({
            "collections": { "*": ["read"], "posts": ["create", "update"] },
            "media": ["read", "manage"]
        }))
        .unwrap();

        let collections = permissions.collections.unwrap();
        assert_eq!(collections["*"], vec![Action::Read]);
        assert_eq!(permissions.media.unwrap(), vec![Action::Read, Action::Manage]);
        assert!(permissions.users.is_none());
    }

    #[test]
    fn test_safe_user_serialization_has_no_hash() {
        let now = Utc::now();
        let user = CmsUser {
            id: "u1".into(),
            username: "ed".into(),
            password_hash: "$argon2id$secret".into(),
            email: None,
            name: None,
            avatar: None,
            locale: Some("en".into()),
            role: "editor".into(),
            role_id: None,
            active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(SafeUser::from(user)).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["username"], json!("ed"));
        assert_eq!(value["roleId"], Value::Null);
    }
}
