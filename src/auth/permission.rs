use super::roles::{resolve_role, SUPER_ADMIN};
use crate::db::Store;
use crate::error::{CmsError, CmsResult};
use crate::model::{Action, NamedGrants, Resource, Role, RolePermissions, SafeUser};

fn list_allows(actions: &[Action], action: Action) -> bool {
    actions.contains(&action) || actions.contains(&Action::Manage)
}

fn named_allows(grants: &NamedGrants, action: Action, name: Option<&str>) -> bool {
    let specific = name
        .and_then(|n| grants.get(n))
        .map(|actions| list_allows(actions, action))
        .unwrap_or(false);
    specific
        || grants
            .get("*")
            .map(|actions| list_allows(actions, action))
            .unwrap_or(false)
}

/// Whether `permissions` grant `action` on `resource`. For collections and
/// singletons, `name` is checked first and then the `*` wildcard.
pub fn permissions_allow(
    permissions: &RolePermissions,
    resource: Resource,
    action: Action,
    name: Option<&str>,
) -> bool {
    let flat = |list: &Option<Vec<Action>>| {
        list.as_deref()
            .map(|actions| list_allows(actions, action))
            .unwrap_or(false)
    };
    match resource {
        Resource::Collections => permissions
            .collections
            .as_ref()
            .map(|g| named_allows(g, action, name))
            .unwrap_or(false),
        Resource::Singletons => permissions
            .singletons
            .as_ref()
            .map(|g| named_allows(g, action, name))
            .unwrap_or(false),
        Resource::Media => flat(&permissions.media),
        Resource::Users => flat(&permissions.users),
        Resource::Roles => flat(&permissions.roles),
        Resource::Settings => flat(&permissions.settings),
    }
}

pub fn role_allows(role: &Role, resource: Resource, action: Action, name: Option<&str>) -> bool {
    role.name == SUPER_ADMIN || permissions_allow(&role.permissions, resource, action, name)
}

/// Fails with `Forbidden` unless the user's role grants the action. Users
/// whose role cannot be resolved are denied.
pub async fn require_permission(
    store: &dyn Store,
    user: &SafeUser,
    resource: Resource,
    action: Action,
    name: Option<&str>,
) -> CmsResult<()> {
    let role = resolve_role(store, user.role_id.as_deref(), &user.role).await?;
    match role {
        Some(role) if role_allows(&role, resource, action, name) => Ok(()),
        Some(role) => {
            log::debug!(
                "{} ({}) denied {} on {}{}",
                user.username,
                role.name,
                action,
                resource,
                name.map(|n| format!(" {}", n)).unwrap_or_default()
            );
            Err(CmsError::Forbidden)
        }
        None => {
            log::warn!("{} has no resolvable role", user.username);
            Err(CmsError::Forbidden)
        }
    }
}

pub async fn is_super_admin(store: &dyn Store, user: &SafeUser) -> CmsResult<bool> {
    Ok(resolve_role(store, user.role_id.as_deref(), &user.role)
        .await?
        .map(|role| role.name == SUPER_ADMIN)
        .unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn permissions(value: serde_json::Value) -> RolePermissions {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_wildcard_grants_every_collection() {
        let p = permissions(json!({ "collections": { "*": ["read"] } }));
        assert!(permissions_allow(&p, Resource::Collections, Action::Read, Some("posts")));
        assert!(permissions_allow(&p, Resource::Collections, Action::Read, Some("pages")));
        assert!(!permissions_allow(&p, Resource::Collections, Action::Update, Some("posts")));
    }

    #[test]
    fn test_named_grant_adds_to_wildcard() {
        let p = permissions(json!({ "collections": { "*": ["read"], "posts": ["update"] } }));
        assert!(permissions_allow(&p, Resource::Collections, Action::Update, Some("posts")));
        assert!(permissions_allow(&p, Resource::Collections, Action::Read, Some("posts")));
        assert!(!permissions_allow(&p, Resource::Collections, Action::Update, Some("pages")));
    }

    #[test]
    fn test_manage_implies_everything() {
        let p = permissions(json!({ "media": ["manage"] }));
        for action in [Action::Create, Action::Read, Action::Update, Action::Delete, Action::Publish] {
            assert!(permissions_allow(&p, Resource::Media, action, None));
        }
    }

    #[test]
    fn test_absent_section_denies() {
        let p = permissions(json!({ "media": ["read"] }));
        assert!(!permissions_allow(&p, Resource::Users, Action::Read, None));
        assert!(!permissions_allow(&p, Resource::Singletons, Action::Read, Some("home")));
    }
}
