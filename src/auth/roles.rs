//! Built-in roles, first-run seeding and the legacy role column.
//!
//! Users created before roles existed only carry the `role` string
//! (`admin` or `editor`). `role_id` is authoritative when set; otherwise the
//! legacy name is looked up as a role name.

use super::password::{hash_password, validate_password_strength};
use crate::db::Store;
use crate::error::{CmsError, CmsResult};
use crate::model::{Action, CmsUser, NamedGrants, Role, RolePermissions};
use chrono::Utc;
use uuid::Uuid;

pub const SUPER_ADMIN: &str = "super_admin";
pub const ADMIN: &str = "admin";
pub const EDITOR: &str = "editor";
pub const AUTHOR: &str = "author";
pub const VIEWER: &str = "viewer";

/// Value written to the legacy `role` column for a role name. Old schemas
/// only accept `admin` and `editor`.
pub fn legacy_role_name(role_name: &str) -> &'static str {
    match role_name {
        SUPER_ADMIN | ADMIN => ADMIN,
        _ => EDITOR,
    }
}

fn grants(entries: &[(&str, &[Action])]) -> NamedGrants {
    entries
        .iter()
        .map(|(name, actions)| (name.to_string(), actions.to_vec()))
        .collect()
}

/// A role shipped with the CMS.
pub struct BuiltinRole {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub permissions: RolePermissions,
}

pub fn builtin_roles() -> Vec<BuiltinRole> {
    use Action::*;

    vec![
        BuiltinRole {
            name: SUPER_ADMIN,
            display_name: "Super Administrator",
            description: "Full system access with all permissions",
            permissions: RolePermissions {
                collections: Some(grants(&[("*", &[Create, Read, Update, Delete, Publish, Manage])])),
                singletons: Some(grants(&[("*", &[Read, Update, Publish, Manage])])),
                media: Some(vec![Create, Read, Update, Delete, Manage]),
                users: Some(vec![Create, Read, Update, Delete, Manage]),
                roles: Some(vec![Create, Read, Update, Delete, Manage]),
                settings: Some(vec![Read, Update, Manage]),
            },
        },
        BuiltinRole {
            name: ADMIN,
            display_name: "Administrator",
            description: "Manages content, media and users",
            permissions: RolePermissions {
                collections: Some(grants(&[("*", &[Create, Read, Update, Delete, Publish])])),
                singletons: Some(grants(&[("*", &[Read, Update, Publish])])),
                media: Some(vec![Create, Read, Update, Delete]),
                users: Some(vec![Create, Read, Update]),
                roles: Some(vec![Read]),
                settings: Some(vec![Read]),
            },
        },
        BuiltinRole {
            name: EDITOR,
            display_name: "Editor",
            description: "Creates, edits and publishes content",
            permissions: RolePermissions {
                collections: Some(grants(&[("*", &[Create, Read, Update, Publish])])),
                singletons: Some(grants(&[("*", &[Read, Update])])),
                media: Some(vec![Create, Read, Update]),
                users: None,
                roles: None,
                settings: Some(vec![Read]),
            },
        },
        BuiltinRole {
            name: AUTHOR,
            display_name: "Author",
            description: "Writes content without publishing",
            permissions: RolePermissions {
                collections: Some(grants(&[("*", &[Create, Read, Update])])),
                singletons: Some(grants(&[("*", &[Read])])),
                media: Some(vec![Create, Read]),
                ..Default::default()
            },
        },
        BuiltinRole {
            name: VIEWER,
            display_name: "Viewer",
            description: "Read-only access",
            permissions: RolePermissions {
                collections: Some(grants(&[("*", &[Read])])),
                singletons: Some(grants(&[("*", &[Read])])),
                media: Some(vec![Read]),
                ..Default::default()
            },
        },
    ]
}

/// Inserts any missing built-in role. Returns how many were created.
pub async fn seed_builtin_roles(store: &dyn Store) -> CmsResult<usize> {
    let mut created = 0;
    for builtin in builtin_roles() {
        if store.find_role_by_name(builtin.name).await?.is_some() {
            continue;
        }
        let now = Utc::now();
        store
            .insert_role(&Role {
                id: Uuid::new_v4().to_string(),
                name: builtin.name.to_string(),
                display_name: builtin.display_name.to_string(),
                description: Some(builtin.description.to_string()),
                permissions: builtin.permissions,
                is_system: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
        log::info!("Created built-in role {}", builtin.name);
        created += 1;
    }
    Ok(created)
}

/// The role that governs a user: `role_id` when set, else the role named by
/// the legacy column. A `role_id` that no longer resolves grants nothing.
pub async fn resolve_role(
    store: &dyn Store,
    role_id: Option<&str>,
    legacy_role: &str,
) -> CmsResult<Option<Role>> {
    match role_id {
        Some(id) => {
            let role = store.find_role(id).await?;
            if role.is_none() {
                log::warn!("Role {} no longer exists", id);
            }
            Ok(role)
        }
        None => store.find_role_by_name(legacy_role).await,
    }
}

/// Creates the configured administrator unless that username exists.
/// Returns true when a user was created.
pub async fn ensure_initial_admin(
    store: &dyn Store,
    username: &str,
    password: &str,
) -> CmsResult<bool> {
    if username.is_empty() || password.is_empty() {
        return Ok(false);
    }
    if store.find_user_by_username(username).await?.is_some() {
        log::debug!("Admin user already exists");
        return Ok(false);
    }
    if validate_password_strength(password).is_err() {
        log::warn!("Initial admin password does not meet the password policy");
    }

    let role = store
        .find_role_by_name(SUPER_ADMIN)
        .await?
        .ok_or_else(|| CmsError::Internal("super_admin role is missing".to_string()))?;
    let now = Utc::now();
    store
        .insert_user(&CmsUser {
            id: Uuid::new_v4().to_string(),
            username: username.to_owned(),
            password_hash: hash_password(password.to_owned()).await?,
            email: None,
            name: None,
            avatar: None,
            locale: Some("en".to_string()),
            role: legacy_role_name(SUPER_ADMIN).to_string(),
            role_id: Some(role.id),
            active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        })
        .await?;
    log::info!("Initial admin user {} created", username);
    Ok(true)
}

/// Points every user without `role_id` at the built-in role matching their
/// legacy name. Returns how many users were updated.
pub async fn backfill_role_ids(store: &dyn Store) -> CmsResult<usize> {
    seed_builtin_roles(store).await?;

    let mut updated = 0;
    for user in store.users_without_role_id().await? {
        let target = match user.role.as_str() {
            ADMIN => ADMIN,
            _ => EDITOR,
        };
        let role = store
            .find_role_by_name(target)
            .await?
            .ok_or_else(|| CmsError::Internal(format!("{} role is missing", target)))?;
        store.set_user_role(&user.id, &user.role, Some(&role.id)).await?;
        log::info!("Assigned role {} to {}", role.name, user.username);
        updated += 1;
    }
    Ok(updated)
}

/// Gives a user the super_admin role. Without a username, the first user
/// whose legacy role is `admin` is promoted.
pub async fn promote_to_super_admin(store: &dyn Store, username: Option<&str>) -> CmsResult<CmsUser> {
    seed_builtin_roles(store).await?;
    let role = store
        .find_role_by_name(SUPER_ADMIN)
        .await?
        .ok_or_else(|| CmsError::Internal("super_admin role is missing".to_string()))?;

    let user = match username {
        Some(name) => store
            .find_user_by_username(name)
            .await?
            .ok_or_else(|| CmsError::not_found(format!("User \"{}\"", name)))?,
        None => store
            .list_users()
            .await?
            .into_iter()
            .find(|u| u.role == ADMIN)
            .ok_or_else(|| CmsError::not_found("Admin user"))?,
    };

    store
        .set_user_role(&user.id, legacy_role_name(SUPER_ADMIN), Some(&role.id))
        .await?;
    store
        .find_user(&user.id)
        .await?
        .ok_or_else(|| CmsError::not_found("User"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let names: Vec<_> = builtin_roles().iter().map(|r| r.name).collect();
        assert_eq!(names, vec![SUPER_ADMIN, ADMIN, EDITOR, AUTHOR, VIEWER]);
    }

    #[test]
    fn test_legacy_names() {
        assert_eq!(legacy_role_name(SUPER_ADMIN), ADMIN);
        assert_eq!(legacy_role_name(ADMIN), ADMIN);
        assert_eq!(legacy_role_name(AUTHOR), EDITOR);
        assert_eq!(legacy_role_name("custom"), EDITOR);
    }

    #[test]
    fn test_viewer_is_read_only() {
        let viewer = builtin_roles().into_iter().find(|r| r.name == VIEWER).unwrap();
        assert_eq!(viewer.permissions.media, Some(vec![Action::Read]));
        assert!(viewer.permissions.users.is_none());
    }
}
