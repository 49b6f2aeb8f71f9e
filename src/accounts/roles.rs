use crate::auth::roles::VIEWER;
use crate::db::Store;
use crate::error::{CmsError, CmsResult};
use crate::fields::ValidationErrors;
use crate::model::{Role, RolePermissions};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

static ROLE_NAME: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]{1,49}$").ok());

fn check_name(name: &str) -> Result<(), ValidationErrors> {
    let valid = ROLE_NAME
        .as_ref()
        .map(|re| re.is_match(name))
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(ValidationErrors::single(
            "name",
            "Role name must be 2-50 lowercase letters, digits or underscores",
        ))
    }
}

/// Body of a role creation request.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRole {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: RolePermissions,
}

/// Body of a role update request. Absent parts are left unchanged.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePatch {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<RolePermissions>,
}

pub async fn list_roles(store: &dyn Store) -> CmsResult<Vec<Role>> {
    store.list_roles().await
}

pub async fn create_role(store: &dyn Store, input: NewRole) -> CmsResult<Role> {
    let name = input.name.trim().to_owned();
    check_name(&name)?;
    let display_name = input.display_name.trim().to_owned();
    if display_name.is_empty() {
        return Err(ValidationErrors::single("displayName", "Required").into());
    }

    let now = Utc::now();
    let role = Role {
        id: Uuid::new_v4().to_string(),
        name,
        display_name,
        description: input.description.filter(|d| !d.trim().is_empty()),
        permissions: input.permissions,
        is_system: false,
        created_at: now,
        updated_at: now,
    };
    store.insert_role(&role).await?;
    log::info!("Created role {}", role.name);
    Ok(role)
}

/// Applies `patch` to a role. Built-in roles keep their name.
pub async fn update_role(store: &dyn Store, id: &str, patch: RolePatch) -> CmsResult<Role> {
    let mut role = store
        .find_role(id)
        .await?
        .ok_or_else(|| CmsError::not_found("Role"))?;

    if let Some(name) = patch.name.map(|n| n.trim().to_owned()) {
        if name != role.name {
            if role.is_system {
                return Err(CmsError::bad_request("System roles cannot be renamed"));
            }
            check_name(&name)?;
            role.name = name;
        }
    }
    if let Some(display_name) = patch.display_name {
        let display_name = display_name.trim().to_owned();
        if display_name.is_empty() {
            return Err(ValidationErrors::single("displayName", "Required").into());
        }
        role.display_name = display_name;
    }
    if let Some(description) = patch.description {
        role.description = Some(description).filter(|d| !d.trim().is_empty());
    }
    if let Some(permissions) = patch.permissions {
        role.permissions = permissions;
    }
    role.updated_at = Utc::now();

    store.update_role(&role).await?;
    Ok(role)
}

/// Deletes a custom role. Users holding it are moved to the read-only
/// `viewer` role; the legacy column would otherwise grant them `editor`.
pub async fn delete_role(store: &dyn Store, id: &str) -> CmsResult<()> {
    let role = store
        .find_role(id)
        .await?
        .ok_or_else(|| CmsError::not_found("Role"))?;
    if role.is_system {
        return Err(CmsError::bad_request("System roles cannot be deleted"));
    }
    let viewer = store
        .find_role_by_name(VIEWER)
        .await?
        .ok_or_else(|| CmsError::Internal("viewer role is missing".to_string()))?;
    if !store.delete_role(id, Some(&viewer.id)).await? {
        return Err(CmsError::not_found("Role"));
    }
    log::info!("Deleted role {}", role.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_names() {
        assert!(check_name("reviewer").is_ok());
        assert!(check_name("content_lead2").is_ok());
        assert!(check_name("r").is_err());
        assert!(check_name("Reviewer").is_err());
        assert!(check_name("2fast").is_err());
        assert!(check_name("has space").is_err());
    }
}
