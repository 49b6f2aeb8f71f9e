use crate::auth::roles::{legacy_role_name, EDITOR, SUPER_ADMIN};
use crate::auth::{hash_password, is_super_admin, validate_password_strength};
use crate::db::Store;
use crate::error::{CmsError, CmsResult};
use crate::fields::ValidationErrors;
use crate::model::{CmsUser, Role, SafeUser};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

const DEFAULT_LOCALE: &str = "en";

/// Body of a user creation request.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(length(max = 255, message = "Username is too long"))]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub password: Option<String>,
    #[validate(length(max = 255, message = "Name is too long"))]
    pub name: Option<String>,
    pub role_id: Option<String>,
    pub avatar: Option<String>,
    pub locale: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn into_validation_errors(errors: validator::ValidationErrors) -> ValidationErrors {
    let mut out = ValidationErrors::new();
    for (field, list) in errors.field_errors() {
        for error in list {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid {}", field));
            out.add(field.to_string(), message);
        }
    }
    out
}

/// A user together with the name of the role that governs them.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithRole {
    #[serde(flatten)]
    pub user: SafeUser,
    pub role_name: String,
    pub role_display_name: String,
}

impl UserWithRole {
    fn new(user: SafeUser, role: Option<&Role>) -> Self {
        let (role_name, role_display_name) = match role {
            Some(role) => (role.name.clone(), role.display_name.clone()),
            None => (user.role.clone(), user.role.clone()),
        };
        Self {
            user,
            role_name,
            role_display_name,
        }
    }
}

/// Creates a user on behalf of `actor`. Returns the new id.
pub async fn create_user(store: &dyn Store, actor: &SafeUser, input: NewUser) -> CmsResult<String> {
    let (username, email, password) =
        match (non_empty(&input.username), non_empty(&input.email), input.password.as_deref()) {
            (Some(u), Some(e), Some(p)) if !p.is_empty() => (u.to_owned(), e.to_owned(), p.to_owned()),
            _ => {
                return Err(CmsError::bad_request(
                    "Username, email, and password are required",
                ))
            }
        };

    input.validate().map_err(into_validation_errors)?;
    validate_password_strength(&password)?;

    if store.find_user_by_username(&username).await?.is_some() {
        return Err(CmsError::Conflict("Username already exists".to_string()));
    }
    if store.find_user_by_email(&email).await?.is_some() {
        return Err(CmsError::Conflict("Email already exists".to_string()));
    }

    let role = match non_empty(&input.role_id) {
        Some(role_id) => {
            let role = store
                .find_role(role_id)
                .await?
                .ok_or_else(|| CmsError::bad_request("Invalid role ID"))?;
            if role.name == SUPER_ADMIN && !is_super_admin(store, actor).await? {
                log::warn!("{} tried to assign super_admin", actor.username);
                return Err(CmsError::Forbidden);
            }
            role
        }
        None => store
            .find_role_by_name(EDITOR)
            .await?
            .ok_or_else(|| CmsError::Internal("editor role is missing".to_string()))?,
    };

    let now = Utc::now();
    let user = CmsUser {
        id: Uuid::new_v4().to_string(),
        username,
        password_hash: hash_password(password).await?,
        email: Some(email),
        name: non_empty(&input.name).map(str::to_owned),
        avatar: non_empty(&input.avatar).map(str::to_owned),
        locale: Some(non_empty(&input.locale).unwrap_or(DEFAULT_LOCALE).to_owned()),
        role: legacy_role_name(&role.name).to_string(),
        role_id: Some(role.id),
        active: true,
        last_login: None,
        created_at: now,
        updated_at: now,
    };
    store.insert_user(&user).await?;

    log::info!("{} created user {} ({})", actor.username, user.username, role.name);
    Ok(user.id)
}

pub async fn get_user(store: &dyn Store, id: &str) -> CmsResult<UserWithRole> {
    let user = store
        .find_user(id)
        .await?
        .ok_or_else(|| CmsError::not_found("User"))?;
    let role = match user.role_id.as_deref() {
        Some(role_id) => store.find_role(role_id).await?,
        None => None,
    };
    Ok(UserWithRole::new(user.into(), role.as_ref()))
}

pub async fn list_users(store: &dyn Store) -> CmsResult<Vec<UserWithRole>> {
    let roles: HashMap<String, Role> = store
        .list_roles()
        .await?
        .into_iter()
        .map(|role| (role.id.clone(), role))
        .collect();
    Ok(store
        .list_users()
        .await?
        .into_iter()
        .map(|user| {
            let role = user.role_id.as_deref().and_then(|id| roles.get(id));
            UserWithRole::new(user.into(), role)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_errors_are_keyed_by_field() {
        let input = NewUser {
            username: Some("ed".into()),
            email: Some("not-an-email".into()),
            password: Some("Password1".into()),
            ..Default::default()
        };
        let errors = into_validation_errors(input.validate().unwrap_err());
        assert_eq!(errors.field("email"), Some(&["Invalid email address".to_string()][..]));
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        assert_eq!(non_empty(&Some("  ".into())), None);
        assert_eq!(non_empty(&None), None);
        assert_eq!(non_empty(&Some(" ed ".into())), Some("ed"));
    }
}
