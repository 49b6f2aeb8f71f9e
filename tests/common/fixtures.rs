//! Test fixtures for creating test data
#![allow(dead_code)]

use cairn::app_config::AppConfig;
use cairn::auth::roles::legacy_role_name;
use cairn::auth::{hash_password, seed_builtin_roles};
use cairn::cms_config::{CmsConfig, ContentModel};
use cairn::context::AppState;
use cairn::db::Store;
use cairn::model::{CmsUser, SafeUser};
use cairn::storage::{LocalStorage, StorageBackend};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret-that-is-long-enough-0123456789";
pub const TEST_PASSWORD: &str = "Sup3r$ecretPass";

/// Two locales, a `posts` collection with a derived slug and a `homepage`
/// singleton.
pub const TEST_MODEL: &str = r#"{
    "locales": ["en", "es"],
    "defaultLocale": "en",
    "collections": {
        "posts": {
            "label": "Post",
            "titleField": "title",
            "fields": {
                "title": { "type": "text", "label": "Title", "required": true },
                "slug": { "type": "slug", "label": "Slug", "from": "title" },
                "summary": { "type": "text", "label": "Summary" }
            }
        },
        "pages": {
            "label": "Page",
            "fields": {
                "title": { "type": "text", "label": "Title", "required": true }
            }
        }
    },
    "singletons": {
        "homepage": {
            "label": "Homepage",
            "fields": {
                "headline": { "type": "text", "label": "Headline" },
                "tagline": { "type": "text", "label": "Tagline" }
            }
        }
    }
}"#;

pub fn test_model() -> ContentModel {
    ContentModel::new(CmsConfig::from_json(TEST_MODEL).expect("Test model must parse"))
        .expect("Test model must compile")
}

/// Configuration pointing uploads at `dir`, with a fixed signing secret.
pub fn test_config(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = TEST_SECRET.to_string();
    config.uploads.path = dir.join("uploads").to_string_lossy().into_owned();
    config
}

/// Application state over `store` with built-in roles seeded.
pub async fn test_state(store: Arc<dyn Store>, dir: &Path) -> AppState {
    test_state_with(store, test_config(dir)).await
}

pub async fn test_state_with(store: Arc<dyn Store>, config: AppConfig) -> AppState {
    seed_builtin_roles(store.as_ref())
        .await
        .expect("Failed to seed roles");
    let storage: Arc<dyn StorageBackend> =
        Arc::new(LocalStorage::new(&config.uploads.path).expect("Failed to open uploads dir"));
    AppState::new(config, store, test_model(), storage).expect("Failed to build state")
}

/// Create a test user holding the named built-in role, with [`TEST_PASSWORD`].
pub async fn create_test_user(store: &dyn Store, username: &str, role_name: &str) -> SafeUser {
    let role = store
        .find_role_by_name(role_name)
        .await
        .expect("Role lookup failed")
        .expect("Role must be seeded");
    let now = Utc::now();
    let user = CmsUser {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        password_hash: hash_password(TEST_PASSWORD.to_string())
            .await
            .expect("Password hashing failed"),
        email: Some(format!("{}@test.com", username)),
        name: None,
        avatar: None,
        locale: Some("en".to_string()),
        role: legacy_role_name(role_name).to_string(),
        role_id: Some(role.id),
        active: true,
        last_login: None,
        created_at: now,
        updated_at: now,
    };
    store.insert_user(&user).await.expect("Failed to insert user");
    SafeUser::from(user)
}
