/// Integration tests for user and role management and branding settings
mod common;

use cairn::accounts::{
    create_role, create_user, delete_role, get_user, list_users, update_role, NewRole, NewUser,
    RolePatch,
};
use cairn::auth::require_permission;
use cairn::error::CmsError;
use cairn::model::{Action, Resource, SafeUser};
use cairn::settings::{get_branding, put_branding};
use common::*;
use serde_json::json;

async fn seeded() -> TestDb {
    let db = setup_test_database().await;
    cairn::auth::seed_builtin_roles(db.store.as_ref()).await.unwrap();
    db
}

fn new_user(username: &str, email: &str) -> NewUser {
    NewUser {
        username: Some(username.to_string()),
        email: Some(email.to_string()),
        password: Some(TEST_PASSWORD.to_string()),
        ..Default::default()
    }
}

#[actix_rt::test]
async fn test_create_user_defaults_to_editor() {
    let db = seeded().await;
    let store = db.store.as_ref();
    let admin = create_test_user(store, "root", "super_admin").await;

    let id = create_user(store, &admin, new_user("writer", "writer@test.com")).await.unwrap();
    let user = get_user(store, &id).await.unwrap();
    assert_eq!(user.role_name, "editor");
    assert_eq!(user.role_display_name, "Editor");
    assert_eq!(user.user.role, "editor");
    assert_eq!(user.user.locale.as_deref(), Some("en"));

    // The new account can log in.
    let state = test_state(db.store.clone(), db.dir.path()).await;
    assert!(state.auth.login("writer", TEST_PASSWORD).await.unwrap().is_some());
}

#[actix_rt::test]
async fn test_create_user_requires_fields() {
    let db = seeded().await;
    let store = db.store.as_ref();
    let admin = create_test_user(store, "root", "super_admin").await;

    let missing = NewUser {
        username: Some("writer".into()),
        ..Default::default()
    };
    assert!(matches!(
        create_user(store, &admin, missing).await,
        Err(CmsError::BadRequest(_))
    ));

    let bad_email = new_user("writer", "not-an-email");
    match create_user(store, &admin, bad_email).await {
        Err(CmsError::Validation(errors)) => assert!(errors.field("email").is_some()),
        other => panic!("expected validation error, got {:?}", other),
    }

    let weak = NewUser {
        password: Some("password".into()),
        ..new_user("writer", "writer@test.com")
    };
    match create_user(store, &admin, weak).await {
        Err(CmsError::Validation(errors)) => assert!(errors.field("password").is_some()),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[actix_rt::test]
async fn test_duplicate_username_or_email_conflicts() {
    let db = seeded().await;
    let store = db.store.as_ref();
    let admin = create_test_user(store, "root", "super_admin").await;
    create_user(store, &admin, new_user("writer", "writer@test.com")).await.unwrap();

    assert!(matches!(
        create_user(store, &admin, new_user("writer", "other@test.com")).await,
        Err(CmsError::Conflict(_))
    ));
    assert!(matches!(
        create_user(store, &admin, new_user("other", "writer@test.com")).await,
        Err(CmsError::Conflict(_))
    ));
}

#[actix_rt::test]
async fn test_only_super_admin_grants_super_admin() {
    let db = seeded().await;
    let store = db.store.as_ref();
    let root = create_test_user(store, "root", "super_admin").await;
    let admin = create_test_user(store, "boss", "admin").await;
    let super_role = store.find_role_by_name("super_admin").await.unwrap().unwrap();

    let promote = |username: &str, email: &str| NewUser {
        role_id: Some(super_role.id.clone()),
        ..new_user(username, email)
    };
    assert!(matches!(
        create_user(store, &admin, promote("sneaky", "sneaky@test.com")).await,
        Err(CmsError::Forbidden)
    ));
    create_user(store, &root, promote("second", "second@test.com")).await.unwrap();

    let invalid = NewUser {
        role_id: Some("no-such-role".into()),
        ..new_user("lost", "lost@test.com")
    };
    assert!(matches!(
        create_user(store, &root, invalid).await,
        Err(CmsError::BadRequest(_))
    ));
}

#[actix_rt::test]
async fn test_list_users_includes_role_names() {
    let db = seeded().await;
    let store = db.store.as_ref();
    create_test_user(store, "root", "super_admin").await;
    create_test_user(store, "vi", "viewer").await;

    let users = list_users(store).await.unwrap();
    assert_eq!(users.len(), 2);
    let viewer = users.iter().find(|u| u.user.username == "vi").unwrap();
    assert_eq!(viewer.role_name, "viewer");

    let value = serde_json::to_value(viewer).unwrap();
    assert_eq!(value["roleName"], json!("viewer"));
    assert_eq!(value["username"], json!("vi"));
    assert!(value.get("passwordHash").is_none());

    assert!(matches!(get_user(store, "missing").await, Err(CmsError::NotFound(_))));
}

#[actix_rt::test]
async fn test_custom_role_lifecycle() {
    let db = seeded().await;
    let store = db.store.as_ref();
    let role = create_role(
        store,
        NewRole {
            name: "reviewer".into(),
            display_name: "Reviewer".into(),
            description: None,
            permissions: Default::default(),
        },
    )
    .await
    .unwrap();
    assert!(!role.is_system);

    let renamed = update_role(
        store,
        &role.id,
        RolePatch {
            name: Some("senior_reviewer".into()),
            display_name: Some("Senior Reviewer".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(renamed.name, "senior_reviewer");
    assert_eq!(
        store.find_role(&role.id).await.unwrap().unwrap().display_name,
        "Senior Reviewer"
    );

    delete_role(store, &role.id).await.unwrap();
    assert!(matches!(delete_role(store, &role.id).await, Err(CmsError::NotFound(_))));
}

#[actix_rt::test]
async fn test_deleted_custom_role_does_not_fall_back_to_editor() {
    let db = seeded().await;
    let store = db.store.as_ref();
    let admin = create_test_user(store, "root", "super_admin").await;

    let reviewer = create_role(
        store,
        NewRole {
            name: "reviewer".into(),
            display_name: "Reviewer".into(),
            description: None,
            permissions: serde_json::from_value(json!({ "collections": { "*": ["read"] } }))
                .unwrap(),
        },
    )
    .await
    .unwrap();
    let id = create_user(
        store,
        &admin,
        NewUser {
            role_id: Some(reviewer.id.clone()),
            ..new_user("reader", "reader@test.com")
        },
    )
    .await
    .unwrap();

    let user = SafeUser::from(store.find_user(&id).await.unwrap().unwrap());
    assert!(matches!(
        require_permission(store, &user, Resource::Collections, Action::Create, Some("posts")).await,
        Err(CmsError::Forbidden)
    ));

    delete_role(store, &reviewer.id).await.unwrap();

    let viewer = store.find_role_by_name("viewer").await.unwrap().unwrap();
    let user = SafeUser::from(store.find_user(&id).await.unwrap().unwrap());
    assert_eq!(user.role_id.as_deref(), Some(viewer.id.as_str()));
    assert!(require_permission(store, &user, Resource::Collections, Action::Read, Some("posts"))
        .await
        .is_ok());
    for action in [Action::Create, Action::Update, Action::Publish] {
        assert!(matches!(
            require_permission(store, &user, Resource::Collections, action, Some("posts")).await,
            Err(CmsError::Forbidden)
        ));
    }
}

#[actix_rt::test]
async fn test_invalid_role_name_is_rejected() {
    let db = seeded().await;
    let result = create_role(
        db.store.as_ref(),
        NewRole {
            name: "Bad Name".into(),
            display_name: "Bad".into(),
            description: None,
            permissions: Default::default(),
        },
    )
    .await;
    assert!(matches!(result, Err(CmsError::Validation(_))));
}

#[actix_rt::test]
async fn test_system_roles_are_protected() {
    let db = seeded().await;
    let store = db.store.as_ref();
    let editor = store.find_role_by_name("editor").await.unwrap().unwrap();

    assert!(matches!(
        delete_role(store, &editor.id).await,
        Err(CmsError::BadRequest(_))
    ));
    assert!(matches!(
        update_role(
            store,
            &editor.id,
            RolePatch {
                name: Some("writer".into()),
                ..Default::default()
            }
        )
        .await,
        Err(CmsError::BadRequest(_))
    ));

    // Other fields of a system role may change.
    let updated = update_role(
        store,
        &editor.id,
        RolePatch {
            description: Some("Edits things".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.description.as_deref(), Some("Edits things"));
    assert_eq!(updated.name, "editor");
}

#[actix_rt::test]
async fn test_branding_defaults_and_saves() {
    let db = setup_test_database().await;
    let store = db.store.as_ref();

    let branding = get_branding(store).await;
    assert_eq!(branding.name, "CMS");
    assert_eq!(branding.primary_color, "#2563eb");
    assert_eq!(branding.powered_by.name, "Neskeep");

    put_branding(store, json!({ "name": "Acme", "login": { "title": "Welcome" } }))
        .await
        .unwrap();
    let branding = get_branding(store).await;
    assert_eq!(branding.name, "Acme");
    assert_eq!(branding.login.title, "Welcome");
    assert_eq!(branding.primary_color, "#2563eb");

    assert!(matches!(
        put_branding(store, json!("nope")).await,
        Err(CmsError::BadRequest(_))
    ));
}
