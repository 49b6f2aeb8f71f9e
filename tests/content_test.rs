/// Integration tests for the content repository: localization, publishing
/// and validation against the content model.
mod common;

use cairn::content::{ContentPatch, ContentRepository, ListQuery, NewContent, StatusFilter, Translations};
use cairn::db::{ContentFilter, ContentOrder};
use cairn::error::CmsError;
use cairn::model::{ContentKind, ContentStatus};
use common::*;
use futures::future;
use serde_json::{json, Map, Value};
use std::sync::Arc;

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

fn translations(locale: &str, value: Value) -> Translations {
    let mut out = Translations::new();
    out.insert(locale.to_string(), object(value));
    out
}

async fn setup() -> (TestDb, ContentRepository) {
    let db = setup_test_database().await;
    let repo = ContentRepository::new(db.store.clone(), Arc::new(test_model()));
    (db, repo)
}

#[actix_rt::test]
async fn test_locale_overlay_is_merged() {
    let (_db, repo) = setup().await;
    let id = repo
        .create(
            "posts",
            NewContent {
                data: object(json!({ "title": "Hello", "summary": "English" })),
                translations: translations("es", json!({ "summary": "Español" })),
                status: ContentStatus::Draft,
            },
            None,
        )
        .await
        .unwrap();

    let plain = repo.get_by_id("posts", &id, None).await.unwrap();
    assert_eq!(plain.item.data["summary"], json!("English"));
    assert_eq!(plain.translations["es"]["summary"], json!("Español"));

    let spanish = repo.get_by_id("posts", &id, Some("es")).await.unwrap();
    assert_eq!(spanish.item.data["title"], json!("Hello"));
    assert_eq!(spanish.item.data["summary"], json!("Español"));

    // A locale without a translation falls back to the base data.
    let english = repo.get_by_id("posts", &id, Some("en")).await.unwrap();
    assert_eq!(english.item.data["summary"], json!("English"));
}

#[actix_rt::test]
async fn test_translation_upsert_keeps_one_row() {
    let (db, repo) = setup().await;
    let id = repo
        .create(
            "posts",
            NewContent {
                data: object(json!({ "title": "Hello" })),
                translations: translations("es", json!({ "title": "Hola" })),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    for title in ["Hola de nuevo", "Hola otra vez"] {
        repo.update(
            "posts",
            &id,
            ContentPatch {
                translations: translations("es", json!({ "title": title })),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    let rows = db.store.translations_for(&id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].data["title"], json!("Hola otra vez"));
}

#[actix_rt::test]
async fn test_unknown_translation_locale_is_rejected() {
    let (_db, repo) = setup().await;
    let result = repo
        .create(
            "posts",
            NewContent {
                data: object(json!({ "title": "Hello" })),
                translations: translations("fr", json!({ "title": "Bonjour" })),
                ..Default::default()
            },
            None,
        )
        .await;

    match result {
        Err(CmsError::Validation(errors)) => assert!(errors.field("translations.fr").is_some()),
        other => panic!("expected validation error, got {:?}", other.map(|_| ())),
    }
}

#[actix_rt::test]
async fn test_required_field_is_enforced() {
    let (_db, repo) = setup().await;
    let result = repo
        .create(
            "posts",
            NewContent {
                data: object(json!({ "summary": "No title" })),
                ..Default::default()
            },
            None,
        )
        .await;

    match result {
        Err(CmsError::Validation(errors)) => assert!(errors.field("title").is_some()),
        other => panic!("expected validation error, got {:?}", other.map(|_| ())),
    }
}

#[actix_rt::test]
async fn test_slug_is_derived_from_title() {
    let (_db, repo) = setup().await;
    let id = repo
        .create(
            "posts",
            NewContent {
                data: object(json!({ "title": "Hello, World!" })),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    let item = repo.get_by_id("posts", &id, None).await.unwrap().item;
    assert_eq!(item.data["slug"], json!("hello-world"));
}

#[actix_rt::test]
async fn test_publish_sets_published_at_once() {
    let (_db, repo) = setup().await;
    let id = repo
        .create(
            "posts",
            NewContent {
                data: object(json!({ "title": "Draft" })),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert!(repo.get_by_id("posts", &id, None).await.unwrap().item.published_at.is_none());

    let publish = ContentPatch {
        status: Some(ContentStatus::Published),
        ..Default::default()
    };
    repo.update("posts", &id, publish.clone()).await.unwrap();
    let first = repo.get_by_id("posts", &id, None).await.unwrap().item.published_at;
    assert!(first.is_some());

    // Archiving and republishing keeps the original publication time.
    repo.update(
        "posts",
        &id,
        ContentPatch {
            status: Some(ContentStatus::Archived),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    repo.update("posts", &id, publish).await.unwrap();
    let item = repo.get_by_id("posts", &id, None).await.unwrap().item;
    assert_eq!(item.status, ContentStatus::Published);
    assert_eq!(item.published_at, first);
}

#[actix_rt::test]
async fn test_public_list_only_shows_published() {
    let (_db, repo) = setup().await;
    for (title, status) in [
        ("One", ContentStatus::Published),
        ("Two", ContentStatus::Draft),
        ("Three", ContentStatus::Published),
    ] {
        repo.create(
            "posts",
            NewContent {
                data: object(json!({ "title": title })),
                status,
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    }

    let page = repo.list_collection("posts", &ListQuery::public()).await.unwrap();
    assert_eq!(page.total, 2);
    assert!(page.items.iter().all(|i| i.status == ContentStatus::Published));

    let page = repo.list_collection("posts", &ListQuery::admin()).await.unwrap();
    assert_eq!(page.total, 3);

    let drafts = ListQuery {
        status: StatusFilter::Only(ContentStatus::Draft),
        ..ListQuery::admin()
    };
    let page = repo.list_collection("posts", &drafts).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].data["title"], json!("Two"));
}

#[actix_rt::test]
async fn test_list_search_and_paging() {
    let (_db, repo) = setup().await;
    for title in ["Rust news", "Cooking", "More rust"] {
        repo.create(
            "posts",
            NewContent {
                data: object(json!({ "title": title })),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    }

    let query = ListQuery {
        search: Some("RUST".into()),
        ..ListQuery::admin()
    };
    let page = repo.list_collection("posts", &query).await.unwrap();
    assert_eq!(page.items.len(), 2);

    let query = ListQuery {
        per_page: 2,
        ..ListQuery::admin()
    };
    let page = repo.list_collection("posts", &query).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);

    // A page far past the end is empty rather than an error.
    let query = ListQuery {
        page: u64::MAX,
        ..ListQuery::admin()
    };
    let page = repo.list_collection("posts", &query).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 3);
}

#[actix_rt::test]
async fn test_unknown_collection_is_not_found() {
    let (_db, repo) = setup().await;
    assert!(matches!(
        repo.list_collection("nope", &ListQuery::admin()).await,
        Err(CmsError::NotFound(_))
    ));
    assert!(matches!(
        repo.get_by_id("posts", "missing", None).await,
        Err(CmsError::NotFound(_))
    ));
    assert!(matches!(
        repo.delete("posts", "missing").await,
        Err(CmsError::NotFound(_))
    ));
}

#[actix_rt::test]
async fn test_items_are_scoped_to_their_collection() {
    let (_db, repo) = setup().await;
    let id = repo
        .create(
            "posts",
            NewContent {
                data: object(json!({ "title": "Post" })),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    assert!(matches!(
        repo.get_by_id("pages", &id, None).await,
        Err(CmsError::NotFound(_))
    ));
    assert!(matches!(repo.delete("pages", &id).await, Err(CmsError::NotFound(_))));
    repo.delete("posts", &id).await.unwrap();
}

#[actix_rt::test]
async fn test_singleton_upsert() {
    let (db, repo) = setup().await;
    assert!(repo.get_singleton("homepage", None).await.unwrap().is_none());

    let first = repo
        .upsert_singleton(
            "homepage",
            object(json!({ "headline": "Welcome", "tagline": "Hi" })),
            translations("es", json!({ "headline": "Bienvenido" })),
            None,
        )
        .await
        .unwrap();
    let second = repo
        .upsert_singleton("homepage", object(json!({ "headline": "Welcome back" })), Translations::new(), None)
        .await
        .unwrap();
    assert_eq!(first, second);

    let home = repo.get_singleton("homepage", Some("es")).await.unwrap().unwrap();
    assert_eq!(home.item.status, ContentStatus::Published);
    assert_eq!(home.item.data["headline"], json!("Bienvenido"));
    assert_eq!(db.store.translations_for(&first).await.unwrap().len(), 1);

    assert!(matches!(
        repo.get_singleton("footer", None).await,
        Err(CmsError::NotFound(_))
    ));
}

#[actix_rt::test]
async fn test_concurrent_first_singleton_writes_share_one_row() {
    let (db, repo) = setup().await;
    let (a, b) = future::join(
        repo.upsert_singleton("homepage", object(json!({ "headline": "A" })), Translations::new(), None),
        repo.upsert_singleton("homepage", object(json!({ "headline": "B" })), Translations::new(), None),
    )
    .await;
    assert_eq!(a.unwrap(), b.unwrap());

    let filter = ContentFilter {
        kind: ContentKind::Singleton,
        collection: "homepage".to_string(),
        status: None,
    };
    let (rows, total) = db
        .store
        .list_content(&filter, ContentOrder::default(), None)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows.len(), 1);
}
