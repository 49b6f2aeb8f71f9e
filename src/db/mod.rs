//! Persistence layer.
//!
//! [`Store`] is the only interface the rest of the crate uses to reach the
//! database. [`SqliteStore`] and [`PostgresStore`] implement it over their own
//! schema; nothing above this module branches on the driver.

mod postgres;
mod sea;
mod sqlite;

pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

use crate::app_config::DatabaseSettings;
use crate::error::{CmsError, CmsResult};
use crate::model::{
    CmsUser, ContentItem, ContentKind, ContentStatus, ContentTranslation, MediaItem, Role, Setting,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Driver {
    Sqlite,
    Postgres,
}

impl FromStr for Driver {
    type Err = CmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Driver::Sqlite),
            "postgres" | "postgresql" => Ok(Driver::Postgres),
            other => Err(CmsError::Configuration(format!(
                "unknown database driver `{}`",
                other
            ))),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Driver::Sqlite => f.write_str("sqlite"),
            Driver::Postgres => f.write_str("postgres"),
        }
    }
}

/// Connection settings for [`initialize`].
#[derive(Clone, Debug)]
pub struct DbConfig {
    pub driver: Driver,
    /// Required for Postgres. For SQLite, overrides `filename` when set.
    pub url: Option<String>,
    pub filename: PathBuf,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn sqlite(filename: impl Into<PathBuf>) -> Self {
        Self {
            driver: Driver::Sqlite,
            url: None,
            filename: filename.into(),
            max_connections: 10,
        }
    }

    pub fn postgres(url: impl Into<String>) -> Self {
        Self {
            driver: Driver::Postgres,
            url: Some(url.into()),
            filename: PathBuf::new(),
            max_connections: 10,
        }
    }

    pub fn from_settings(settings: &DatabaseSettings) -> CmsResult<Self> {
        Ok(Self {
            driver: settings.driver.parse()?,
            url: Some(settings.url.clone()).filter(|u| !u.trim().is_empty()),
            filename: PathBuf::from(&settings.filename),
            max_connections: settings.max_connections,
        })
    }
}

/// Sortable content columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentSortField {
    CreatedAt,
    UpdatedAt,
    PublishedAt,
    SortOrder,
    Status,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentOrder {
    pub field: ContentSortField,
    pub descending: bool,
}

impl Default for ContentOrder {
    fn default() -> Self {
        Self {
            field: ContentSortField::CreatedAt,
            descending: true,
        }
    }
}

/// 1-based page of `per_page` rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Paging {
    pub page: u64,
    pub per_page: u64,
}

impl Paging {
    /// Rows to skip. `None` when the page lies past anything a database
    /// can hold.
    pub fn offset(&self) -> Option<u64> {
        self.page
            .saturating_sub(1)
            .checked_mul(self.per_page)
            .filter(|offset| *offset <= i64::MAX as u64)
    }
}

#[derive(Clone, Debug)]
pub struct ContentFilter {
    pub kind: ContentKind,
    pub collection: String,
    /// `None` matches every status.
    pub status: Option<ContentStatus>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaSortField {
    CreatedAt,
    Filename,
    Size,
}

#[derive(Clone, Debug)]
pub struct MediaFilter {
    /// Matches MIME types starting with this prefix, e.g. `image/`.
    pub type_prefix: Option<String>,
    /// Substring match on filename, original name and alt text.
    pub search: Option<String>,
    pub order_by: MediaSortField,
    pub descending: bool,
    pub paging: Paging,
}

/// Storage operations for every CMS entity.
#[async_trait]
pub trait Store: Send + Sync {
    fn driver(&self) -> Driver;

    // Content

    /// Rows matching `filter` plus the unpaged total.
    async fn list_content(
        &self,
        filter: &ContentFilter,
        order: ContentOrder,
        paging: Option<Paging>,
    ) -> CmsResult<(Vec<ContentItem>, u64)>;
    async fn find_content(
        &self,
        kind: ContentKind,
        collection: &str,
        id: &str,
    ) -> CmsResult<Option<ContentItem>>;
    async fn find_singleton(&self, name: &str) -> CmsResult<Option<ContentItem>>;
    /// Fails with `Conflict` on a duplicate id or a second row for the same
    /// singleton.
    async fn insert_content(&self, item: &ContentItem) -> CmsResult<()>;
    /// Writes every mutable column of `item`.
    async fn update_content(&self, item: &ContentItem) -> CmsResult<()>;
    /// Deletes the row and its translations. Returns false when absent.
    async fn delete_content(&self, id: &str) -> CmsResult<bool>;

    // Translations

    async fn translations_for(&self, content_id: &str) -> CmsResult<Vec<ContentTranslation>>;
    async fn translations_in_locale(
        &self,
        content_ids: &[String],
        locale: &str,
    ) -> CmsResult<Vec<ContentTranslation>>;
    async fn find_translation(
        &self,
        content_id: &str,
        locale: &str,
    ) -> CmsResult<Option<ContentTranslation>>;
    async fn insert_translation(&self, translation: &ContentTranslation) -> CmsResult<()>;
    async fn update_translation(&self, translation: &ContentTranslation) -> CmsResult<()>;

    // Media

    async fn insert_media(&self, item: &MediaItem) -> CmsResult<()>;
    async fn find_media(&self, id: &str) -> CmsResult<Option<MediaItem>>;
    async fn list_media(&self, filter: &MediaFilter) -> CmsResult<(Vec<MediaItem>, u64)>;
    async fn delete_media(&self, id: &str) -> CmsResult<bool>;

    // Users

    async fn find_user(&self, id: &str) -> CmsResult<Option<CmsUser>>;
    async fn find_user_by_username(&self, username: &str) -> CmsResult<Option<CmsUser>>;
    async fn find_user_by_email(&self, email: &str) -> CmsResult<Option<CmsUser>>;
    async fn list_users(&self) -> CmsResult<Vec<CmsUser>>;
    /// Fails with `Conflict` when the username is taken.
    async fn insert_user(&self, user: &CmsUser) -> CmsResult<()>;
    async fn record_login(&self, id: &str, at: DateTime<Utc>) -> CmsResult<()>;
    async fn set_user_role(&self, id: &str, role: &str, role_id: Option<&str>) -> CmsResult<()>;
    async fn users_without_role_id(&self) -> CmsResult<Vec<CmsUser>>;

    // Roles

    async fn list_roles(&self) -> CmsResult<Vec<Role>>;
    async fn find_role(&self, id: &str) -> CmsResult<Option<Role>>;
    async fn find_role_by_name(&self, name: &str) -> CmsResult<Option<Role>>;
    /// Fails with `Conflict` when the name is taken.
    async fn insert_role(&self, role: &Role) -> CmsResult<()>;
    async fn update_role(&self, role: &Role) -> CmsResult<()>;
    /// Deletes the role and moves its users to `reassign_to`, or clears their
    /// `role_id` when that is `None`. Both happen in one transaction.
    async fn delete_role(&self, id: &str, reassign_to: Option<&str>) -> CmsResult<bool>;

    // Settings

    async fn get_setting(&self, key: &str) -> CmsResult<Option<Setting>>;
    async fn put_setting(&self, key: &str, value: &str) -> CmsResult<()>;
}

/// Opens the configured backend and brings its schema up to date.
///
/// Safe to call against an existing database: tables and indexes are only
/// created when missing and column migrations only add columns.
pub async fn initialize(config: &DbConfig) -> CmsResult<Arc<dyn Store>> {
    match config.driver {
        Driver::Sqlite => Ok(Arc::new(SqliteStore::connect(config).await?)),
        Driver::Postgres => {
            let url = config.url.as_deref().ok_or_else(|| {
                CmsError::Configuration("postgres driver requires a connection url".to_string())
            })?;
            Ok(Arc::new(PostgresStore::connect(url, config.max_connections).await?))
        }
    }
}

/// Owned database handle, initialized once at startup.
#[derive(Default)]
pub struct Database {
    store: OnceCell<Arc<dyn Store>>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes on first call; later calls return the existing store.
    pub async fn initialize(&self, config: &DbConfig) -> CmsResult<Arc<dyn Store>> {
        if let Some(store) = self.store.get() {
            return Ok(store.clone());
        }
        let store = initialize(config).await?;
        log::info!("Database initialized ({})", store.driver());
        Ok(self.store.get_or_init(|| store).clone())
    }

    /// The active store, or `Uninitialized` before [`initialize`](Self::initialize).
    pub fn store(&self) -> CmsResult<Arc<dyn Store>> {
        self.store.get().cloned().ok_or(CmsError::Uninitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.store.get().is_some()
    }
}

/// Maps unique-constraint violations to `Conflict`.
pub(crate) fn map_unique(err: sea_orm::DbErr, message: &str) -> CmsError {
    let text = err.to_string();
    if text.contains("UNIQUE") || text.contains("duplicate key") {
        CmsError::Conflict(message.to_string())
    } else {
        CmsError::Database(err)
    }
}
