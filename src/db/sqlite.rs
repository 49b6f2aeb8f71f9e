use super::sea::sea_store;
use super::{DbConfig, Driver};
use crate::error::{CmsError, CmsResult};
use sea_orm::{ConnectOptions, ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use std::path::Path;

/// Embedded store backed by a single SQLite file.
pub struct SqliteStore {
    db: DatabaseConnection,
}

const TABLES: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS cms_content (
        id TEXT PRIMARY KEY,
        type TEXT NOT NULL CHECK(type IN ('collection', 'singleton')),
        collection TEXT NOT NULL,
        data TEXT NOT NULL DEFAULT '{}',
        status TEXT NOT NULL DEFAULT 'draft' CHECK(status IN ('draft', 'published', 'archived')),
        sort_order INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        published_at INTEGER,
        created_by TEXT
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_content_collection ON cms_content(collection)",
    "CREATE INDEX IF NOT EXISTS idx_content_type ON cms_content(type)",
    r#"CREATE UNIQUE INDEX IF NOT EXISTS idx_content_singleton
        ON cms_content(collection) WHERE type = 'singleton'"#,
    r#"CREATE TABLE IF NOT EXISTS cms_content_translations (
        id TEXT PRIMARY KEY,
        content_id TEXT NOT NULL,
        locale TEXT NOT NULL,
        data TEXT NOT NULL DEFAULT '{}',
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        FOREIGN KEY (content_id) REFERENCES cms_content(id) ON DELETE CASCADE
    )"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS idx_translation_content_locale
        ON cms_content_translations(content_id, locale)"#,
    r#"CREATE TABLE IF NOT EXISTS cms_media (
        id TEXT PRIMARY KEY,
        filename TEXT NOT NULL,
        original_name TEXT NOT NULL,
        mime_type TEXT NOT NULL,
        size INTEGER NOT NULL,
        path TEXT NOT NULL,
        url TEXT,
        width INTEGER,
        height INTEGER,
        alt TEXT,
        metadata TEXT,
        created_at INTEGER NOT NULL,
        created_by TEXT
    )"#,
    r#"CREATE TABLE IF NOT EXISTS cms_roles (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        display_name TEXT NOT NULL,
        description TEXT,
        permissions TEXT NOT NULL DEFAULT '{}',
        is_system INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_roles_name ON cms_roles(name)",
    r#"CREATE TABLE IF NOT EXISTS cms_users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        email TEXT,
        name TEXT,
        avatar TEXT,
        locale TEXT DEFAULT 'en',
        role TEXT NOT NULL DEFAULT 'editor',
        role_id TEXT REFERENCES cms_roles(id) ON DELETE SET NULL,
        active INTEGER NOT NULL DEFAULT 1,
        last_login INTEGER,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_users_username ON cms_users(username)",
    r#"CREATE TABLE IF NOT EXISTS cms_settings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        key TEXT NOT NULL UNIQUE,
        value TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )"#,
];

/// Columns added to `cms_users` after the first release.
const USER_COLUMNS: &[(&str, &str)] = &[
    ("avatar", "ALTER TABLE cms_users ADD COLUMN avatar TEXT"),
    ("locale", "ALTER TABLE cms_users ADD COLUMN locale TEXT DEFAULT 'en'"),
    (
        "role_id",
        "ALTER TABLE cms_users ADD COLUMN role_id TEXT REFERENCES cms_roles(id) ON DELETE SET NULL",
    ),
];

impl SqliteStore {
    pub async fn connect(config: &DbConfig) -> CmsResult<Self> {
        let url = match config.url.as_deref() {
            Some(url) => url.to_owned(),
            None => {
                ensure_parent_dir(&config.filename)?;
                format!("sqlite://{}?mode=rwc", config.filename.display())
            }
        };

        let mut options = ConnectOptions::new(url);
        options
            .max_connections(config.max_connections.max(1))
            .sqlx_logging(false);
        let db = sea_orm::Database::connect(options).await?;

        let store = Self { db };
        store.execute("PRAGMA journal_mode=WAL").await?;
        store.execute("PRAGMA foreign_keys=ON").await?;
        store.create_tables().await?;
        store.migrate_columns().await?;
        Ok(store)
    }

    async fn execute(&self, sql: &str) -> CmsResult<()> {
        self.db
            .execute(Statement::from_string(DbBackend::Sqlite, sql.to_owned()))
            .await?;
        Ok(())
    }

    async fn create_tables(&self) -> CmsResult<()> {
        for sql in TABLES {
            self.execute(sql).await?;
        }
        Ok(())
    }

    async fn migrate_columns(&self) -> CmsResult<()> {
        let existing = self.user_columns().await?;
        for (column, sql) in USER_COLUMNS {
            if !existing.iter().any(|c| c == column) {
                log::info!("Adding cms_users.{} column", column);
                self.execute(sql).await?;
            }
        }
        self.execute("CREATE INDEX IF NOT EXISTS idx_users_role_id ON cms_users(role_id)")
            .await
    }

    async fn user_columns(&self) -> CmsResult<Vec<String>> {
        let rows = self
            .db
            .query_all(Statement::from_string(
                DbBackend::Sqlite,
                "PRAGMA table_info(cms_users)".to_owned(),
            ))
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String>("", "name").map_err(CmsError::from))
            .collect()
    }
}

fn ensure_parent_dir(path: &Path) -> CmsResult<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| {
                CmsError::Configuration(format!(
                    "cannot create database directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

sea_store!(SqliteStore, sqlite, Driver::Sqlite);
