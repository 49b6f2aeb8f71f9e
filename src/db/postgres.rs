use super::sea::sea_store;
use super::Driver;
use crate::error::CmsResult;
use sea_orm::{ConnectOptions, ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use std::time::Duration;

/// Networked store for multi-instance deployments.
pub struct PostgresStore {
    db: DatabaseConnection,
}

const TABLES: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS cms_content (
        id VARCHAR(36) PRIMARY KEY,
        type VARCHAR(20) NOT NULL CHECK(type IN ('collection', 'singleton')),
        collection VARCHAR(100) NOT NULL,
        data JSONB NOT NULL DEFAULT '{}',
        status VARCHAR(20) NOT NULL DEFAULT 'draft' CHECK(status IN ('draft', 'published', 'archived')),
        sort_order INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP NOT NULL DEFAULT NOW(),
        published_at TIMESTAMP,
        created_by VARCHAR(36)
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_content_collection ON cms_content(collection)",
    "CREATE INDEX IF NOT EXISTS idx_content_type ON cms_content(type)",
    r#"CREATE UNIQUE INDEX IF NOT EXISTS idx_content_singleton
        ON cms_content(collection) WHERE type = 'singleton'"#,
    r#"CREATE TABLE IF NOT EXISTS cms_content_translations (
        id VARCHAR(36) PRIMARY KEY,
        content_id VARCHAR(36) NOT NULL REFERENCES cms_content(id) ON DELETE CASCADE,
        locale VARCHAR(10) NOT NULL,
        data JSONB NOT NULL DEFAULT '{}',
        created_at TIMESTAMP NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP NOT NULL DEFAULT NOW(),
        UNIQUE(content_id, locale)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS cms_media (
        id VARCHAR(36) PRIMARY KEY,
        filename VARCHAR(255) NOT NULL,
        original_name VARCHAR(255) NOT NULL,
        mime_type VARCHAR(100) NOT NULL,
        size BIGINT NOT NULL,
        path VARCHAR(500) NOT NULL,
        url VARCHAR(500),
        width INTEGER,
        height INTEGER,
        alt VARCHAR(255),
        metadata JSONB,
        created_at TIMESTAMP NOT NULL DEFAULT NOW(),
        created_by VARCHAR(36)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS cms_roles (
        id VARCHAR(36) PRIMARY KEY,
        name VARCHAR(50) NOT NULL UNIQUE,
        display_name VARCHAR(100) NOT NULL,
        description TEXT,
        permissions JSONB NOT NULL DEFAULT '{}',
        is_system BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMP NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP NOT NULL DEFAULT NOW()
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_roles_name ON cms_roles(name)",
    r#"CREATE TABLE IF NOT EXISTS cms_users (
        id VARCHAR(36) PRIMARY KEY,
        username VARCHAR(100) NOT NULL UNIQUE,
        password_hash VARCHAR(255) NOT NULL,
        email VARCHAR(255),
        name VARCHAR(255),
        avatar VARCHAR(500),
        locale VARCHAR(5) DEFAULT 'en',
        role VARCHAR(20) NOT NULL DEFAULT 'editor',
        role_id VARCHAR(36) REFERENCES cms_roles(id) ON DELETE SET NULL,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        last_login TIMESTAMP,
        created_at TIMESTAMP NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP NOT NULL DEFAULT NOW()
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_users_username ON cms_users(username)",
    r#"CREATE TABLE IF NOT EXISTS cms_settings (
        id SERIAL PRIMARY KEY,
        key VARCHAR(100) NOT NULL UNIQUE,
        value TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP NOT NULL DEFAULT NOW()
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_settings_key ON cms_settings(key)",
];

/// Upgrades for databases created by earlier releases. Each is a no-op when
/// already applied.
const MIGRATIONS: &[&str] = &[
    "ALTER TABLE cms_users ADD COLUMN IF NOT EXISTS role_id VARCHAR(36) REFERENCES cms_roles(id) ON DELETE SET NULL",
    "ALTER TABLE cms_users ADD COLUMN IF NOT EXISTS avatar VARCHAR(500)",
    "ALTER TABLE cms_users ADD COLUMN IF NOT EXISTS locale VARCHAR(5) DEFAULT 'en'",
    "UPDATE cms_users SET role = 'editor' WHERE role IS NULL",
    "ALTER TABLE cms_media ALTER COLUMN size TYPE BIGINT",
    "CREATE INDEX IF NOT EXISTS idx_users_role_id ON cms_users(role_id)",
];

impl PostgresStore {
    pub async fn connect(url: &str, max_connections: u32) -> CmsResult<Self> {
        let mut options = ConnectOptions::new(url.to_owned());
        options
            .max_connections(max_connections.max(1))
            .connect_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(20))
            .sqlx_logging(false);
        let db = sea_orm::Database::connect(options).await?;

        let store = Self { db };
        for sql in TABLES.iter().chain(MIGRATIONS) {
            store
                .db
                .execute(Statement::from_string(DbBackend::Postgres, (*sql).to_owned()))
                .await?;
        }
        Ok(store)
    }
}

sea_store!(PostgresStore, postgres, Driver::Postgres);
