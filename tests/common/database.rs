//! Scratch SQLite databases for integration tests
#![allow(dead_code)]

use cairn::db::{initialize, DbConfig, Store};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// A freshly initialized store backed by a file in its own temporary
/// directory. The directory is removed when this is dropped.
pub struct TestDb {
    pub dir: TempDir,
    pub store: Arc<dyn Store>,
}

impl TestDb {
    pub fn path(&self) -> PathBuf {
        self.dir.path().join("cms.db")
    }

    pub fn config(&self) -> DbConfig {
        DbConfig::sqlite(self.path())
    }
}

/// Setup test database - create a temporary directory and bring the schema up
pub async fn setup_test_database() -> TestDb {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = initialize(&DbConfig::sqlite(dir.path().join("cms.db")))
        .await
        .expect("Failed to initialize test database");
    TestDb { dir, store }
}
