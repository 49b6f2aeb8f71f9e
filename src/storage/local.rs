//! Local filesystem storage backend.

use super::{check_key, ByteStream, StorageBackend, StorageError, StorageObject};
use actix_web::web::{self, Bytes};
use async_trait::async_trait;
use futures::stream;
use std::fs;
use std::path::{Path, PathBuf};

/// Files stored flat in one upload directory.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage backend.
    ///
    /// The `base_path` directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;
        log::info!("LocalStorage initialized at {:?}", base_path);
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn get_file_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        check_key(key)?;
        Ok(self.base_path.join(key))
    }

    /// MIME type served for a stored file, from its extension.
    pub fn get_mime_type(filename: &str) -> &'static str {
        let ext = match filename.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => return "application/octet-stream",
        };
        match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            "pdf" => "application/pdf",
            "mp4" => "video/mp4",
            "webm" => "video/webm",
            _ => "application/octet-stream",
        }
    }
}

fn blocking_failed(e: actix_web::error::BlockingError) -> StorageError {
    StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn put_object(&self, data: Vec<u8>, key: &str) -> Result<(), StorageError> {
        let path = self.get_file_path(key)?;
        log::debug!("LocalStorage: put_object: {:?}", path);

        web::block(move || {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, data)
        })
        .await
        .map_err(blocking_failed)??;

        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<StorageObject, StorageError> {
        let path = self.get_file_path(key)?;
        log::debug!("LocalStorage: get_object: {:?}", path);

        let (buffer, metadata) = web::block(move || -> Result<_, StorageError> {
            let metadata = fs::metadata(&path)?;
            if !metadata.is_file() {
                return Err(StorageError::NotFound(path.display().to_string()));
            }
            Ok((fs::read(&path)?, metadata))
        })
        .await
        .map_err(blocking_failed)??;

        let last_modified = metadata.modified().ok().map(|t| {
            let datetime: chrono::DateTime<chrono::Utc> = t.into();
            datetime.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
        });
        let content_length = buffer.len() as u64;
        let body: ByteStream = Box::pin(stream::once(async move { Ok(Bytes::from(buffer)) }));

        Ok(StorageObject {
            body,
            content_length,
            content_type: Self::get_mime_type(key).to_string(),
            last_modified,
        })
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        let path = self.get_file_path(key)?;
        log::debug!("LocalStorage: delete_object: {:?}", path);

        web::block(move || fs::remove_file(&path))
            .await
            .map_err(blocking_failed)??;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.get_file_path(key)?;
        web::block(move || path.is_file())
            .await
            .map_err(blocking_failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_get_mime_type() {
        assert_eq!(LocalStorage::get_mime_type("a.JPG"), "image/jpeg");
        assert_eq!(LocalStorage::get_mime_type("a.webp"), "image/webp");
        assert_eq!(LocalStorage::get_mime_type("a.svg"), "image/svg+xml");
        assert_eq!(LocalStorage::get_mime_type("a.exe"), "application/octet-stream");
        assert_eq!(LocalStorage::get_mime_type("noext"), "application/octet-stream");
    }

    #[actix_rt::test]
    async fn test_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("uploads")).unwrap();

        storage.put_object(b"hello".to_vec(), "abc.txt").await.unwrap();
        assert!(storage.exists("abc.txt").await.unwrap());

        let mut object = storage.get_object("abc.txt").await.unwrap();
        assert_eq!(object.content_length, 5);
        assert_eq!(object.content_type, "application/octet-stream");
        let chunk = object.body.next().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"hello");

        storage.delete_object("abc.txt").await.unwrap();
        assert!(!storage.exists("abc.txt").await.unwrap());
        assert!(matches!(
            storage.delete_object("abc.txt").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[actix_rt::test]
    async fn test_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();
        assert!(matches!(
            storage.get_object("../etc/passwd").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
