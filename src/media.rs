//! Media library: validated uploads, listing, deletion and file serving.

use crate::app_config::UploadSettings;
use crate::content::Page;
use crate::db::{MediaFilter, Store};
use crate::error::{CmsError, CmsResult};
use crate::model::MediaItem;
use crate::storage::{StorageBackend, StorageError, StorageObject};
use chrono::Utc;
use image::ImageReader;
use std::io::Cursor;
use std::sync::Arc;
use uuid::Uuid;

/// A file received from a client, fully buffered.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub original_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub alt: Option<String>,
}

/// Whether `mime_type` is in `allowed`. Entries ending in `/*` match the
/// whole family.
pub fn mime_allowed(allowed: &[String], mime_type: &str) -> bool {
    allowed.iter().any(|entry| match entry.strip_suffix('*') {
        Some(prefix) if prefix.ends_with('/') => mime_type.starts_with(prefix),
        _ => entry == mime_type,
    })
}

/// Extension of a client file name including the dot, or empty. Only
/// alphanumeric extensions are kept.
fn extension_of(original_name: &str) -> String {
    let base = original_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(original_name);
    match base.rfind('.') {
        Some(idx) if idx > 0 => {
            let ext = &base[idx + 1..];
            if !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                format!(".{}", ext.to_ascii_lowercase())
            } else {
                String::new()
            }
        }
        _ => String::new(),
    }
}

/// Width and height of a raster image, read from its header. The format is
/// sniffed from the bytes; SVG and unreadable data yield `None`, as do
/// dimensions too large to store.
pub fn image_dimensions(buf: &[u8]) -> Option<(i32, i32)> {
    let reader = ImageReader::new(Cursor::new(buf)).with_guessed_format().ok()?;
    let (width, height) = match reader.into_dimensions() {
        Ok(dimensions) => dimensions,
        Err(e) => {
            log::debug!("Could not read image dimensions: {}", e);
            return None;
        }
    };
    Some((i32::try_from(width).ok()?, i32::try_from(height).ok()?))
}

#[derive(Clone)]
pub struct MediaService {
    store: Arc<dyn Store>,
    storage: Arc<dyn StorageBackend>,
    settings: UploadSettings,
}

impl MediaService {
    pub fn new(store: Arc<dyn Store>, storage: Arc<dyn StorageBackend>, settings: UploadSettings) -> Self {
        Self {
            store,
            storage,
            settings,
        }
    }

    pub fn max_size(&self) -> u64 {
        self.settings.max_size
    }

    fn file_url(&self, filename: &str) -> String {
        format!("{}/{}", self.settings.url_prefix.trim_end_matches('/'), filename)
    }

    /// Checks type and size, writes the file and records it.
    pub async fn upload(&self, file: UploadedFile, created_by: Option<&str>) -> CmsResult<MediaItem> {
        if !mime_allowed(&self.settings.allowed_types, &file.mime_type) {
            return Err(CmsError::bad_request(format!(
                "File type {} is not allowed",
                file.mime_type
            )));
        }
        let size = file.data.len() as u64;
        if size > self.settings.max_size {
            return Err(CmsError::bad_request(format!(
                "File size exceeds maximum of {} bytes",
                self.settings.max_size
            )));
        }

        let id = Uuid::new_v4().to_string();
        let filename = format!("{}{}", id, extension_of(&file.original_name));
        let dimensions = if file.mime_type.starts_with("image/") && !file.mime_type.contains("svg") {
            image_dimensions(&file.data)
        } else {
            None
        };

        let item = MediaItem {
            id,
            filename: filename.clone(),
            original_name: file.original_name,
            mime_type: file.mime_type,
            size: size as i64,
            path: filename.clone(),
            url: Some(self.file_url(&filename)),
            width: dimensions.map(|(w, _)| w),
            height: dimensions.map(|(_, h)| h),
            alt: file.alt.filter(|alt| !alt.is_empty()),
            metadata: None,
            created_at: Utc::now(),
            created_by: created_by.map(str::to_owned),
        };

        self.storage.put_object(file.data, &filename).await?;
        if let Err(e) = self.store.insert_media(&item).await {
            if let Err(cleanup) = self.storage.delete_object(&filename).await {
                log::warn!("Could not remove orphaned upload {}: {}", filename, cleanup);
            }
            return Err(e);
        }

        log::info!("Stored {} ({} bytes) as {}", item.original_name, size, filename);
        Ok(item)
    }

    pub async fn list(&self, filter: &MediaFilter) -> CmsResult<Page<MediaItem>> {
        let (items, total) = self.store.list_media(filter).await?;
        Ok(Page::new(items, total, filter.paging))
    }

    /// Removes the row and its file. A file that cannot be removed is
    /// logged and does not fail the request.
    pub async fn delete(&self, id: &str) -> CmsResult<()> {
        let item = self
            .store
            .find_media(id)
            .await?
            .ok_or_else(|| CmsError::not_found("Media"))?;

        match self.storage.delete_object(&item.path).await {
            Ok(()) | Err(StorageError::NotFound(_)) => {}
            Err(e) => log::error!("Failed to delete file {}: {}", item.path, e),
        }

        if !self.store.delete_media(id).await? {
            return Err(CmsError::not_found("Media"));
        }
        Ok(())
    }

    pub async fn open(&self, filename: &str) -> CmsResult<StorageObject> {
        Ok(self.storage.get_object(filename).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_mime_allow_list() {
        let list = allowed(&["image/*", "application/pdf"]);
        assert!(mime_allowed(&list, "image/png"));
        assert!(mime_allowed(&list, "image/svg+xml"));
        assert!(mime_allowed(&list, "application/pdf"));
        assert!(!mime_allowed(&list, "application/zip"));
        assert!(!mime_allowed(&list, "imagex/png"));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("photo.JPG"), ".jpg");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of(".hidden"), "");
        assert_eq!(extension_of("dir/evil.p/hp"), "");
        assert_eq!(extension_of("weird.p$p"), "");
    }

    fn encoded(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        let image = match format {
            image::ImageFormat::Jpeg => image::DynamicImage::new_rgb8(width, height),
            _ => image::DynamicImage::new_rgba8(width, height),
        };
        image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn test_dimensions_by_format() {
        use image::ImageFormat::*;

        assert_eq!(image_dimensions(&encoded(640, 480, Png)), Some((640, 480)));
        assert_eq!(image_dimensions(&encoded(300, 200, Gif)), Some((300, 200)));
        assert_eq!(image_dimensions(&encoded(160, 120, Jpeg)), Some((160, 120)));
        assert_eq!(image_dimensions(&encoded(100, 50, WebP)), Some((100, 50)));
    }

    #[test]
    fn test_truncated_and_unknown_images() {
        assert_eq!(image_dimensions(&[0x89, b'P']), None);
        assert_eq!(image_dimensions(&[0xff, 0xd8, 0xff]), None);
        assert_eq!(image_dimensions(b"<svg/>"), None);
        assert_eq!(image_dimensions(b"%PDF-1.4"), None);
    }
}
