use super::extract::AuthUser;
use crate::content::query::{DEFAULT_PER_PAGE, MAX_PER_PAGE};
use crate::context::AppState;
use crate::db::{MediaFilter, MediaSortField, Paging};
use crate::error::{CmsError, CmsResult};
use crate::ip::client_key;
use crate::media::UploadedFile;
use crate::model::{Action, Resource};
use actix_multipart::{Field, Multipart};
use actix_web::http::header;
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse};
use futures::{StreamExt, TryStreamExt};
use serde::Deserialize;
use serde_json::json;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(list_media)
        .service(upload_media)
        .service(serve_file)
        .service(delete_media);
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaListParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    #[serde(rename = "type")]
    pub type_prefix: Option<String>,
    pub search: Option<String>,
    pub order_by: Option<String>,
    pub order_dir: Option<String>,
}

impl MediaListParams {
    fn into_filter(self) -> MediaFilter {
        let order_by = match self.order_by.as_deref() {
            Some("filename") => MediaSortField::Filename,
            Some("size") => MediaSortField::Size,
            _ => MediaSortField::CreatedAt,
        };
        MediaFilter {
            type_prefix: self.type_prefix.filter(|t| !t.is_empty()),
            search: self.search.filter(|s| !s.is_empty()),
            order_by,
            descending: self.order_dir.as_deref() != Some("asc"),
            paging: Paging {
                page: self.page.unwrap_or(1).max(1),
                per_page: self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
            },
        }
    }
}

#[get("/media")]
async fn list_media(
    user: AuthUser,
    state: web::Data<AppState>,
    params: web::Query<MediaListParams>,
) -> CmsResult<HttpResponse> {
    user.require(&state, Resource::Media, Action::Read, None).await?;

    let page = state.media.list(&params.into_inner().into_filter()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "data": page.items,
        "meta": {
            "total": page.total,
            "page": page.page,
            "perPage": page.per_page,
            "totalPages": page.total_pages,
        },
    })))
}

/// Reads a multipart field into memory, failing once it passes `limit`
/// bytes.
async fn read_field(field: &mut Field, limit: u64) -> CmsResult<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| CmsError::bad_request(format!("Upload failed: {}", e)))?;
        if (buf.len() + chunk.len()) as u64 > limit {
            return Err(CmsError::bad_request(format!(
                "File size exceeds maximum of {} bytes",
                limit
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

fn mime_name(mime: &mime::Mime) -> String {
    mime.essence_str().to_owned()
}

#[post("/media/upload")]
async fn upload_media(
    req: HttpRequest,
    user: AuthUser,
    state: web::Data<AppState>,
    mut multipart: Multipart,
) -> CmsResult<HttpResponse> {
    state.rate_limits.check_upload(&client_key(&req, state.config.server.trust_proxy))?;
    user.require(&state, Resource::Media, Action::Create, None).await?;

    let max_size = state.media.max_size();
    let mut file: Option<UploadedFile> = None;
    let mut alt: Option<String> = None;

    while let Some(mut field) = multipart
        .try_next()
        .await
        .map_err(|e| CmsError::bad_request(format!("Invalid upload: {}", e)))?
    {
        let field_name = field
            .content_disposition()
            .get_name()
            .unwrap_or("")
            .to_string();

        match field_name.as_str() {
            "file" => {
                let original_name = field
                    .content_disposition()
                    .get_filename()
                    .filter(|n| !n.is_empty())
                    .unwrap_or("file")
                    .to_string();
                let mime_type = field
                    .content_type()
                    .map(mime_name)
                    .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
                let data = read_field(&mut field, max_size).await?;
                file = Some(UploadedFile {
                    original_name,
                    mime_type,
                    data,
                    alt: None,
                });
            }
            "alt" => {
                let data = read_field(&mut field, 4096).await?;
                alt = Some(String::from_utf8_lossy(&data).trim().to_string());
            }
            _ => {
                // Drain unknown fields so the stream can advance.
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| CmsError::bad_request(format!("Upload failed: {}", e)))?;
                }
            }
        }
    }

    let mut file = match file {
        Some(file) if !file.data.is_empty() => file,
        _ => return Err(CmsError::bad_request("No file uploaded")),
    };
    file.alt = alt;

    let item = state.media.upload(file, Some(user.id())).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "id": item.id,
        "filename": item.filename,
        "url": item.url,
        "mimeType": item.mime_type,
        "size": item.size,
        "width": item.width,
        "height": item.height,
    })))
}

#[delete("/media/{id}")]
async fn delete_media(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> CmsResult<HttpResponse> {
    user.require(&state, Resource::Media, Action::Delete, None).await?;

    let id = path.into_inner();
    state.media.delete(&id).await?;
    log::info!("{} deleted media {}", user.0.username, id);
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// Serves an uploaded file. Public, and cached for a year since file names
/// are never reused.
#[get("/media/file/{filename}")]
async fn serve_file(state: web::Data<AppState>, path: web::Path<String>) -> CmsResult<HttpResponse> {
    let filename = path.into_inner();
    if filename.contains("..") {
        return Err(CmsError::bad_request("Invalid filename"));
    }

    let object = state.media.open(&filename).await?;
    let mut response = HttpResponse::Ok();
    response
        .insert_header((header::CONTENT_TYPE, object.content_type))
        .insert_header((header::CACHE_CONTROL, "public, max-age=31536000, immutable"))
        .no_chunking(object.content_length);
    if let Some(last_modified) = object.last_modified {
        response.insert_header((header::LAST_MODIFIED, last_modified));
    }
    Ok(response.streaming(object.body))
}
