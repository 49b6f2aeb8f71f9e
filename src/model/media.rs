use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// An uploaded file. `filename` is generated; `original_name` is what the
/// client sent.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub path: String,
    pub url: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub alt: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
}
