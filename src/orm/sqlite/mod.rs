//! Entities for the embedded SQLite store.
//!
//! Timestamps are epoch milliseconds in INTEGER columns and JSON documents
//! are serialized into TEXT columns.

pub mod content;
pub mod content_translations;
pub mod media;
pub mod roles;
pub mod settings;
pub mod users;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

pub fn stamp(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub fn unstamp(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
}

pub fn doc(value: &Value) -> String {
    value.to_string()
}

pub fn doc_map(map: &Map<String, Value>) -> String {
    Value::Object(map.clone()).to_string()
}

pub fn undoc(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or_else(|e| {
        log::warn!("Unreadable JSON document in SQLite store: {}", e);
        Value::Null
    })
}
