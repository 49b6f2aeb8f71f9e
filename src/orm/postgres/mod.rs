//! Entities for the networked Postgres store.
//!
//! Timestamps are native TIMESTAMP (UTC) columns and documents are JSONB.

pub mod content;
pub mod content_translations;
pub mod media;
pub mod roles;
pub mod settings;
pub mod users;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

pub fn stamp(at: DateTime<Utc>) -> NaiveDateTime {
    at.naive_utc()
}

pub fn unstamp(at: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&at)
}

pub fn doc(value: &Value) -> Value {
    value.clone()
}

pub fn doc_map(map: &Map<String, Value>) -> Value {
    Value::Object(map.clone())
}

pub fn undoc(value: Value) -> Value {
    value
}
