//! sea-orm entities, one set per storage backend.
//!
//! Both sets map the same tables and convert into the types in
//! [`crate::model`]; only column types differ.

pub mod postgres;
pub mod sqlite;
