//! Field schema engine.
//!
//! Content types are described with [`FieldDefinition`]s. A schema compiles
//! into a [`Validator`] and drives [`sanitize`].

pub mod definition;
pub mod sanitize;
pub mod validate;

pub use definition::{FieldDefinition, FieldsSchema};
pub use sanitize::{sanitize, sanitize_html, slugify};
pub use validate::{build_validator, SchemaError, ValidationErrors, Validator};
