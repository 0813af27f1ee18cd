//! Schema utilities — describing structured shapes to the model and
//! validating what comes back.
//!
//! The schema of an action's arguments or an output's payload is declared
//! as a plain Rust type deriving [`schemars::JsonSchema`] (and `serde`
//! traits). From that one declaration this module produces:
//!
//! - the JSON-Schema value embedded in capability descriptors, so the
//!   model learns the expected shape;
//! - the validating deserializer used by decode handlers, so malformed
//!   model output becomes a typed [`DecodeError`] instead of an uncaught
//!   parse failure.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::error::DecodeError;

/// Generate the JSON-Schema value for a typed shape.
pub fn schema_value<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::r#gen::SchemaGenerator::default().into_root_schema_for::<T>();
    // A RootSchema is plain data; converting it to a Value cannot fail.
    serde_json::to_value(schema).expect("schema is always representable as JSON")
}

/// Canonical compact serialization of a schema value.
///
/// Object keys serialize in sorted order, so the same schema yields the
/// same string on every call — repeated prompt construction stays
/// reproducible and cache-friendly.
pub fn schema_descriptor(schema: &serde_json::Value) -> String {
    schema.to_string()
}

/// Parse tag content into its declared shape, attributing failures to the
/// tag occurrence.
///
/// Distinguishes content that is not JSON at all (`Malformed`) from JSON
/// that does not match the declared shape (`Validation`).
pub fn from_tagged_json<T: DeserializeOwned>(tag: &str, content: &str) -> Result<T, DecodeError> {
    serde_json::from_str(content.trim()).map_err(|err| match err.classify() {
        Category::Data => DecodeError::Validation {
            tag: tag.to_string(),
            detail: err.to_string(),
        },
        _ => DecodeError::Malformed {
            tag: tag.to_string(),
            detail: err.to_string(),
        },
    })
}
