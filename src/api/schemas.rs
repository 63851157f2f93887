//! Compiled JSON Schemas for request validation.
//!
//! Schemas are compiled once, on first use, and reused for every request;
//! compiling a `JSONSchema` is not cheap enough to redo per-request.

use jsonschema::JSONSchema;
use once_cell::sync::Lazy;

use crate::error::ValidationError;

static DATASETS_SCHEMA: Lazy<JSONSchema> = Lazy::new(|| {
    let schema = include_str!("schema/datasets.schema.json");
    let schema = serde_json::from_str(schema).expect("invalid JSON schema for DATASETS_SCHEMA");
    JSONSchema::compile(&schema).expect("invalid JSON schema for DATASETS_SCHEMA")
});

/// Validates `instance` against the dataset-creation schema, collecting every
/// violation rather than stopping at the first.
pub fn validate_dataset_request(instance: &serde_json::Value) -> Result<(), ValidationError> {
    DATASETS_SCHEMA.validate(instance).map_err(|errors| ValidationError::SchemaMismatch {
        errors: errors.map(|error| error.to_string()).collect(),
    })
}
