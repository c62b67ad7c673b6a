pub mod components;
pub mod media_type;
pub mod normalize;
pub mod operation;
pub mod parameter;
pub mod ref_resolve;
pub mod request_body;
pub mod response;
pub mod schema;
pub mod spec;

use crate::error::ParseError;
use spec::OpenApiSpec;

/// Parse an OpenAPI spec from YAML.
pub fn from_yaml(input: &str) -> Result<OpenApiSpec, ParseError> {
    let raw: serde_json::Value = serde_yaml_ng::from_str(input)?;
    from_value(raw)
}

/// Parse an OpenAPI spec from JSON.
pub fn from_json(input: &str) -> Result<OpenApiSpec, ParseError> {
    let raw: serde_json::Value = serde_json::from_str(input)?;
    from_value(raw)
}

/// Normalize an already-parsed document and deserialize it.
pub fn from_value(raw: serde_json::Value) -> Result<OpenApiSpec, ParseError> {
    let normalized = normalize::normalize_document(raw)?;
    let spec: OpenApiSpec = serde_json::from_value(normalized)?;
    Ok(spec)
}
