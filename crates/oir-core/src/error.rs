use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedSpec(String),

    #[error("missing required field: {0}")]
    MissingField(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("circular reference detected: {0}")]
    CircularRef(String),

    #[error("invalid reference format: {0}")]
    InvalidRefFormat(String),

    #[error("reference target not found: {0}")]
    RefTargetNotFound(String),
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error(
        "schema {schema} defines a composite schema with multiple array types which cannot be distinguished at runtime"
    )]
    AmbiguousComposite { schema: String },

    #[error(
        "operation {operation} response {code} is a composite of primitive types which cannot be distinguished at runtime"
    )]
    AmbiguousResponse { operation: String, code: String },

    #[error("schema {schema} uses allOf to compose non-object schema {constituent}")]
    InvalidAllOf { schema: String, constituent: String },

    #[error("operation name {0} is used by more than one operation")]
    DuplicateOperationId(String),

    #[error("operationId {operation_id} is used by more than one operation tagged {tag}")]
    DuplicateTaggedOperationId { tag: String, operation_id: String },

    #[error("deduplicated operation id {0} is assigned to more than one operation")]
    DuplicateDeduplicatedOperationId(String),

    #[error("operation {operation} declares invalid response code {code}")]
    InvalidResponseCode { operation: String, code: String },
}
