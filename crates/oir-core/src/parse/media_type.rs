use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::schema::SchemaOrRef;

/// A media type object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOrRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, serde_json::Value>,
}

/// Pick the media type the generated client should speak: `application/json`
/// when offered, otherwise the first declared one.
pub fn preferred_media_type(
    content: &IndexMap<String, MediaType>,
) -> Option<(&String, &MediaType)> {
    content
        .get_key_value("application/json")
        .or_else(|| content.first())
}
