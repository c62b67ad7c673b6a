//! Canonicalizes a raw OpenAPI document into the single dialect the rest of
//! the pipeline understands: 3.0-style `nullable: true` flags and one `type`
//! per schema.
//!
//! 3.1 documents express nullability as `type: [T, "null"]` or as a
//! `{type: "null"}` branch of `anyOf`/`oneOf`. Both are rewritten here, on the
//! untyped `serde_json::Value`, before deserializing into [`OpenApiSpec`].
//!
//! [`OpenApiSpec`]: super::spec::OpenApiSpec

use serde_json::{Map, Value, json};

use crate::error::ParseError;

/// Which nullability convention a document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecDialect {
    /// OpenAPI 3.0.x: `nullable: true`.
    V30,
    /// OpenAPI 3.1 and later: JSON Schema null types.
    V31,
}

impl SpecDialect {
    /// Detect the dialect from the `openapi` version string.
    pub fn detect(version: &str) -> Result<Self, ParseError> {
        let mut parts = version.trim().split('.');
        let major = parts.next().unwrap_or_default();
        let minor = parts.next().and_then(|m| m.parse::<u32>().ok());
        match (major, minor) {
            ("3", Some(0)) => Ok(SpecDialect::V30),
            ("3", Some(_)) => Ok(SpecDialect::V31),
            _ => Err(ParseError::UnsupportedSpec(version.to_string())),
        }
    }
}

/// Keys whose values are literal data, never schemas.
const LITERAL_KEYS: &[&str] = &["example", "examples", "enum", "default", "const"];

/// Keys whose values are maps from arbitrary names to schema-bearing objects.
const NAMED_MAPS: &[&str] = &[
    "properties",
    "patternProperties",
    "schemas",
    "$defs",
    "definitions",
    "paths",
    "responses",
    "content",
    "parameters",
    "requestBodies",
    "headers",
    "callbacks",
    "encoding",
];

/// Normalize a raw document. Fails if the document is not OpenAPI 3.x.
pub fn normalize_document(mut doc: Value) -> Result<Value, ParseError> {
    let dialect = detect_document_dialect(&doc)?;
    log::debug!("normalizing document as {dialect:?}");
    if dialect == SpecDialect::V31 {
        normalize_node(&mut doc);
    }
    Ok(doc)
}

fn detect_document_dialect(doc: &Value) -> Result<SpecDialect, ParseError> {
    if let Some(version) = doc.get("openapi") {
        let version = match version {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return SpecDialect::detect(&version);
    }
    if let Some(swagger) = doc.get("swagger") {
        let version = swagger.as_str().map_or_else(|| swagger.to_string(), String::from);
        return Err(ParseError::UnsupportedSpec(version));
    }
    Err(ParseError::MissingField("openapi".to_string()))
}

fn normalize_node(value: &mut Value) {
    match value {
        Value::Object(map) => {
            collapse_type_array(map);
            collapse_null_branches(map, "anyOf");
            collapse_null_branches(map, "oneOf");

            for (key, child) in map.iter_mut() {
                if key.starts_with("x-") || LITERAL_KEYS.contains(&key.as_str()) {
                    continue;
                }
                if NAMED_MAPS.contains(&key.as_str()) {
                    if let Value::Object(named) = child {
                        for entry in named.values_mut() {
                            normalize_node(entry);
                        }
                        continue;
                    }
                }
                normalize_node(child);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                normalize_node(item);
            }
        }
        _ => {}
    }
}

/// `type: [T, "null"]` becomes `type: T, nullable: true`. Several non-null
/// types become an `anyOf` with one branch per type.
fn collapse_type_array(map: &mut Map<String, Value>) {
    let Some(Value::Array(types)) = map.get("type") else {
        return;
    };
    let non_null: Vec<Value> = types
        .iter()
        .filter(|t| t.as_str() != Some("null"))
        .cloned()
        .collect();
    let had_null = non_null.len() != types.len();

    match non_null.len() {
        0 => {
            map.insert("type".to_string(), json!("null"));
        }
        1 => {
            map.insert("type".to_string(), non_null[0].clone());
        }
        _ => {
            map.shift_remove("type");
            let branches: Vec<Value> = non_null
                .into_iter()
                .map(|t| split_branch(map, t))
                .collect();
            if map.contains_key("anyOf") {
                // Keep the declared anyOf and require one of the type branches as well.
                let mut all_of = match map.shift_remove("allOf") {
                    Some(Value::Array(existing)) => existing,
                    _ => Vec::new(),
                };
                all_of.push(json!({ "anyOf": branches }));
                map.insert("allOf".to_string(), Value::Array(all_of));
            } else {
                map.insert("anyOf".to_string(), Value::Array(branches));
            }
        }
    }

    if had_null {
        map.insert("nullable".to_string(), Value::Bool(true));
    }
}

/// Build the single-type branch for `type_name`, moving over the keywords that
/// only make sense for that type.
fn split_branch(map: &mut Map<String, Value>, type_name: Value) -> Value {
    let mut branch = Map::new();
    let moved: &[&str] = match type_name.as_str() {
        Some("array") => &["items", "minItems", "maxItems", "uniqueItems"],
        Some("object") => &["properties", "required", "additionalProperties"],
        _ => &[],
    };
    branch.insert("type".to_string(), type_name);
    for key in moved {
        if let Some(value) = map.shift_remove(*key) {
            branch.insert((*key).to_string(), value);
        }
    }
    Value::Object(branch)
}

/// Drop `{type: "null"}` branches from a composite, recording them as
/// `nullable: true`. A single surviving branch is hoisted into the parent.
fn collapse_null_branches(map: &mut Map<String, Value>, key: &str) {
    let Some(Value::Array(branches)) = map.get(key) else {
        return;
    };
    if !branches.iter().any(is_null_schema) {
        return;
    }
    let mut remaining: Vec<Value> = branches
        .iter()
        .filter(|b| !is_null_schema(b))
        .cloned()
        .collect();
    map.insert("nullable".to_string(), Value::Bool(true));

    match remaining.len() {
        0 => {
            map.shift_remove(key);
            map.insert("type".to_string(), json!("null"));
        }
        1 => {
            map.shift_remove(key);
            if let Value::Object(branch) = remaining.remove(0) {
                for (k, v) in branch {
                    map.entry(k).or_insert(v);
                }
            }
        }
        _ => {
            map.insert(key.to_string(), Value::Array(remaining));
        }
    }
}

fn is_null_schema(value: &Value) -> bool {
    let Value::Object(map) = value else {
        return false;
    };
    map.get("type").and_then(Value::as_str) == Some("null")
        && map
            .keys()
            .all(|k| matches!(k.as_str(), "type" | "description" | "title"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_schema(schema: Value) -> Value {
        json!({
            "openapi": "3.1.0",
            "info": { "title": "T", "version": "1" },
            "components": { "schemas": { "S": schema } }
        })
    }

    fn normalized_schema(schema: Value) -> Value {
        let doc = normalize_document(doc_with_schema(schema)).unwrap();
        doc["components"]["schemas"]["S"].clone()
    }

    #[test]
    fn detects_dialects() {
        assert_eq!(SpecDialect::detect("3.0.3").unwrap(), SpecDialect::V30);
        assert_eq!(SpecDialect::detect("3.1.0").unwrap(), SpecDialect::V31);
        assert_eq!(SpecDialect::detect("3.2.0").unwrap(), SpecDialect::V31);
        assert!(matches!(
            SpecDialect::detect("2.0"),
            Err(ParseError::UnsupportedSpec(v)) if v == "2.0"
        ));
        assert!(SpecDialect::detect("4.0.0").is_err());
    }

    #[test]
    fn rejects_swagger_documents() {
        let doc = json!({ "swagger": "2.0", "info": {} });
        assert!(matches!(
            normalize_document(doc),
            Err(ParseError::UnsupportedSpec(v)) if v == "2.0"
        ));
    }

    #[test]
    fn collapses_nullable_type_array() {
        let s = normalized_schema(json!({ "type": ["string", "null"], "format": "date" }));
        assert_eq!(s, json!({ "type": "string", "format": "date", "nullable": true }));
    }

    #[test]
    fn collapses_null_only_type_array() {
        let s = normalized_schema(json!({ "type": ["null"] }));
        assert_eq!(s["type"], json!("null"));
        assert_eq!(s["nullable"], json!(true));
    }

    #[test]
    fn splits_multi_type_array_into_any_of() {
        let s = normalized_schema(json!({
            "type": ["string", "array"],
            "items": { "type": "integer" }
        }));
        assert_eq!(
            s,
            json!({
                "anyOf": [
                    { "type": "string" },
                    { "type": "array", "items": { "type": "integer" } }
                ]
            })
        );
    }

    #[test]
    fn hoists_single_branch_of_null_union() {
        let s = normalized_schema(json!({
            "anyOf": [{ "$ref": "#/components/schemas/Pet" }, { "type": "null" }]
        }));
        assert_eq!(
            s,
            json!({ "nullable": true, "$ref": "#/components/schemas/Pet" })
        );
    }

    #[test]
    fn keeps_remaining_branches_of_null_union() {
        let s = normalized_schema(json!({
            "oneOf": [{ "type": "string" }, { "type": "integer" }, { "type": "null" }]
        }));
        assert_eq!(s["oneOf"].as_array().unwrap().len(), 2);
        assert_eq!(s["nullable"], json!(true));
    }

    #[test]
    fn descends_into_properties_named_like_keywords() {
        let s = normalized_schema(json!({
            "type": "object",
            "properties": {
                "default": { "type": ["integer", "null"] },
                "x-custom": { "type": ["boolean", "null"] }
            }
        }));
        assert_eq!(s["properties"]["default"]["type"], json!("integer"));
        assert_eq!(s["properties"]["x-custom"]["nullable"], json!(true));
    }

    #[test]
    fn leaves_literals_and_extensions_untouched() {
        let s = normalized_schema(json!({
            "type": "object",
            "example": { "type": ["string", "null"] },
            "x-meta": { "type": ["string", "null"] }
        }));
        assert_eq!(s["example"]["type"], json!(["string", "null"]));
        assert_eq!(s["x-meta"]["type"], json!(["string", "null"]));
    }

    #[test]
    fn leaves_v30_documents_alone() {
        let doc = json!({
            "openapi": "3.0.3",
            "info": { "title": "T", "version": "1" },
            "components": { "schemas": { "S": { "type": "string", "nullable": true } } }
        });
        assert_eq!(normalize_document(doc.clone()).unwrap(), doc);
    }
}
