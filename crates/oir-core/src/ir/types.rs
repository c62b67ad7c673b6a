use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use super::models::{Model, ModelArena, ModelId};
use super::operations::Operation;

/// The generator-ready intermediate representation of an OpenAPI spec.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeGenData {
    pub info: ApiInfo,
    /// Every model node; [`ModelId`] indexes into it.
    pub model_arena: ModelArena,
    /// Named models, ordered by name.
    pub models: Vec<ModelId>,
    /// Default service first, then one per tag alphabetically.
    pub services: Vec<Service>,
    pub all_operations: Vec<Operation>,
    pub operations_by_tag: BTreeMap<String, Vec<usize>>,
    pub untagged_operations: Vec<usize>,
    pub vendor_extensions: IndexMap<String, serde_json::Value>,
    pub vendor_extension_sites: BTreeMap<String, Vec<ExtensionSite>>,
}

impl CodeGenData {
    pub fn model(&self, id: ModelId) -> &Model {
        &self.model_arena[id]
    }

    /// Look up a named model.
    pub fn find_model(&self, name: &str) -> Option<ModelId> {
        self.models
            .binary_search_by(|id| self.model_arena[*id].name.as_str().cmp(name))
            .ok()
            .map(|i| self.models[i])
    }

    /// The node defining the shape `id` refers to.
    pub fn canonical(&self, id: ModelId) -> ModelId {
        self.model_arena.canonical(id, |name| self.find_model(name))
    }

    pub fn operation(&self, unique_name: &str) -> Option<&Operation> {
        self.all_operations
            .iter()
            .find(|op| op.unique_name == unique_name)
    }

    pub fn service(&self, tag: Option<&str>) -> Option<&Service> {
        self.services.iter().find(|s| s.tag.as_deref() == tag)
    }
}

/// API metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A service groups operations by tag. The default service has no tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Service {
    pub name: NormalizedName,
    pub tag: Option<String>,
    /// Indices into `CodeGenData::all_operations`.
    pub operations: Vec<usize>,
}

/// A place carrying a vendor extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "kebab-case")]
pub enum ExtensionSite {
    Document,
    Model(ModelId),
    /// Index into `CodeGenData::all_operations`.
    Operation(usize),
    /// `index` into the operation's `parameters`.
    Parameter { operation: usize, index: usize },
    /// `index` into the operation's `responses`.
    Response { operation: usize, index: usize },
}

/// A name with multiple casing variants pre-computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedName {
    pub original: String,
    pub pascal_case: String,
    pub camel_case: String,
    pub snake_case: String,
    pub screaming_snake: String,
    pub kebab_case: String,
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}
