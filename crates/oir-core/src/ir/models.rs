use std::collections::{BTreeMap, HashSet};
use std::ops::{Index, IndexMut};

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::TargetLanguage;

/// Index of a [`Model`] in its [`ModelArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ModelId(pub usize);

/// Shape of a model node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    Primitive,
    /// A named object, or an occurrence that refers to a named model.
    Reference,
    Array,
    Dictionary,
    Enum,
    OneOf,
    AnyOf,
    AllOf,
}

impl ModelKind {
    pub fn is_composite(self) -> bool {
        matches!(self, ModelKind::OneOf | ModelKind::AnyOf | ModelKind::AllOf)
    }

    pub fn is_container(self) -> bool {
        matches!(self, ModelKind::Array | ModelKind::Dictionary)
    }
}

/// A target-language rendering of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedType {
    #[serde(rename = "type")]
    pub type_name: String,
    pub identifier: String,
}

/// Discriminator with mapping values rewritten to model names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDiscriminator {
    pub property_name: String,
    pub mapping: IndexMap<String, String>,
}

/// One node of the schema graph.
///
/// Named models (component schemas and promoted inline schemas) are
/// registered by name; every other node is an anonymous occurrence carrying
/// the field, parameter or response name it was found under.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub name: String,
    #[serde(rename = "export")]
    pub kind: ModelKind,
    /// Primitive type name, `array`/`dictionary`, or the referenced model name.
    #[serde(rename = "type")]
    pub base_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub properties: Vec<ModelId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<ModelId>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<serde_json::Value>,
    pub is_nullable: bool,
    pub is_required: bool,
    pub is_read_only: bool,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub composed_models: Vec<ModelId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub composed_primitives: Vec<ModelId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<ModelDiscriminator>,
    pub mapped: BTreeMap<TargetLanguage, MappedType>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub vendor_extensions: IndexMap<String, serde_json::Value>,
}

impl Model {
    pub fn new(name: impl Into<String>, kind: ModelKind, base_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            base_type: base_type.into(),
            format: None,
            description: None,
            properties: Vec::new(),
            link: None,
            enum_values: Vec::new(),
            is_nullable: false,
            is_required: false,
            is_read_only: false,
            deprecated: false,
            composed_models: Vec::new(),
            composed_primitives: Vec::new(),
            discriminator: None,
            mapped: BTreeMap::new(),
            vendor_extensions: IndexMap::new(),
        }
    }

    /// A primitive node of type `any`.
    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, ModelKind::Primitive, "any")
    }
}

/// Flat storage for every model node. [`ModelId`]s index into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ModelArena(Vec<Model>);

impl ModelArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, model: Model) -> ModelId {
        self.0.push(model);
        ModelId(self.0.len() - 1)
    }

    pub fn get(&self, id: ModelId) -> Option<&Model> {
        self.0.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ModelId> + use<> {
        (0..self.0.len()).map(ModelId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelId, &Model)> {
        self.0.iter().enumerate().map(|(i, m)| (ModelId(i), m))
    }

    /// Follow reference occurrences and aliases to the node that defines the
    /// shape. `lookup` maps a model name to its registered id.
    pub fn canonical(&self, id: ModelId, lookup: impl Fn(&str) -> Option<ModelId>) -> ModelId {
        let mut current = id;
        let mut visited = HashSet::new();
        while visited.insert(current) {
            let model = &self[current];
            if model.kind != ModelKind::Reference {
                break;
            }
            match lookup(&model.base_type) {
                Some(next) if next != current => current = next,
                _ => break,
            }
        }
        current
    }
}

impl Index<ModelId> for ModelArena {
    type Output = Model;

    fn index(&self, id: ModelId) -> &Model {
        &self.0[id.0]
    }
}

impl IndexMut<ModelId> for ModelArena {
    fn index_mut(&mut self, id: ModelId) -> &mut Model {
        &mut self.0[id.0]
    }
}

/// The arena together with the name index of its named models.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    pub arena: ModelArena,
    pub named: IndexMap<String, ModelId>,
}

impl ModelRegistry {
    pub fn named_id(&self, name: &str) -> Option<ModelId> {
        self.named.get(name).copied()
    }

    pub fn canonical(&self, id: ModelId) -> ModelId {
        self.arena.canonical(id, |name| self.named_id(name))
    }

    /// Whether `id` is a registered named model.
    pub fn is_named(&self, id: ModelId) -> bool {
        self.named_id(&self.arena[id].name) == Some(id)
    }

    /// Whether `id` is a named object definition (not an alias or occurrence).
    pub fn is_object(&self, id: ModelId) -> bool {
        let model = &self.arena[id];
        model.kind == ModelKind::Reference && self.is_named(id) && model.base_type == model.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ModelRegistry {
        let mut registry = ModelRegistry::default();
        let pet = registry.arena.push(Model::new("Pet", ModelKind::Reference, "Pet"));
        let alias = registry
            .arena
            .push(Model::new("Animal", ModelKind::Reference, "Pet"));
        registry.named.insert("Pet".to_string(), pet);
        registry.named.insert("Animal".to_string(), alias);
        registry
    }

    #[test]
    fn canonical_follows_occurrences_and_aliases() {
        let mut registry = registry();
        let field = registry
            .arena
            .push(Model::new("friend", ModelKind::Reference, "Animal"));
        assert_eq!(registry.canonical(field), ModelId(0));
        assert!(registry.is_object(ModelId(0)));
        assert!(!registry.is_object(ModelId(1)));
        assert!(!registry.is_named(field));
    }

    #[test]
    fn field_named_like_its_target_still_resolves() {
        let mut registry = registry();
        let field = registry
            .arena
            .push(Model::new("Pet", ModelKind::Reference, "Pet"));
        assert_eq!(registry.canonical(field), ModelId(0));
        assert!(!registry.is_object(field));
    }

    #[test]
    fn canonical_stops_on_alias_loops() {
        let mut registry = ModelRegistry::default();
        let a = registry.arena.push(Model::new("A", ModelKind::Reference, "B"));
        let b = registry.arena.push(Model::new("B", ModelKind::Reference, "A"));
        registry.named.insert("A".to_string(), a);
        registry.named.insert("B".to_string(), b);
        assert_eq!(registry.canonical(a), a);
    }

    #[test]
    fn ids_serialize_as_indices() {
        let json = serde_json::to_value(ModelId(7)).unwrap();
        assert_eq!(json, serde_json::json!(7));
        let kind = serde_json::to_value(ModelKind::OneOf).unwrap();
        assert_eq!(kind, serde_json::json!("one-of"));
    }
}
