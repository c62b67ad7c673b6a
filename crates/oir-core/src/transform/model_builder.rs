use std::collections::{HashMap, HashSet};

use heck::ToPascalCase;

use crate::error::{ResolveError, TransformError};
use crate::ir::{Model, ModelDiscriminator, ModelId, ModelKind, ModelRegistry};
use crate::parse::components::Components;
use crate::parse::ref_resolve::{RefResolver, parse_ref_name};
use crate::parse::schema::{AdditionalProperties, Schema, SchemaOrRef, SchemaType, TypeSet};

/// How a schema is represented in the model graph.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Shape<'s> {
    Composite(ModelKind, &'s [SchemaOrRef]),
    Enum,
    Array,
    Object,
    /// Value schema, or `None` for free-form values.
    Dictionary(Option<&'s SchemaOrRef>),
    Primitive(&'static str),
}

impl<'s> Shape<'s> {
    pub(crate) fn of(schema: &'s Schema) -> Self {
        if !schema.one_of.is_empty() {
            return Shape::Composite(ModelKind::OneOf, &schema.one_of);
        }
        if !schema.any_of.is_empty() {
            return Shape::Composite(ModelKind::AnyOf, &schema.any_of);
        }
        if !schema.all_of.is_empty() {
            return Shape::Composite(ModelKind::AllOf, &schema.all_of);
        }
        if !schema.enum_values.is_empty() || schema.const_value.is_some() {
            return Shape::Enum;
        }
        match schema.primary_type() {
            Some(SchemaType::Array) => Shape::Array,
            Some(SchemaType::Object) => object_shape(schema),
            Some(SchemaType::String) if schema.format.as_deref() == Some("binary") => {
                Shape::Primitive("binary")
            }
            Some(SchemaType::String) => Shape::Primitive("string"),
            Some(SchemaType::Number) => Shape::Primitive("number"),
            Some(SchemaType::Integer) => Shape::Primitive("integer"),
            Some(SchemaType::Boolean) => Shape::Primitive("boolean"),
            Some(SchemaType::Null) => Shape::Primitive("null"),
            None if schema.items.is_some() => Shape::Array,
            None if !schema.properties.is_empty() || !schema.required.is_empty() => Shape::Object,
            None => match &schema.additional_properties {
                Some(AdditionalProperties::Schema(value)) => Shape::Dictionary(Some(value)),
                _ => Shape::Primitive("any"),
            },
        }
    }

    /// Shapes that always become named models.
    pub(crate) fn is_promoted(&self) -> bool {
        matches!(self, Shape::Object | Shape::Composite(..))
    }
}

fn object_shape(schema: &Schema) -> Shape<'_> {
    if !schema.properties.is_empty() {
        return Shape::Object;
    }
    match &schema.additional_properties {
        Some(AdditionalProperties::Schema(value)) => Shape::Dictionary(Some(value)),
        Some(AdditionalProperties::Bool(false)) => Shape::Object,
        _ => Shape::Dictionary(None),
    }
}

/// Element or value schema of a container node, waiting for the link resolver.
#[derive(Debug, Clone)]
pub(crate) struct LinkSource {
    pub hint: String,
    pub schema: Option<SchemaOrRef>,
}

/// Builds the model arena from component schemas and operation schemas.
pub struct ModelBuilder<'a> {
    resolver: RefResolver<'a>,
    registry: ModelRegistry,
    used_names: HashSet<String>,
    link_sources: HashMap<ModelId, LinkSource>,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(resolver: RefResolver<'a>) -> Self {
        Self {
            resolver,
            registry: ModelRegistry::default(),
            used_names: HashSet::new(),
            link_sources: HashMap::new(),
        }
    }

    pub fn resolver(&self) -> RefResolver<'a> {
        self.resolver
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ModelRegistry {
        &mut self.registry
    }

    pub fn into_registry(self) -> ModelRegistry {
        self.registry
    }

    /// Register and fill every component schema.
    ///
    /// All names are declared before any schema is filled, so references
    /// between components (including cycles) always find their target.
    pub fn add_components(&mut self, components: &Components) -> Result<(), TransformError> {
        for name in components.schemas.keys() {
            let id = self.registry.arena.push(Model::any(name.as_str()));
            self.registry.named.insert(name.clone(), id);
            self.used_names.insert(name.clone());
        }
        for (name, schema_or_ref) in &components.schemas {
            let id = self.registry.named[name];
            log::debug!("building component model {name}");
            self.fill(id, name, schema_or_ref)?;
        }
        Ok(())
    }

    /// Add an occurrence of `schema_or_ref` named `name`.
    ///
    /// The returned node is always fresh and anonymous, so callers may set
    /// per-site flags such as `is_required` on it. Inline objects and
    /// composites are promoted to a named model derived from `hint` and the
    /// occurrence refers to that model.
    pub fn occurrence(
        &mut self,
        name: &str,
        hint: &str,
        schema_or_ref: &SchemaOrRef,
    ) -> Result<ModelId, TransformError> {
        match schema_or_ref {
            SchemaOrRef::Ref { ref_path, nullable } => {
                let target = self.resolver.ref_target_name(ref_path)?;
                let mut model = Model::new(name, ModelKind::Reference, target);
                model.is_nullable = nullable.unwrap_or(false);
                Ok(self.registry.arena.push(model))
            }
            SchemaOrRef::Schema(schema) if Shape::of(schema).is_promoted() => {
                let target = self.promote(hint, schema_or_ref)?;
                let target_name = self.registry.arena[target].name.clone();
                let mut model = Model::new(name, ModelKind::Reference, target_name);
                model.is_nullable = schema.nullable.unwrap_or(false);
                model.description = schema.description.clone();
                Ok(self.registry.arena.push(model))
            }
            SchemaOrRef::Schema(_) => {
                let id = self.registry.arena.push(Model::any(name));
                self.fill(id, hint, schema_or_ref)?;
                Ok(id)
            }
        }
    }

    /// The node a container links to: the named model for refs and promoted
    /// schemas, a fresh anonymous node otherwise.
    pub fn link_target(
        &mut self,
        hint: &str,
        schema_or_ref: &SchemaOrRef,
    ) -> Result<ModelId, TransformError> {
        match schema_or_ref {
            SchemaOrRef::Ref { ref_path, .. } => {
                let target = self.resolver.ref_target_name(ref_path)?;
                let id = self
                    .registry
                    .named_id(target)
                    .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.clone()))?;
                Ok(self.registry.canonical(id))
            }
            SchemaOrRef::Schema(schema) if Shape::of(schema).is_promoted() => {
                self.promote(hint, schema_or_ref)
            }
            SchemaOrRef::Schema(_) => self.occurrence(hint, hint, schema_or_ref),
        }
    }

    pub(crate) fn take_link_source(&mut self, id: ModelId) -> Option<LinkSource> {
        self.link_sources.remove(&id)
    }

    /// Register a new named model for an inline schema.
    fn promote(
        &mut self,
        hint: &str,
        schema_or_ref: &SchemaOrRef,
    ) -> Result<ModelId, TransformError> {
        let name = self.unique_name(hint);
        log::debug!("promoting inline schema to {name}");
        let id = self.registry.arena.push(Model::any(name.as_str()));
        self.registry.named.insert(name.clone(), id);
        self.fill(id, &name, schema_or_ref)?;
        Ok(id)
    }

    /// Fill node `id` from `schema_or_ref`. `hint` names promoted children.
    fn fill(
        &mut self,
        id: ModelId,
        hint: &str,
        schema_or_ref: &SchemaOrRef,
    ) -> Result<(), TransformError> {
        let schema = match schema_or_ref {
            SchemaOrRef::Ref { ref_path, nullable } => {
                let target = self.resolver.ref_target_name(ref_path)?;
                // an alias chain must end at a concrete schema
                self.resolver.canonical_name(ref_path)?;
                let model = &mut self.registry.arena[id];
                model.kind = ModelKind::Reference;
                model.base_type = target.to_string();
                model.is_nullable = nullable.unwrap_or(false);
                return Ok(());
            }
            SchemaOrRef::Schema(schema) => schema.as_ref(),
        };

        {
            let model = &mut self.registry.arena[id];
            model.description = schema.description.clone();
            model.format = schema.format.clone();
            model.is_nullable = schema.nullable.unwrap_or(false);
            model.is_read_only = schema.read_only.unwrap_or(false);
            model.deprecated = schema.deprecated.unwrap_or(false);
            model.vendor_extensions = schema.vendor_extensions();
        }

        match Shape::of(schema) {
            Shape::Object => {
                let own_name = self.registry.arena[id].name.clone();
                self.set_shape(id, ModelKind::Reference, &own_name);
                let properties = self.object_properties(hint, schema)?;
                self.registry.arena[id].properties = properties;
            }
            Shape::Composite(kind, branches) => {
                let own_name = self.registry.arena[id].name.clone();
                self.set_shape(id, kind, &own_name);
                let constituents = self.constituents(hint, kind, schema, branches)?;
                let model = &mut self.registry.arena[id];
                model.properties = constituents;
                model.discriminator = schema.discriminator.as_ref().map(|d| ModelDiscriminator {
                    property_name: d.property_name.clone(),
                    mapping: d
                        .mapping
                        .iter()
                        .map(|(value, target)| {
                            let name = parse_ref_name(target, "schemas").unwrap_or(target);
                            (value.clone(), name.to_string())
                        })
                        .collect(),
                });
            }
            Shape::Enum => {
                let model = &mut self.registry.arena[id];
                model.kind = ModelKind::Enum;
                model.enum_values = match &schema.const_value {
                    Some(value) if schema.enum_values.is_empty() => vec![value.clone()],
                    _ => schema.enum_values.clone(),
                };
                model.base_type = enum_base_type(schema, &model.enum_values).to_string();
            }
            Shape::Array => {
                self.set_shape(id, ModelKind::Array, "array");
                self.link_sources.insert(
                    id,
                    LinkSource {
                        hint: format!("{hint}Item"),
                        schema: schema.items.as_deref().cloned(),
                    },
                );
            }
            Shape::Dictionary(value) => {
                self.set_shape(id, ModelKind::Dictionary, "dictionary");
                self.link_sources.insert(
                    id,
                    LinkSource {
                        hint: format!("{hint}Value"),
                        schema: value.cloned(),
                    },
                );
            }
            Shape::Primitive(base_type) => {
                self.set_shape(id, ModelKind::Primitive, base_type);
            }
        }
        Ok(())
    }

    fn set_shape(&mut self, id: ModelId, kind: ModelKind, base_type: &str) {
        let model = &mut self.registry.arena[id];
        model.kind = kind;
        model.base_type = base_type.to_string();
    }

    fn object_properties(
        &mut self,
        parent: &str,
        schema: &Schema,
    ) -> Result<Vec<ModelId>, TransformError> {
        let mut properties = Vec::with_capacity(schema.properties.len());
        for (field, schema_or_ref) in &schema.properties {
            let hint = format!("{parent}{}", field.to_pascal_case());
            let child = self.occurrence(field, &hint, schema_or_ref)?;
            let model = &mut self.registry.arena[child];
            model.is_required = schema.required.contains(field);
            if let SchemaOrRef::Schema(s) = schema_or_ref {
                model.is_read_only = s.read_only.unwrap_or(false);
            }
            properties.push(child);
        }
        Ok(properties)
    }

    /// Constituent occurrences of a composite, skipping branches equal to an
    /// earlier one. An `allOf` schema that also declares its own properties
    /// gets an extra `<Parent>Properties` constituent.
    fn constituents(
        &mut self,
        parent: &str,
        kind: ModelKind,
        schema: &Schema,
        branches: &[SchemaOrRef],
    ) -> Result<Vec<ModelId>, TransformError> {
        let mut seen: Vec<&SchemaOrRef> = Vec::new();
        let mut constituents = Vec::new();
        for (i, branch) in branches.iter().enumerate() {
            if seen.iter().any(|s| self.resolver.same_schema(s, branch)) {
                log::debug!("{parent}: dropping duplicate constituent {}", i + 1);
                continue;
            }
            seen.push(branch);
            let hint = format!("{parent}Variant{}", i + 1);
            let name = match branch {
                SchemaOrRef::Ref { ref_path, .. } => self.resolver.ref_target_name(ref_path)?,
                SchemaOrRef::Schema(_) => hint.as_str(),
            }
            .to_string();
            constituents.push(self.occurrence(&name, &hint, branch)?);
        }

        if kind == ModelKind::AllOf && !schema.properties.is_empty() {
            let own = SchemaOrRef::Schema(Box::new(Schema {
                schema_type: Some(TypeSet::Single(SchemaType::Object)),
                properties: schema.properties.clone(),
                required: schema.required.clone(),
                ..Schema::default()
            }));
            let hint = format!("{parent}Properties");
            constituents.push(self.occurrence(&hint, &hint, &own)?);
        }
        Ok(constituents)
    }

    /// A unique PascalCase model name, appending numeric suffixes if needed.
    fn unique_name(&mut self, base: &str) -> String {
        let pascal = base.to_pascal_case();
        if self.used_names.insert(pascal.clone()) {
            return pascal;
        }
        let mut i = 2;
        loop {
            let candidate = format!("{}{}", pascal, i);
            if self.used_names.insert(candidate.clone()) {
                return candidate;
            }
            i += 1;
        }
    }
}

fn enum_base_type(schema: &Schema, values: &[serde_json::Value]) -> &'static str {
    match schema.primary_type() {
        Some(SchemaType::Integer) => "integer",
        Some(SchemaType::Number) => "number",
        Some(SchemaType::Boolean) => "boolean",
        Some(SchemaType::String) => "string",
        _ => match values.iter().find(|v| !v.is_null()) {
            Some(v) if v.is_i64() || v.is_u64() => "integer",
            Some(v) if v.is_number() => "number",
            Some(v) if v.is_boolean() => "boolean",
            _ => "string",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use crate::parse::spec::OpenApiSpec;

    fn spec(yaml: &str) -> OpenApiSpec {
        parse::from_yaml(yaml).unwrap()
    }

    fn build(spec: &OpenApiSpec) -> ModelRegistry {
        let mut builder = ModelBuilder::new(RefResolver::new(spec));
        builder
            .add_components(spec.components.as_ref().unwrap())
            .unwrap();
        builder.into_registry()
    }

    const SCHEMAS: &str = r##"
openapi: "3.0.3"
info: { title: T, version: "1" }
paths: {}
components:
  schemas:
    Pet:
      type: object
      required: [name]
      properties:
        name: { type: string }
        owner:
          type: object
          properties:
            email: { type: string }
        tags:
          type: array
          items: { type: string }
        status: { $ref: "#/components/schemas/Status" }
    Status:
      type: string
      enum: [available, sold]
    Labels:
      type: object
      additionalProperties: { type: string }
    Anything:
      type: object
    Closed:
      type: object
      additionalProperties: false
    Upload:
      type: string
      format: binary
    Shape:
      oneOf:
        - $ref: "#/components/schemas/Pet"
        - $ref: "#/components/schemas/Pet"
        - type: object
          properties:
            radius: { type: number }
    PetOwner:
      type: string
"##;

    #[test]
    fn builds_named_objects_with_occurrence_properties() {
        let registry = build(&spec(SCHEMAS));
        let pet = registry.named_id("Pet").unwrap();
        let model = &registry.arena[pet];
        assert_eq!(model.kind, ModelKind::Reference);
        assert_eq!(model.base_type, "Pet");
        assert!(registry.is_object(pet));

        let names: Vec<&str> = model
            .properties
            .iter()
            .map(|id| registry.arena[*id].name.as_str())
            .collect();
        assert_eq!(names, ["name", "owner", "tags", "status"]);

        let name = &registry.arena[model.properties[0]];
        assert!(name.is_required);
        assert_eq!(name.base_type, "string");

        let status = &registry.arena[model.properties[3]];
        assert_eq!(status.kind, ModelKind::Reference);
        assert_eq!(status.base_type, "Status");
        assert!(!status.is_required);
    }

    #[test]
    fn promotes_inline_objects_with_unique_names() {
        let registry = build(&spec(SCHEMAS));
        let pet = &registry.arena[registry.named_id("Pet").unwrap()];
        let owner = &registry.arena[pet.properties[1]];
        // `PetOwner` is taken by a component.
        assert_eq!(owner.base_type, "PetOwner2");
        let promoted = registry.named_id("PetOwner2").unwrap();
        assert!(registry.is_object(promoted));
        assert_eq!(registry.canonical(pet.properties[1]), promoted);
    }

    #[test]
    fn classifies_dictionaries_and_primitives() {
        let registry = build(&spec(SCHEMAS));
        let kind = |name: &str| registry.arena[registry.named_id(name).unwrap()].kind;
        assert_eq!(kind("Labels"), ModelKind::Dictionary);
        assert_eq!(kind("Anything"), ModelKind::Dictionary);
        assert_eq!(kind("Closed"), ModelKind::Reference);
        assert_eq!(kind("Status"), ModelKind::Enum);

        let upload = &registry.arena[registry.named_id("Upload").unwrap()];
        assert_eq!(upload.kind, ModelKind::Primitive);
        assert_eq!(upload.base_type, "binary");
    }

    #[test]
    fn deduplicates_composite_constituents() {
        let registry = build(&spec(SCHEMAS));
        let shape = &registry.arena[registry.named_id("Shape").unwrap()];
        assert_eq!(shape.kind, ModelKind::OneOf);
        assert_eq!(shape.base_type, "Shape");
        assert_eq!(shape.properties.len(), 2);
        let variant = &registry.arena[shape.properties[1]];
        assert_eq!(variant.base_type, "ShapeVariant3");
    }

    #[test]
    fn shape_of_untyped_schemas() {
        let items: Schema = serde_json::from_value(serde_json::json!({
            "items": { "type": "string" }
        }))
        .unwrap();
        assert!(matches!(Shape::of(&items), Shape::Array));

        let empty = Schema::default();
        assert!(matches!(Shape::of(&empty), Shape::Primitive("any")));

        let constant: Schema =
            serde_json::from_value(serde_json::json!({ "const": 3 })).unwrap();
        assert!(matches!(Shape::of(&constant), Shape::Enum));
    }
}
