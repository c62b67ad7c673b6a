use std::collections::HashSet;

use crate::error::TransformError;
use crate::ir::{Model, ModelId};

use super::model_builder::ModelBuilder;

/// Set `link` on every array and dictionary node.
///
/// Resolving a link can add nodes (anonymous element nodes, promoted inline
/// schemas), so the arena is walked until no unvisited node remains. Each
/// node is processed once; a recursive schema such as
/// `TreeNode { children: TreeNode[] }` ends with `children` linking back to
/// `TreeNode`.
pub fn resolve_links(builder: &mut ModelBuilder<'_>) -> Result<(), TransformError> {
    let mut visited: HashSet<ModelId> = HashSet::new();
    let mut i = 0;
    while i < builder.registry().arena.len() {
        resolve_node(builder, ModelId(i), &mut visited)?;
        i += 1;
    }
    Ok(())
}

fn resolve_node(
    builder: &mut ModelBuilder<'_>,
    id: ModelId,
    visited: &mut HashSet<ModelId>,
) -> Result<(), TransformError> {
    if !visited.insert(id) {
        return Ok(());
    }

    let model = &builder.registry().arena[id];
    if model.kind.is_container() && model.link.is_none() {
        let link = match builder.take_link_source(id) {
            Some(source) => match &source.schema {
                Some(schema) => builder.link_target(&source.hint, schema)?,
                None => builder.registry_mut().arena.push(Model::any(source.hint)),
            },
            None => builder.registry_mut().arena.push(Model::any("value")),
        };
        builder.registry_mut().arena[id].link = Some(link);
    }

    let model = &builder.registry().arena[id];
    let mut children = model.properties.clone();
    children.extend(model.link);
    for child in children {
        resolve_node(builder, child, visited)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ModelKind, ModelRegistry};
    use crate::parse;
    use crate::parse::ref_resolve::RefResolver;

    const TREE: &str = r##"
openapi: "3.0.3"
info: { title: T, version: "1" }
paths: {}
components:
  schemas:
    TreeNode:
      type: object
      properties:
        value: { type: string }
        children:
          type: array
          items: { $ref: "#/components/schemas/TreeNode" }
    Matrix:
      type: array
      items:
        type: array
        items: { type: number }
    Index:
      type: object
      additionalProperties:
        type: object
        properties:
          hits: { type: integer }
    Bag:
      type: object
"##;

    fn build() -> ModelRegistry {
        let spec = parse::from_yaml(TREE).unwrap();
        let mut builder = ModelBuilder::new(RefResolver::new(&spec));
        builder
            .add_components(spec.components.as_ref().unwrap())
            .unwrap();
        resolve_links(&mut builder).unwrap();
        builder.into_registry()
    }

    #[test]
    fn recursive_schema_links_back_to_itself() {
        let registry = build();
        let tree = registry.named_id("TreeNode").unwrap();
        let children = registry.arena[tree].properties[1];
        assert_eq!(registry.arena[children].kind, ModelKind::Array);
        assert_eq!(registry.arena[children].link, Some(tree));
    }

    #[test]
    fn nested_arrays_get_anonymous_links() {
        let registry = build();
        let matrix = registry.named_id("Matrix").unwrap();
        let row = registry.arena[matrix].link.unwrap();
        assert_eq!(registry.arena[row].kind, ModelKind::Array);
        let cell = registry.arena[row].link.unwrap();
        assert_eq!(registry.arena[cell].base_type, "number");
    }

    #[test]
    fn dictionary_values_are_promoted() {
        let registry = build();
        let index = registry.named_id("Index").unwrap();
        let value = registry.arena[index].link.unwrap();
        assert_eq!(registry.arena[value].name, "IndexValue");
        assert!(registry.is_object(value));
    }

    #[test]
    fn every_container_has_a_link() {
        let registry = build();
        let bag = registry.named_id("Bag").unwrap();
        let value = registry.arena[bag].link.unwrap();
        assert_eq!(registry.arena[value].base_type, "any");
        for (_, model) in registry.arena.iter() {
            if model.kind.is_container() {
                assert!(model.link.is_some(), "{} has no link", model.name);
            }
        }
    }
}
