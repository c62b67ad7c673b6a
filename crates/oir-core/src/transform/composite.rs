use std::collections::HashSet;

use crate::error::TransformError;
use crate::ir::{ModelId, ModelKind, ModelRegistry};

/// Split the constituents of every named composite into `composed_models`
/// and `composed_primitives`, rejecting composites whose members cannot be
/// told apart at runtime.
///
/// Runs after link resolution: array constituents are judged by their links.
pub fn flatten_composites(registry: &mut ModelRegistry) -> Result<(), TransformError> {
    let composites: Vec<ModelId> = registry
        .named
        .values()
        .copied()
        .filter(|id| registry.arena[*id].kind.is_composite())
        .collect();

    for id in composites {
        let (models, primitives) = partition(registry, id);
        let model = &registry.arena[id];

        let object_arrays = primitives
            .iter()
            .filter(|c| {
                let constituent = &registry.arena[**c];
                constituent.kind == ModelKind::Array && !has_scalar_elements(registry, **c)
            })
            .count();
        if object_arrays > 1 {
            return Err(TransformError::AmbiguousComposite {
                schema: model.name.clone(),
            });
        }

        if model.kind == ModelKind::AllOf {
            if let Some(first) = primitives.first() {
                return Err(TransformError::InvalidAllOf {
                    schema: model.name.clone(),
                    constituent: registry.arena[*first].name.clone(),
                });
            }
        }

        log::debug!(
            "{}: {} composed models, {} composed primitives",
            model.name,
            models.len(),
            primitives.len()
        );
        let model = &mut registry.arena[id];
        model.composed_models = models;
        model.composed_primitives = primitives;
    }
    Ok(())
}

fn partition(registry: &ModelRegistry, id: ModelId) -> (Vec<ModelId>, Vec<ModelId>) {
    registry.arena[id]
        .properties
        .iter()
        .copied()
        .partition(|c| refers_to_model(registry, *c))
}

/// An occurrence of a named model whose shape is not an enum or primitive.
fn refers_to_model(registry: &ModelRegistry, id: ModelId) -> bool {
    registry.arena[id].kind == ModelKind::Reference && !is_primitive(registry, id)
}

/// Whether `id` resolves to a scalar: a primitive or an enum.
pub(crate) fn is_primitive(registry: &ModelRegistry, id: ModelId) -> bool {
    let canonical = registry.canonical(id);
    matches!(
        registry.arena[canonical].kind,
        ModelKind::Primitive | ModelKind::Enum
    )
}

/// Whether the innermost elements of an array, looking through nested
/// arrays, are scalars.
fn has_scalar_elements(registry: &ModelRegistry, id: ModelId) -> bool {
    let mut visited = HashSet::new();
    let mut current = registry.canonical(id);
    while visited.insert(current) {
        let model = &registry.arena[current];
        if model.kind != ModelKind::Array {
            return is_primitive(registry, current);
        }
        match model.link {
            Some(link) => current = registry.canonical(link),
            None => return false,
        }
    }
    false
}

/// A one-of/any-of made only of scalars (two or more) cannot be decoded from
/// a response body.
pub(crate) fn is_ambiguous_response(registry: &ModelRegistry, id: ModelId) -> bool {
    let model = &registry.arena[registry.canonical(id)];
    if !matches!(model.kind, ModelKind::OneOf | ModelKind::AnyOf) {
        return false;
    }
    let has_container = model
        .composed_primitives
        .iter()
        .any(|c| registry.arena[*c].kind.is_container());
    model.composed_models.is_empty() && !has_container && model.composed_primitives.len() >= 2
}
