use std::collections::{BTreeMap, HashSet};

use indexmap::IndexMap;

use crate::ir::{ApiInfo, CodeGenData, ExtensionSite, ModelId, ModelRegistry, Operation, Service};

use super::name_normalizer::normalize_name;

/// Assemble the final IR from the built models and operations.
pub fn assemble(
    info: ApiInfo,
    registry: ModelRegistry,
    operations: Vec<Operation>,
    vendor_extensions: IndexMap<String, serde_json::Value>,
) -> CodeGenData {
    let all_operations = dedupe_operations(operations);

    let mut models: Vec<ModelId> = registry.named.values().copied().collect();
    models.sort_by(|a, b| registry.arena[*a].name.cmp(&registry.arena[*b].name));

    let mut operations_by_tag: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    let mut untagged_operations = Vec::new();
    for (index, op) in all_operations.iter().enumerate() {
        if op.tags.is_empty() {
            untagged_operations.push(index);
        }
        for tag in &op.tags {
            operations_by_tag.entry(tag.clone()).or_default().push(index);
        }
    }

    let mut services = Vec::with_capacity(operations_by_tag.len() + 1);
    if !untagged_operations.is_empty() {
        services.push(Service {
            name: normalize_name("default"),
            tag: None,
            operations: untagged_operations.clone(),
        });
    }
    services.extend(operations_by_tag.iter().map(|(tag, ops)| Service {
        name: normalize_name(tag),
        tag: Some(tag.clone()),
        operations: ops.clone(),
    }));

    let vendor_extension_sites = extension_sites(&vendor_extensions, &registry, &all_operations);

    log::debug!(
        "assembled {} models, {} operations, {} services",
        models.len(),
        all_operations.len(),
        services.len()
    );

    CodeGenData {
        info,
        model_arena: registry.arena,
        models,
        services,
        all_operations,
        operations_by_tag,
        untagged_operations,
        vendor_extensions,
        vendor_extension_sites,
    }
}

/// Keep the first operation per unique name.
fn dedupe_operations(operations: Vec<Operation>) -> Vec<Operation> {
    let mut seen = HashSet::new();
    operations
        .into_iter()
        .filter(|op| {
            let fresh = seen.insert(op.unique_name.clone());
            if !fresh {
                log::warn!(
                    "dropping {} {}: {} is already defined",
                    op.method.as_str(),
                    op.path,
                    op.unique_name
                );
            }
            fresh
        })
        .collect()
}

fn extension_sites(
    document: &IndexMap<String, serde_json::Value>,
    registry: &ModelRegistry,
    operations: &[Operation],
) -> BTreeMap<String, Vec<ExtensionSite>> {
    let mut sites: BTreeMap<String, Vec<ExtensionSite>> = BTreeMap::new();
    for key in document.keys() {
        sites.entry(key.clone()).or_default().push(ExtensionSite::Document);
    }
    for (id, model) in registry.arena.iter() {
        for key in model.vendor_extensions.keys() {
            sites.entry(key.clone()).or_default().push(ExtensionSite::Model(id));
        }
    }
    for (operation, op) in operations.iter().enumerate() {
        let mut record = |extensions: &IndexMap<String, serde_json::Value>, site: ExtensionSite| {
            for key in extensions.keys() {
                sites.entry(key.clone()).or_default().push(site);
            }
        };
        record(&op.vendor_extensions, ExtensionSite::Operation(operation));
        for (index, param) in op.parameters.iter().enumerate() {
            record(
                &param.vendor_extensions,
                ExtensionSite::Parameter { operation, index },
            );
        }
        for (index, response) in op.responses.iter().enumerate() {
            record(
                &response.vendor_extensions,
                ExtensionSite::Response { operation, index },
            );
        }
    }
    sites
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{HttpMethod, Model, ModelKind};

    fn op(unique_name: &str, tags: &[&str]) -> Operation {
        Operation {
            path: format!("/{unique_name}"),
            method: HttpMethod::Get,
            operation_id: unique_name.to_string(),
            name: normalize_name(unique_name),
            unique_name: unique_name.to_string(),
            tag_identities: Vec::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            parameters: Vec::new(),
            responses: Vec::new(),
            result: None,
            summary: None,
            description: None,
            deprecated: false,
            vendor_extensions: IndexMap::new(),
            identifiers: BTreeMap::new(),
        }
    }

    fn info() -> ApiInfo {
        ApiInfo {
            title: "T".to_string(),
            version: "1".to_string(),
            description: None,
        }
    }

    #[test]
    fn groups_services_default_first() {
        let ops = vec![
            op("zoo.list", &["zoo"]),
            op("ping", &[]),
            op("animals.list", &["animals", "zoo"]),
            op("ping", &[]),
        ];
        let data = assemble(info(), ModelRegistry::default(), ops, IndexMap::new());
        assert_eq!(data.all_operations.len(), 3);
        let names: Vec<&str> = data
            .services
            .iter()
            .map(|s| s.name.original.as_str())
            .collect();
        assert_eq!(names, ["default", "animals", "zoo"]);
        assert_eq!(data.services[0].tag, None);
        assert_eq!(data.operations_by_tag["zoo"], vec![0, 2]);
        assert_eq!(data.untagged_operations, vec![1]);
    }

    #[test]
    fn sorts_models_and_records_extension_sites() {
        let mut registry = ModelRegistry::default();
        for name in ["Zebra", "Apple"] {
            let mut model = Model::new(name, ModelKind::Reference, name);
            model
                .vendor_extensions
                .insert("x-internal".to_string(), serde_json::json!(true));
            let id = registry.arena.push(model);
            registry.named.insert(name.to_string(), id);
        }
        let mut document = IndexMap::new();
        document.insert("x-internal".to_string(), serde_json::json!("doc"));

        let data = assemble(info(), registry, Vec::new(), document);
        assert_eq!(data.models, vec![ModelId(1), ModelId(0)]);
        assert_eq!(data.find_model("Zebra"), Some(ModelId(0)));
        assert!(data.services.is_empty());
        assert_eq!(
            data.vendor_extension_sites["x-internal"],
            vec![
                ExtensionSite::Document,
                ExtensionSite::Model(ModelId(0)),
                ExtensionSite::Model(ModelId(1)),
            ]
        );
    }
}
