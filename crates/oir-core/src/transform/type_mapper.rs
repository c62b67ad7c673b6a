use std::collections::HashSet;

use serde_json::Value;

use crate::config::TargetLanguage;
use crate::ir::{MappedType, ModelId, ModelKind, ModelRegistry, Operation};

use super::name_normalizer::{IdentifierRole, identifier};

/// Fill `mapped` on every model node for each requested language.
pub fn map_models(registry: &mut ModelRegistry, languages: &[TargetLanguage]) {
    let view: &ModelRegistry = registry;
    let mapped: Vec<(ModelId, TargetLanguage, MappedType)> = view
        .arena
        .ids()
        .flat_map(|id| languages.iter().map(move |lang| (id, *lang)))
        .map(|(id, lang)| {
            let mapped = MappedType {
                type_name: model_type(view, id, lang),
                identifier: model_identifier(view, id, lang),
            };
            (id, lang, mapped)
        })
        .collect();
    for (id, lang, m) in mapped {
        registry.arena[id].mapped.insert(lang, m);
    }
}

/// Fill the per-language identifiers of every operation.
pub fn map_operations(operations: &mut [Operation], languages: &[TargetLanguage]) {
    for op in operations {
        op.identifiers = languages
            .iter()
            .map(|lang| {
                (
                    *lang,
                    identifier(&op.name.original, IdentifierRole::Operation, *lang),
                )
            })
            .collect();
    }
}

fn model_identifier(registry: &ModelRegistry, id: ModelId, lang: TargetLanguage) -> String {
    let model = &registry.arena[id];
    let role = if registry.is_named(id) {
        IdentifierRole::Model
    } else {
        IdentifierRole::Property
    };
    identifier(&model.name, role, lang)
}

/// The type expression for node `id` in `lang`.
///
/// The node itself is rendered structurally; named models reached through it
/// render as their identifier, which keeps recursive schemas finite.
pub fn model_type(registry: &ModelRegistry, id: ModelId, lang: TargetLanguage) -> String {
    let mut visited = HashSet::new();
    render(registry, id, lang, true, &mut visited)
}

fn render(
    registry: &ModelRegistry,
    id: ModelId,
    lang: TargetLanguage,
    top: bool,
    visited: &mut HashSet<ModelId>,
) -> String {
    let model = &registry.arena[id];
    if !top && registry.is_named(id) {
        let name = identifier(&model.name, IdentifierRole::Model, lang);
        return nullable(name, model.is_nullable, lang);
    }
    if !visited.insert(id) {
        return primitive("any", None, lang);
    }

    let base = match model.kind {
        ModelKind::Reference if registry.is_named(id) && model.base_type == model.name => {
            identifier(&model.name, IdentifierRole::Model, lang)
        }
        ModelKind::Reference => identifier(&model.base_type, IdentifierRole::Model, lang),
        ModelKind::OneOf | ModelKind::AnyOf | ModelKind::AllOf => {
            identifier(&model.name, IdentifierRole::Model, lang)
        }
        ModelKind::Primitive => primitive(&model.base_type, model.format.as_deref(), lang),
        ModelKind::Enum => enum_literal(&model.enum_values, lang),
        ModelKind::Array => {
            let inner = match model.link {
                Some(link) => {
                    let target = &registry.arena[registry.canonical(link)];
                    if target.kind == ModelKind::Enum {
                        primitive(&target.base_type, target.format.as_deref(), lang)
                    } else {
                        render(registry, link, lang, false, visited)
                    }
                }
                None => primitive("any", None, lang),
            };
            match lang {
                TargetLanguage::Typescript => format!("Array<{inner}>"),
                TargetLanguage::Python => format!("List[{inner}]"),
            }
        }
        ModelKind::Dictionary => {
            let inner = match model.link {
                Some(link) => render(registry, link, lang, false, visited),
                None => primitive("any", None, lang),
            };
            match lang {
                TargetLanguage::Typescript => format!("{{ [key: string]: {inner} }}"),
                TargetLanguage::Python => format!("Dict[str, {inner}]"),
            }
        }
    };
    visited.remove(&id);
    nullable(base, model.is_nullable, lang)
}

fn nullable(base: String, is_nullable: bool, lang: TargetLanguage) -> String {
    match (is_nullable, lang) {
        (false, _) => base,
        (true, TargetLanguage::Typescript) => format!("{base} | null"),
        (true, TargetLanguage::Python) => format!("Optional[{base}]"),
    }
}

/// Map a primitive base type (with its `format`) to a language type.
pub fn primitive(base_type: &str, format: Option<&str>, lang: TargetLanguage) -> String {
    let ty = match lang {
        TargetLanguage::Typescript => match (base_type, format) {
            ("string", Some("date" | "date-time")) => "Date",
            ("string", _) => "string",
            ("number" | "integer", _) => "number",
            ("boolean", _) => "boolean",
            ("null", _) => "null",
            ("binary", _) => "Blob",
            _ => "unknown",
        },
        TargetLanguage::Python => match (base_type, format) {
            ("string", Some("date")) => "date",
            ("string", Some("date-time")) => "datetime",
            ("string", _) => "str",
            ("number", _) => "float",
            ("integer", _) => "int",
            ("boolean", _) => "bool",
            ("null", _) => "None",
            ("binary", _) => "bytearray",
            _ => "Any",
        },
    };
    ty.to_string()
}

fn enum_literal(values: &[Value], lang: TargetLanguage) -> String {
    let literals: Vec<String> = values.iter().map(|v| literal(v, lang)).collect();
    match lang {
        TargetLanguage::Typescript => literals.join(" | "),
        TargetLanguage::Python => format!("Literal[{}]", literals.join(", ")),
    }
}

fn literal(value: &Value, lang: TargetLanguage) -> String {
    match (value, lang) {
        (Value::String(s), _) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        (Value::Bool(true), TargetLanguage::Python) => "True".to_string(),
        (Value::Bool(false), TargetLanguage::Python) => "False".to_string(),
        (Value::Null, TargetLanguage::Python) => "None".to_string(),
        (other, _) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Model;
    use serde_json::json;
    use TargetLanguage::{Python, Typescript};

    fn registry() -> ModelRegistry {
        let mut registry = ModelRegistry::default();
        // TreeNode { children: TreeNode[] }
        let tree = registry
            .arena
            .push(Model::new("TreeNode", ModelKind::Reference, "TreeNode"));
        registry.named.insert("TreeNode".to_string(), tree);
        let mut children = Model::new("children", ModelKind::Array, "array");
        children.link = Some(tree);
        let children = registry.arena.push(children);
        registry.arena[tree].properties.push(children);

        let mut color = Model::new("Color", ModelKind::Enum, "string");
        color.enum_values = vec![json!("red"), json!("green")];
        let color = registry.arena.push(color);
        registry.named.insert("Color".to_string(), color);
        registry
    }

    #[test]
    fn primitives_per_language() {
        assert_eq!(primitive("string", Some("date-time"), Typescript), "Date");
        assert_eq!(primitive("string", Some("date"), Python), "date");
        assert_eq!(primitive("string", Some("date-time"), Python), "datetime");
        assert_eq!(primitive("integer", None, Typescript), "number");
        assert_eq!(primitive("integer", None, Python), "int");
        assert_eq!(primitive("binary", None, Typescript), "Blob");
        assert_eq!(primitive("binary", None, Python), "bytearray");
        assert_eq!(primitive("any", None, Typescript), "unknown");
        assert_eq!(primitive("any", None, Python), "Any");
    }

    #[test]
    fn recursive_arrays_render_by_name() {
        let registry = registry();
        let children = ModelId(1);
        assert_eq!(model_type(&registry, children, Typescript), "Array<TreeNode>");
        assert_eq!(model_type(&registry, children, Python), "List[TreeNode]");
        assert_eq!(model_type(&registry, ModelId(0), Typescript), "TreeNode");
    }

    #[test]
    fn enums_render_as_literals() {
        let registry = registry();
        let color = registry.named_id("Color").unwrap();
        assert_eq!(model_type(&registry, color, Typescript), "'red' | 'green'");
        assert_eq!(model_type(&registry, color, Python), "Literal['red', 'green']");
    }

    #[test]
    fn arrays_of_enums_use_the_raw_type() {
        let mut registry = registry();
        let color = registry.named_id("Color").unwrap();
        let mut colors = Model::new("colors", ModelKind::Array, "array");
        colors.link = Some(color);
        let colors = registry.arena.push(colors);
        assert_eq!(model_type(&registry, colors, Typescript), "Array<string>");
        assert_eq!(model_type(&registry, colors, Python), "List[str]");
    }

    #[test]
    fn nullable_and_dictionaries() {
        let mut registry = registry();
        let value = registry.arena.push(Model::new("value", ModelKind::Primitive, "integer"));
        let mut scores = Model::new("scores", ModelKind::Dictionary, "dictionary");
        scores.link = Some(value);
        scores.is_nullable = true;
        let scores = registry.arena.push(scores);
        assert_eq!(
            model_type(&registry, scores, Typescript),
            "{ [key: string]: number } | null"
        );
        assert_eq!(model_type(&registry, scores, Python), "Optional[Dict[str, int]]");
    }

    #[test]
    fn identifiers_follow_roles() {
        let mut registry = registry();
        let class = registry.arena.push(Model::new("class", ModelKind::Primitive, "string"));
        map_models(&mut registry, &[Typescript, Python]);
        assert_eq!(registry.arena[class].mapped[&Python].identifier, "var_class");
        assert_eq!(registry.arena[class].mapped[&Typescript].identifier, "varClass");
        assert_eq!(registry.arena[ModelId(0)].mapped[&Python].identifier, "TreeNode");
    }
}
