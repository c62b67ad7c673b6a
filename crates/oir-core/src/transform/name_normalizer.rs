use heck::{ToKebabCase, ToLowerCamelCase, ToPascalCase, ToShoutySnakeCase, ToSnakeCase};

use crate::config::TargetLanguage;
use crate::ir::NormalizedName;

/// Create a `NormalizedName` from an arbitrary string, computing all casing variants.
pub fn normalize_name(name: &str) -> NormalizedName {
    // Handle names that start with numbers or contain special chars
    let sanitized = sanitize_identifier(name);

    NormalizedName {
        original: name.to_string(),
        pascal_case: sanitized.to_pascal_case(),
        camel_case: sanitized.to_lower_camel_case(),
        snake_case: sanitized.to_snake_case(),
        screaming_snake: sanitized.to_shouty_snake_case(),
        kebab_case: sanitized.to_kebab_case(),
    }
}

/// What an identifier names; decides casing and the escape prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierRole {
    Model,
    Property,
    Operation,
}

impl IdentifierRole {
    fn escape_token(self) -> &'static str {
        match self {
            IdentifierRole::Model => "model_",
            IdentifierRole::Property => "var_",
            IdentifierRole::Operation => "call_",
        }
    }

    fn apply_case(self, name: &str, language: TargetLanguage) -> String {
        match (self, language) {
            (IdentifierRole::Model, _) => name.to_pascal_case(),
            (_, TargetLanguage::Typescript) => name.to_lower_camel_case(),
            (_, TargetLanguage::Python) => name.to_snake_case(),
        }
    }
}

const TYPESCRIPT_RESERVED: &[&str] = &[
    "any", "as", "async", "await", "boolean", "break", "case", "catch", "class", "const",
    "constructor", "continue", "debugger", "declare", "default", "delete", "do", "else", "enum",
    "export", "extends", "false", "finally", "for", "from", "function", "get", "if",
    "implements", "import", "in", "instanceof", "interface", "let", "module", "new", "null",
    "number", "of", "package", "private", "protected", "public", "require", "return", "set",
    "static", "string", "super", "switch", "symbol", "this", "throw", "true", "try", "type",
    "typeof", "undefined", "var", "void", "while", "with", "yield",
];

const PYTHON_RESERVED: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield", "bool", "bytes", "dict", "float", "int", "list", "object",
    "self", "str", "type",
];

/// Whether `word` is reserved in `language`.
pub fn is_reserved(word: &str, language: TargetLanguage) -> bool {
    match language {
        TargetLanguage::Typescript => TYPESCRIPT_RESERVED.contains(&word),
        TargetLanguage::Python => PYTHON_RESERVED.contains(&word),
    }
}

/// A safe identifier for `name` in `language`.
///
/// Reserved words and names starting with a digit get the role's escape
/// token prepended before the casing is applied again.
pub fn identifier(name: &str, role: IdentifierRole, language: TargetLanguage) -> String {
    let sanitized = sanitize_identifier(name);
    let cased = role.apply_case(&sanitized, language);
    let needs_escape = cased.is_empty()
        || cased.starts_with(|c: char| c.is_ascii_digit())
        || is_reserved(&cased, language);
    if needs_escape {
        role.apply_case(&format!("{}{}", role.escape_token(), sanitized), language)
    } else {
        cased
    }
}

/// Derive a camelCase operation name from HTTP method + path.
///
/// Examples:
/// - `GET /users` → `listUsers`
/// - `POST /users` → `createUser`
/// - `GET /users/{userId}` → `getUser`
/// - `PUT /users/{userId}` → `updateUser`
/// - `DELETE /users/{userId}` → `deleteUser`
/// - `PATCH /users/{userId}` → `patchUser`
/// - `POST /users/{userId}/messages` → `createUserMessage`
/// - `GET /users/{userId}/messages` → `listUserMessages`
pub fn route_to_name(method: &str, path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    // Collect non-parameter segments and track whether the path ends with a param
    let mut resource_parts: Vec<String> = Vec::new();
    let mut ends_with_param = false;

    for seg in &segments {
        if seg.starts_with('{') && seg.ends_with('}') {
            ends_with_param = true;
        } else {
            resource_parts.push(seg.to_string());
            ends_with_param = false;
        }
    }

    // Build the resource name from non-parameter path segments
    let method_upper = method.to_uppercase();
    let prefix = match method_upper.as_str() {
        "GET" if ends_with_param => "get",
        "GET" => "list",
        "POST" => "create",
        "PUT" => "update",
        "DELETE" => "delete",
        "PATCH" => "patch",
        "OPTIONS" => "options",
        "HEAD" => "head",
        "TRACE" => "trace",
        other => other,
    };

    if resource_parts.is_empty() {
        return prefix.to_string();
    }

    // For single-resource ops (ends with param), singularize the last segment
    // For collection ops (no trailing param), keep as-is
    let mut pascal_parts = String::new();
    for (i, part) in resource_parts.iter().enumerate() {
        let is_last = i == resource_parts.len() - 1;
        let word = if is_last && ends_with_param {
            singularize(part)
        } else {
            part.to_string()
        };
        pascal_parts.push_str(&word.to_pascal_case());
    }

    format!("{prefix}{pascal_parts}")
}

/// Naive singularization: strips trailing 's' if present.
fn singularize(word: &str) -> String {
    if word.ends_with("ies") && word.len() > 3 {
        format!("{}y", &word[..word.len() - 3])
    } else if word.ends_with("ses") || word.ends_with("xes") || word.ends_with("zes") {
        word[..word.len() - 2].to_string()
    } else if word.ends_with('s') && !word.ends_with("ss") && word.len() > 1 {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Sanitize a string to be a valid identifier.
fn sanitize_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_was_separator = false;

    for (i, ch) in name.chars().enumerate() {
        if ch.is_alphanumeric() {
            if i == 0 && ch.is_ascii_digit() {
                result.push('_');
            }
            if prev_was_separator && !result.is_empty() {
                result.push('_');
            }
            result.push(ch);
            prev_was_separator = false;
        } else {
            prev_was_separator = true;
        }
    }

    if result.is_empty() {
        return "unnamed".to_string();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_name() {
        let n = normalize_name("listModels");
        assert_eq!(n.pascal_case, "ListModels");
        assert_eq!(n.camel_case, "listModels");
        assert_eq!(n.snake_case, "list_models");
        assert_eq!(n.screaming_snake, "LIST_MODELS");
    }

    #[test]
    fn test_kebab_case() {
        let n = normalize_name("pet-store");
        assert_eq!(n.pascal_case, "PetStore");
        assert_eq!(n.camel_case, "petStore");
        assert_eq!(n.kebab_case, "pet-store");
        assert_eq!(normalize_name("userProfiles").kebab_case, "user-profiles");
    }

    #[test]
    fn test_identifier_casing_per_role() {
        use TargetLanguage::{Python, Typescript};
        assert_eq!(identifier("pet_owner", IdentifierRole::Model, Python), "PetOwner");
        assert_eq!(identifier("petOwner", IdentifierRole::Property, Python), "pet_owner");
        assert_eq!(identifier("pet_owner", IdentifierRole::Property, Typescript), "petOwner");
        assert_eq!(identifier("listPets", IdentifierRole::Operation, Python), "list_pets");
    }

    #[test]
    fn test_identifier_escapes_reserved_words() {
        use TargetLanguage::{Python, Typescript};
        assert_eq!(identifier("class", IdentifierRole::Property, Python), "var_class");
        assert_eq!(identifier("class", IdentifierRole::Property, Typescript), "varClass");
        assert_eq!(identifier("delete", IdentifierRole::Operation, Typescript), "callDelete");
        assert_eq!(identifier("delete", IdentifierRole::Operation, Python), "delete");
        assert_eq!(identifier("type", IdentifierRole::Property, Python), "var_type");
        assert_eq!(identifier("3dModel", IdentifierRole::Model, Python), "Model3dModel");
        assert_eq!(identifier("2fa", IdentifierRole::Property, Python), "var_2fa");
    }

    #[test]
    fn test_leading_number() {
        let n = normalize_name("3dModel");
        // heck preserves leading digits without underscore prefix
        assert_eq!(n.pascal_case, "3dModel");
        assert_eq!(n.snake_case, "3d_model");
    }

    #[test]
    fn test_special_chars() {
        let n = normalize_name("application/json");
        assert_eq!(n.pascal_case, "ApplicationJson");
    }

    #[test]
    fn test_route_to_name_list() {
        assert_eq!(route_to_name("GET", "/users"), "listUsers");
    }

    #[test]
    fn test_route_to_name_create() {
        assert_eq!(route_to_name("POST", "/users"), "createUsers");
    }

    #[test]
    fn test_route_to_name_get_single() {
        assert_eq!(route_to_name("GET", "/users/{userId}"), "getUser");
    }

    #[test]
    fn test_route_to_name_update() {
        assert_eq!(route_to_name("PUT", "/users/{userId}"), "updateUser");
    }

    #[test]
    fn test_route_to_name_delete() {
        assert_eq!(route_to_name("DELETE", "/users/{userId}"), "deleteUser");
    }

    #[test]
    fn test_route_to_name_patch() {
        assert_eq!(route_to_name("PATCH", "/users/{userId}"), "patchUser");
    }

    #[test]
    fn test_route_to_name_nested() {
        assert_eq!(
            route_to_name("POST", "/users/{userId}/messages"),
            "createUsersMessages"
        );
    }

    #[test]
    fn test_route_to_name_nested_get() {
        assert_eq!(
            route_to_name("GET", "/users/{userId}/messages"),
            "listUsersMessages"
        );
    }

    #[test]
    fn test_route_to_name_nested_single() {
        assert_eq!(
            route_to_name("GET", "/users/{userId}/messages/{messageId}"),
            "getUsersMessage"
        );
    }
}
