use oir_core::config::TargetLanguage;
use oir_core::transform::name_normalizer::{
    IdentifierRole, identifier, normalize_name, route_to_name,
};

#[test]
fn test_camel_case_input() {
    let n = normalize_name("updatePetStatus");
    assert_eq!(n.pascal_case, "UpdatePetStatus");
    assert_eq!(n.camel_case, "updatePetStatus");
    assert_eq!(n.snake_case, "update_pet_status");
    assert_eq!(n.screaming_snake, "UPDATE_PET_STATUS");
    assert_eq!(n.kebab_case, "update-pet-status");
}

#[test]
fn test_pascal_case_input() {
    let n = normalize_name("TreeNode");
    assert_eq!(n.pascal_case, "TreeNode");
    assert_eq!(n.camel_case, "treeNode");
    assert_eq!(n.snake_case, "tree_node");
}

#[test]
fn test_dotted_identity() {
    let n = normalize_name("users.list");
    assert_eq!(n.pascal_case, "UsersList");
    assert_eq!(n.camel_case, "usersList");
}

#[test]
fn test_path_like_input() {
    let n = normalize_name("/pets/{petId}");
    assert_eq!(n.pascal_case, "PetsPetId");
}

#[test]
fn test_route_names() {
    assert_eq!(route_to_name("GET", "/trees"), "listTrees");
    assert_eq!(route_to_name("GET", "/users/{id}"), "getUser");
    assert_eq!(route_to_name("POST", "/status"), "createStatus");
}

#[test]
fn test_reserved_identifiers() {
    use TargetLanguage::{Python, Typescript};
    assert_eq!(identifier("class", IdentifierRole::Property, Python), "var_class");
    assert_eq!(identifier("delete", IdentifierRole::Operation, Typescript), "callDelete");
    assert_eq!(identifier("None", IdentifierRole::Model, Python), "ModelNone");
    assert_eq!(identifier("Error", IdentifierRole::Model, Typescript), "Error");
}
