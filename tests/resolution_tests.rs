//! Reference Resolution Tests
//!
//! Loads fragment-set fixtures and checks the inline/reference decisions and
//! the exported document for each.

use std::collections::HashSet;

use serde_json::json;

use familiar_refs::config::{ExportConfig, LoaderConfig};
use familiar_refs::{
    load_document, DocumentWriter, FragmentSet, LoadedDocument, NodeId, ReferenceResolver,
    ReferenceTable, SchemaKey,
};

fn load_fixture(content: &str) -> LoadedDocument {
    let set = FragmentSet::parse(content).unwrap();
    load_document(&set, &LoaderConfig::default()).unwrap()
}

fn petstore() -> LoadedDocument {
    load_fixture(include_str!("fixtures/petstore.json"))
}

fn node(doc: &LoadedDocument, key: SchemaKey) -> NodeId {
    doc.cache.get(&key).unwrap_or_else(|| panic!("{} not generated", key))
}

fn root(doc: &LoadedDocument, name: &str) -> NodeId {
    doc.roots
        .iter()
        .find(|(root_name, _)| root_name == name)
        .map(|(_, id)| *id)
        .unwrap_or_else(|| panic!("no root named {}", name))
}

fn assert_no_aliasing(table: &ReferenceTable) {
    let mut seen = HashSet::new();
    for (id, name) in table.named() {
        assert!(seen.insert(name), "name {} assigned twice (second: {})", name, id);
    }
}

// =============================================================================
// Scenario: one integer type reached from a property and an array
// =============================================================================

#[test]
fn test_shared_item_scenario() {
    let doc = load_fixture(include_str!("fixtures/shared_item.json"));
    let table = doc.resolve(false);

    let a = root(&doc, "A");
    let b = node(&doc, SchemaKey::new("B"));
    let c = root(&doc, "C");

    assert!(table.is_inline(a), "A is seen once");
    assert_eq!(table.name(b), Some("B"), "B is reached via A.x and C.items");
    assert!(table.is_inline(c), "C is seen once");
}

#[test]
fn test_shared_item_scenario_forced() {
    let doc = load_fixture(include_str!("fixtures/shared_item.json"));
    let table = doc.resolve(true);

    assert_eq!(table.name(root(&doc, "A")), Some("A"));
    assert_eq!(table.name(node(&doc, SchemaKey::new("B"))), Some("B"));
    // No identifier to name it by.
    assert!(table.is_inline(root(&doc, "C")));
}

// =============================================================================
// Polymorphism, sharing and collisions
// =============================================================================

#[test]
fn test_petstore_names() {
    let doc = petstore();
    let table = doc.resolve(false);

    let pet = node(&doc, SchemaKey::new("Pet"));
    let dog = node(&doc, SchemaKey::new("Dog"));
    let cat = node(&doc, SchemaKey::new("Cat"));
    let owner = node(&doc, SchemaKey::new("Owner"));
    let plain = node(&doc, SchemaKey::new("string"));
    let constrained = node(&doc, SchemaKey::with_context("string", &json!({ "minLength": 5 })));

    assert_eq!(table.name(dog), Some("PetDog"));
    assert_eq!(table.name(cat), Some("PetCat"));
    // Root of getPet, then reached again through Owner.pet.
    assert_eq!(table.name(pet), Some("Pet"));
    // Dog.name and Cat.name.
    assert_eq!(table.name(plain), Some("string"));
    // Owner.nickname and searchOwners.q: same type, different shape.
    assert_eq!(table.name(constrained), Some("string2"));
    assert!(table.is_inline(owner));

    assert_no_aliasing(&table);
}

#[test]
fn test_petstore_standalone_alternative_keeps_first_name() {
    let doc = petstore();
    let table = doc.resolve(true);

    // getDog hands out the same Dog fragment that Pet already named.
    assert_eq!(table.name(root(&doc, "getDog")), Some("PetDog"));
    assert_eq!(table.name(node(&doc, SchemaKey::new("Owner"))), Some("Owner"));
    assert_no_aliasing(&table);
}

#[test]
fn test_every_reachable_node_has_an_entry() {
    let doc = petstore();
    let table = doc.resolve(false);
    let arena = doc.cache.arena();

    for (_, root) in &doc.roots {
        for id in arena.reachable(*root) {
            assert!(table.contains(id), "{} was never registered", id);
        }
    }
}

#[test]
fn test_names_never_change_once_assigned() {
    let doc = petstore();
    let arena = doc.cache.arena();
    let mut resolver = ReferenceResolver::new();

    for (_, root) in &doc.roots {
        resolver.populate(arena, *root, false);
    }
    let before: Vec<(NodeId, String)> = resolver
        .table()
        .named()
        .into_iter()
        .map(|(id, name)| (id, name.to_string()))
        .collect();

    for (_, root) in doc.roots.iter().rev() {
        resolver.populate(arena, *root, true);
    }

    for (id, name) in before {
        assert_eq!(resolver.table().name(id), Some(name.as_str()));
    }
    assert_no_aliasing(resolver.table());
}

#[test]
fn test_naming_is_deterministic() {
    let first = petstore();
    let second = petstore();
    let a = first.resolve(false);
    let b = second.resolve(false);

    let names = |doc: &LoadedDocument, table: &ReferenceTable| -> Vec<(String, Option<String>)> {
        doc.cache
            .entries()
            .into_iter()
            .map(|(key, id)| (key.to_string(), table.name(id).map(str::to_string)))
            .collect()
    };
    assert_eq!(names(&first, &a), names(&second, &b));
}

// =============================================================================
// Well-known binary payloads
// =============================================================================

#[test]
fn test_uploads_use_preseeded_fragments() {
    let doc = load_fixture(include_str!("fixtures/uploads.json"));
    let table = doc.resolve(false);

    let file = node(&doc, SchemaKey::new("FormFile"));
    let files = node(&doc, SchemaKey::new("FormFileCollection"));
    let stream = node(&doc, SchemaKey::new("Stream"));

    assert_eq!(root(&doc, "replaceAvatar"), file);
    assert_eq!(table.name(file), Some("FormFile"));
    assert!(table.is_inline(files));
    assert!(table.is_inline(stream));
}

// =============================================================================
// Export
// =============================================================================

#[test]
fn test_petstore_export() {
    let doc = petstore();
    let table = doc.resolve(false);
    let config = ExportConfig::default();
    let document = DocumentWriter::new(doc.cache.arena(), &table, &config).document(&doc.roots);

    let schemas = document["components"]["schemas"].as_object().unwrap();
    let mut names: Vec<&str> = schemas.keys().map(String::as_str).collect();
    names.sort();
    assert_eq!(names, vec!["Pet", "PetCat", "PetDog", "string", "string2"]);

    assert_eq!(
        schemas["Pet"],
        json!({
            "anyOf": [
                { "$ref": "#/components/schemas/PetDog" },
                { "$ref": "#/components/schemas/PetCat" }
            ]
        })
    );
    assert_eq!(schemas["string2"], json!({ "type": "string", "minLength": 5 }));

    assert_eq!(document["roots"]["getPet"], json!({ "$ref": "#/components/schemas/Pet" }));
    let owner = &document["roots"]["listOwners"]["items"];
    assert_eq!(owner["properties"]["nickname"], json!({ "$ref": "#/components/schemas/string2" }));
    assert_eq!(owner["properties"]["pet"], json!({ "$ref": "#/components/schemas/Pet" }));
}

#[test]
fn test_export_reference_prefix() {
    let doc = load_fixture(include_str!("fixtures/shared_item.json"));
    let table = doc.resolve(false);
    let config = ExportConfig {
        reference_prefix: "#/definitions/".to_string(),
        ..ExportConfig::default()
    };
    let document = DocumentWriter::new(doc.cache.arena(), &table, &config).document(&doc.roots);

    assert_eq!(
        document["roots"]["C"],
        json!({ "type": "array", "items": { "$ref": "#/definitions/B" } })
    );
    assert_eq!(document["components"]["schemas"]["B"], json!({ "type": "integer" }));
}
