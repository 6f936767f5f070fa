//! UDF dictionary semantics: coercion, type checking, mutation.

mod common;

use benchtop_lims::{Error, UdfMap, UdfValue, UDF_NS};
use common::{test_client, BASE};

fn api(path: &str) -> String {
    format!("{BASE}/api/v2/{path}")
}

const ENTRY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<test-entry xmlns:udf="http://genologics.com/ri/userdefined">
<udf:field type="String" name="test">stuff</udf:field>
<udf:field type="Numeric" name="how much">42</udf:field>
</test-entry>"#;

fn udf_text(entity: &benchtop_lims::EntityRef, key: &str) -> Option<String> {
    entity
        .with_root(|root| {
            root.children_named(Some(UDF_NS), "field")
                .find(|f| f.attr("name") == Some(key))
                .and_then(|f| f.text())
        })
        .unwrap()
}

fn entry_map() -> (benchtop_lims::EntityRef, UdfMap, common::FakeTransport) {
    let (client, transport) = test_client();
    transport.respond(&api("samples/s1"), ENTRY);
    let entity = client.entity(&api("samples/s1"));
    let map = UdfMap::new(entity.clone());
    (entity, map, transport)
}

#[test]
fn test_get_coerces_by_declared_type() {
    let (_entity, map, _t) = entry_map();
    assert_eq!(
        map.get("test").unwrap(),
        Some(UdfValue::Text("stuff".to_string()))
    );
    assert_eq!(map.get("how much").unwrap(), Some(UdfValue::Numeric(42.0)));
    assert_eq!(map.get("absent").unwrap(), None);
}

#[test]
fn test_contains_and_get_or() {
    let (_entity, map, _t) = entry_map();
    assert!(map.contains("test").unwrap());
    assert!(!map.contains("absent").unwrap());
    assert_eq!(
        map.get_or("absent", UdfValue::Text("fallback".into()))
            .unwrap(),
        UdfValue::Text("fallback".to_string())
    );
}

#[test]
fn test_set_updates_existing_field() {
    let (entity, map, _t) = entry_map();
    map.set("test", "other").unwrap();
    assert_eq!(udf_text(&entity, "test").as_deref(), Some("other"));

    map.set("how much", 21i64).unwrap();
    assert_eq!(udf_text(&entity, "how much").as_deref(), Some("21"));
}

#[test]
fn test_set_text_into_numeric_field_is_type_error() {
    let (_entity, map, _t) = entry_map();
    match map.set("how much", "433") {
        Err(Error::UdfType {
            name,
            declared,
            got,
        }) => {
            assert_eq!(name, "how much");
            assert_eq!(declared, "Numeric");
            assert_eq!(got, "String");
        }
        other => panic!("expected UdfType error, got {other:?}"),
    }
    // The failed write left the field untouched.
    assert_eq!(map.get("how much").unwrap(), Some(UdfValue::Numeric(42.0)));
}

// There is deliberately no null UDF value: clearing a field is an explicit
// remove, never a write of a stringified null.
#[test]
fn test_remove_deletes_element() {
    let (entity, map, _t) = entry_map();
    map.remove("how much").unwrap();
    assert!(!map.contains("how much").unwrap());
    assert_eq!(udf_text(&entity, "how much"), None);
    assert!(matches!(
        map.remove("how much"),
        Err(Error::UdfNotFound { .. })
    ));
}

#[test]
fn test_set_creates_field_and_namespace_decl() {
    let (client, transport) = test_client();
    transport.respond(&api("samples/bare"), "<test-entry/>");
    let entity = client.entity(&api("samples/bare"));
    let map = UdfMap::new(entity.clone());

    map.set("Concentration", 1.5).unwrap();

    let xml = entity.to_xml().unwrap();
    assert!(xml.contains("xmlns:udf=\"http://genologics.com/ri/userdefined\""));
    assert!(xml.contains("<udf:field type=\"Numeric\" name=\"Concentration\">1.5</udf:field>"));
    assert_eq!(
        map.get("Concentration").unwrap(),
        Some(UdfValue::Numeric(1.5))
    );
}

#[test]
fn test_pairs_in_document_order_and_duplicates_shadow() {
    let (client, transport) = test_client();
    let doc = r#"<test-entry xmlns:udf="http://genologics.com/ri/userdefined">
<udf:field type="String" name="dup">first</udf:field>
<udf:field type="String" name="mid">between</udf:field>
<udf:field type="String" name="dup">second</udf:field>
</test-entry>"#;
    transport.respond(&api("samples/s1"), doc);
    let map = UdfMap::new(client.entity(&api("samples/s1")));

    // Indexing returns the first match...
    assert_eq!(
        map.get("dup").unwrap(),
        Some(UdfValue::Text("first".to_string()))
    );
    // ...iteration yields every field in document order.
    let pairs = map.pairs().unwrap();
    assert_eq!(
        pairs,
        vec![
            ("dup".to_string(), UdfValue::Text("first".to_string())),
            ("mid".to_string(), UdfValue::Text("between".to_string())),
            ("dup".to_string(), UdfValue::Text("second".to_string())),
        ]
    );
}

#[test]
fn test_clear_removes_all_fields() {
    let (entity, map, _t) = entry_map();
    map.clear().unwrap();
    assert!(map.pairs().unwrap().is_empty());
    assert!(!entity.to_xml().unwrap().contains("udf:field"));
}

#[test]
fn test_udt_scope_coexists_with_udfs() {
    let (client, transport) = test_client();
    let doc = r#"<test-entry xmlns:udf="http://genologics.com/ri/userdefined">
<udf:field type="String" name="plain">root level</udf:field>
<udf:type name="Chemistry">
<udf:field type="String" name="color">blue</udf:field>
</udf:type>
</test-entry>"#;
    transport.respond(&api("processes/p1"), doc);
    let entity = client.entity(&api("processes/p1"));
    let udfs = UdfMap::new(entity.clone());
    let udt = UdfMap::udt(entity.clone());

    assert_eq!(udt.udt_name().unwrap().as_deref(), Some("Chemistry"));
    assert_eq!(
        udt.get("color").unwrap(),
        Some(UdfValue::Text("blue".to_string()))
    );
    assert_eq!(udt.get("plain").unwrap(), None);
    assert_eq!(
        udfs.get("plain").unwrap(),
        Some(UdfValue::Text("root level".to_string()))
    );
    assert_eq!(udfs.get("color").unwrap(), None);

    // Writes stay in their scope.
    udt.set("color", "red").unwrap();
    assert_eq!(
        udt.get("color").unwrap(),
        Some(UdfValue::Text("red".to_string()))
    );
    assert_eq!(udfs.get("color").unwrap(), None);
}

#[test]
fn test_boolean_udf_roundtrip() {
    let (entity, map, _t) = entry_map();
    map.set("approved", true).unwrap();
    assert_eq!(udf_text(&entity, "approved").as_deref(), Some("true"));
    assert_eq!(
        map.get("approved").unwrap(),
        Some(UdfValue::Boolean(true))
    );
}
