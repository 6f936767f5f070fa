use benchtop_xml::Document;

const ARTIFACT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<art:artifact xmlns:art="http://genologics.com/ri/artifact" xmlns:udf="http://genologics.com/ri/userdefined" uri="http://lims.example.com/api/v2/artifacts/a1">
  <name>Sample A</name>
  <output-type>Analyte</output-type>
  <qc-flag>PASSED</qc-flag>
  <working-flag>true</working-flag>
  <udf:field type="Numeric" name="Concentration">42</udf:field>
  <udf:field type="String" name="Comment">ok &amp; verified</udf:field>
</art:artifact>
"#;

const UDF_NS: &str = "http://genologics.com/ri/userdefined";

#[test]
fn test_parse_realistic_artifact() {
    let doc = Document::parse(ARTIFACT).unwrap();
    assert_eq!(doc.root.name.local, "artifact");
    assert_eq!(
        doc.root.name.ns.as_deref(),
        Some("http://genologics.com/ri/artifact")
    );
    assert_eq!(
        doc.root.attr("uri"),
        Some("http://lims.example.com/api/v2/artifacts/a1")
    );
    assert_eq!(
        doc.root.child(None, "name").unwrap().text().as_deref(),
        Some("Sample A")
    );

    let fields: Vec<_> = doc.root.children_named(Some(UDF_NS), "field").collect();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].attr("name"), Some("Concentration"));
    assert_eq!(fields[1].text().as_deref(), Some("ok & verified"));
}

#[test]
fn test_mutate_and_reserialize_preserves_context() {
    let mut doc = Document::parse(ARTIFACT).unwrap();
    doc.root
        .child_mut(None, "name")
        .unwrap()
        .set_text("Renamed");
    let xml = doc.to_xml().unwrap();

    // Untouched siblings and namespace declarations survive the rewrite.
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
    assert!(xml.contains("xmlns:art=\"http://genologics.com/ri/artifact\""));
    assert!(xml.contains("xmlns:udf=\"http://genologics.com/ri/userdefined\""));
    assert!(xml.contains("<name>Renamed</name>"));
    assert!(xml.contains("<qc-flag>PASSED</qc-flag>"));
    assert!(xml.contains("ok &amp; verified"));

    // And the result still parses to the same logical tree.
    let again = Document::parse(&xml).unwrap();
    assert_eq!(again, doc);
}

#[test]
fn test_canonical_roundtrip_is_stable() {
    let doc = Document::parse(ARTIFACT).unwrap();
    let first = doc.to_xml().unwrap();
    let second = Document::parse(&first).unwrap().to_xml().unwrap();
    assert_eq!(first, second);
}
