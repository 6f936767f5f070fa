//! Serialization of the element tree back to XML text.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::element::{Element, Node};
use crate::error::Result;
use crate::Document;

/// Serializes a document with the standard XML declaration.
pub fn write_document(doc: &Document) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    write_element(&mut writer, &doc.root)?;
    Ok(String::from_utf8(writer.into_inner())?)
}

/// Serializes a single element without a declaration.
pub fn write_fragment(elem: &Element) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, elem)?;
    Ok(String::from_utf8(writer.into_inner())?)
}

fn write_element(writer: &mut Writer<Vec<u8>>, elem: &Element) -> Result<()> {
    let name = elem.name.qualified();
    let mut start = BytesStart::new(name.as_str());
    for attr in elem.attrs() {
        start.push_attribute((attr.name.as_str(), attr.value.as_str()));
    }

    if elem.nodes().is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for node in elem.nodes() {
        match node {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
    Ok(())
}
