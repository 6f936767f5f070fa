//! Event-stream parsing into the element tree.
//!
//! Uses `quick_xml::NsReader` so element names arrive with their namespace
//! already resolved. The reader splits character data at every entity
//! reference, so text pieces and resolved references are merged back into
//! one run first; only when an element closes are its runs edge-trimmed and
//! whitespace-only runs dropped. Trimming at the event level would eat the
//! spaces adjacent to each reference (`A &amp; B` → `A&B`).

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};

use crate::element::{Element, QName};
use crate::error::{Result, XmlError};
use crate::Document;

/// Parses a complete XML document.
pub fn parse_document(xml: &str) -> Result<Document> {
    let root = parse_element(xml)?;
    Ok(Document { root })
}

/// Parses the first (root) element of the input. Also accepts bare
/// fragments without an XML declaration.
pub fn parse_element(xml: &str) -> Result<Element> {
    let mut reader = NsReader::from_str(xml);

    // Open elements, innermost last. Finished elements attach to the new
    // top of the stack, or become the root when the stack empties.
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        match event {
            Event::Start(start) => {
                stack.push(element_from_start(ns, &start)?);
            }
            Event::Empty(start) => {
                let elem = element_from_start(ns, &start)?;
                attach(&mut stack, &mut root, elem)?;
            }
            Event::End(_) => {
                let mut elem = stack
                    .pop()
                    .ok_or_else(|| XmlError::Malformed("end tag with no open element".into()))?;
                elem.trim_text_runs();
                attach(&mut stack, &mut root, elem)?;
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    let raw = std::str::from_utf8(text.as_ref())?;
                    if raw.contains('&') {
                        top.push_text(quick_xml::escape::unescape(raw)?.into_owned());
                    } else {
                        top.push_text(raw);
                    }
                }
            }
            Event::CData(cdata) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(std::str::from_utf8(cdata.as_ref())?);
                }
            }
            Event::GeneralRef(entity) => {
                let top = stack
                    .last_mut()
                    .ok_or_else(|| XmlError::Malformed("entity reference outside root".into()))?;
                if let Some(ch) = entity.resolve_char_ref()? {
                    top.push_text(ch.to_string());
                } else {
                    let name = std::str::from_utf8(entity.as_ref())?;
                    match quick_xml::escape::resolve_predefined_entity(name) {
                        Some(s) => top.push_text(s),
                        None => return Err(XmlError::UnknownEntity(name.to_string())),
                    }
                }
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::Malformed("unclosed element at end of input".into()));
    }
    root.ok_or(XmlError::NoRoot)
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, elem: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.push_element(elem),
        None => {
            if root.is_some() {
                return Err(XmlError::Malformed("multiple root elements".into()));
            }
            *root = Some(elem);
        }
    }
    Ok(())
}

fn element_from_start(ns: ResolveResult, start: &BytesStart) -> Result<Element> {
    let raw_name = start.name();
    let local = std::str::from_utf8(raw_name.local_name().as_ref())?.to_string();
    let prefix = match raw_name.prefix() {
        Some(p) => Some(std::str::from_utf8(p.as_ref())?.to_string()),
        None => None,
    };
    let ns = match ns {
        ResolveResult::Bound(Namespace(uri)) => Some(std::str::from_utf8(uri)?.to_string()),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(p) => {
            return Err(XmlError::UnboundPrefix(
                String::from_utf8_lossy(&p).into_owned(),
            ));
        }
    };

    let mut elem = Element::from_name(QName { ns, prefix, local });
    // Keep every attribute, xmlns declarations included, so round trips
    // preserve the document's namespace context.
    for attr in start.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value()?.into_owned();
        elem.set_attr(key, value);
    }
    Ok(elem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_document() {
        let doc = parse_document(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <test-entry>\n<name>test name</name>\n</test-entry>",
        )
        .unwrap();
        assert_eq!(doc.root.name.local, "test-entry");
        let name = doc.root.child(None, "name").unwrap();
        assert_eq!(name.text().as_deref(), Some("test name"));
    }

    #[test]
    fn test_parse_resolves_namespaces() {
        let doc = parse_document(
            "<e xmlns:udf=\"http://genologics.com/ri/userdefined\">\
             <udf:field type=\"String\" name=\"test\">stuff</udf:field></e>",
        )
        .unwrap();
        let field = doc
            .root
            .child(Some("http://genologics.com/ri/userdefined"), "field")
            .unwrap();
        assert_eq!(field.attr("name"), Some("test"));
        assert_eq!(field.text().as_deref(), Some("stuff"));
        // The declaration itself is kept as a plain attribute.
        assert_eq!(
            doc.root.attr("xmlns:udf"),
            Some("http://genologics.com/ri/userdefined")
        );
    }

    #[test]
    fn test_parse_entity_references() {
        let doc = parse_document("<e><name>A &amp; B &lt;C&gt;</name></e>").unwrap();
        assert_eq!(
            doc.root.child(None, "name").unwrap().text().as_deref(),
            Some("A & B <C>")
        );
    }

    #[test]
    fn test_references_keep_adjacent_whitespace() {
        // The reader delivers "ok ", "&", " verified" as separate pieces;
        // the spaces around the reference must survive while indentation
        // between elements is still dropped.
        let doc = parse_document(
            "<e>\n  <comment>ok &amp; verified</comment>\n  <name> padded </name>\n</e>",
        )
        .unwrap();
        assert_eq!(
            doc.root.child(None, "comment").unwrap().text().as_deref(),
            Some("ok & verified")
        );
        assert_eq!(
            doc.root.child(None, "name").unwrap().text().as_deref(),
            Some("padded")
        );
        assert_eq!(doc.root.text(), None);
    }

    #[test]
    fn test_parse_self_closing_has_no_text() {
        let doc = parse_document("<e><k1/><k2>v</k2></e>").unwrap();
        assert_eq!(doc.root.child(None, "k1").unwrap().text(), None);
        assert_eq!(
            doc.root.child(None, "k2").unwrap().text().as_deref(),
            Some("v")
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_document("<e><unclosed></e>").is_err());
        assert!(parse_document("").is_err());
    }

    #[test]
    fn test_parse_unbound_prefix_is_error() {
        assert!(parse_document("<udf:field>x</udf:field>").is_err());
    }
}
