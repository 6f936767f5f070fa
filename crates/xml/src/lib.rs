//! Namespace-aware XML document tree for the Benchtop LIMS client.
//!
//! The LIMS API speaks XML, and the client's job is read-modify-write: fetch
//! a document, mutate individual subtrees through typed accessors, and PUT
//! the whole document back. That makes a small mutable tree the right shape
//! here, built directly on `quick-xml` events.
//!
//! Design points:
//!
//! - Element names are resolved at parse time; lookups go by
//!   `(namespace URI, local name)`, never by literal prefix.
//! - `xmlns` declarations are carried as ordinary attributes, so writes
//!   leave the document's namespace context and untouched siblings intact.
//! - Whitespace-only text is trimmed; a round trip is canonical rather than
//!   byte-identical.
//!
//! # Example
//!
//! ```
//! use benchtop_xml::Document;
//!
//! let mut doc = Document::parse("<sample><name>s1</name></sample>")?;
//! doc.root
//!     .find_or_create_child(None, None, "name")
//!     .set_text("renamed");
//! assert!(doc.to_xml()?.contains("<name>renamed</name>"));
//! # Ok::<(), benchtop_xml::XmlError>(())
//! ```

mod element;
mod error;
mod parse;
mod write;

pub use element::{Attr, Element, Node, QName};
pub use error::{Result, XmlError};
pub use parse::parse_element;
pub use write::write_fragment;

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The root element.
    pub root: Element,
}

impl Document {
    /// Parses a complete document (an XML declaration is accepted but not
    /// required).
    pub fn parse(xml: &str) -> Result<Document> {
        parse::parse_document(xml)
    }

    /// Wraps an already-built element, e.g. a fragment lifted out of a
    /// larger response.
    pub fn from_root(root: Element) -> Document {
        Document { root }
    }

    /// Serializes the document with the standard XML declaration.
    pub fn to_xml(&self) -> Result<String> {
        write::write_document(self)
    }
}
