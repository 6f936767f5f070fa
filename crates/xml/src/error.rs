//! Error types for XML parsing and serialization.

use thiserror::Error;

/// Errors raised while parsing or writing XML documents.
#[derive(Debug, Error)]
pub enum XmlError {
    /// Low-level XML reader/writer error.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed attribute syntax.
    #[error("malformed attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    /// Invalid character or entity escape.
    #[error("invalid escape: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    /// IO error while writing serialized output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document bytes are not valid UTF-8.
    #[error("invalid UTF-8 in document: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Serialized output is not valid UTF-8.
    #[error("invalid UTF-8 in output: {0}")]
    FromUtf8(#[from] std::string::FromUtf8Error),

    /// An element used a namespace prefix with no in-scope declaration.
    #[error("unbound namespace prefix `{0}`")]
    UnboundPrefix(String),

    /// An entity reference that is neither a character reference nor one of
    /// the five predefined XML entities.
    #[error("unknown entity reference `&{0};`")]
    UnknownEntity(String),

    /// The input contained no root element.
    #[error("document has no root element")]
    NoRoot,

    /// Structurally invalid event stream (e.g. an end tag with no start).
    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Result type alias for XML operations.
pub type Result<T> = std::result::Result<T, XmlError>;
