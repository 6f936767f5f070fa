//! Error types for the LIMS client.
//!
//! The client is a thin synchronous mapping layer: nothing is retried and
//! nothing is swallowed. The one deliberate exception is reading an absent
//! element through a typed accessor, which yields a default (`None`, empty
//! list, empty map) instead of an error.

use thiserror::Error;

/// The primary error type for LIMS client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure: connection refused, timeout, TLS, etc.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status. `message` carries the
    /// text from the server's `<exc:exception>` body when one was sent.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-supplied message, or the status line if none was given.
        message: String,
    },

    /// A response or fragment failed to parse as XML.
    #[error("XML error: {0}")]
    Xml(#[from] benchtop_xml::XmlError),

    /// Element text could not be parsed as the accessor's type.
    #[error("invalid value for `{field}`: expected {expected}, got `{text}`")]
    Value {
        /// Tag of the element being read.
        field: String,
        /// The offending text.
        text: String,
        /// What the accessor expected ("integer", "boolean", "number").
        expected: &'static str,
    },

    /// A UDF write whose value type conflicts with the field's declared type.
    #[error("UDF `{name}` is declared {declared}, cannot assign {got}")]
    UdfType {
        /// Field name.
        name: String,
        /// Declared `type` attribute of the existing field.
        declared: String,
        /// Type of the value being assigned.
        got: &'static str,
    },

    /// Deleting a UDF that does not exist.
    #[error("UDF `{name}` not found")]
    UdfNotFound {
        /// Field name.
        name: String,
    },

    /// A base or constructed URI failed to parse.
    #[error("invalid URI: {0}")]
    Uri(#[from] url::ParseError),
}

/// Result type alias for LIMS client operations.
pub type Result<T> = std::result::Result<T, Error>;
