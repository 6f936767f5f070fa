//! The HTTP seam between the client and the LIMS server.
//!
//! Everything above this module sees only [`Transport`]: three blocking
//! verbs that take and return XML text. Production code uses
//! [`HttpTransport`] over `reqwest`; tests substitute a scripted in-memory
//! transport.

use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};

/// Blocking HTTP collaborator. Implementations must raise on non-success
/// status; callers never inspect status codes themselves.
pub trait Transport: Send + Sync {
    /// Fetches the resource at `uri`, returning the response body.
    fn get(&self, uri: &str) -> Result<String>;

    /// Posts `body` to `uri`, returning the response body.
    fn post(&self, uri: &str, body: &str) -> Result<String>;

    /// Puts `body` to `uri`, returning the response body (typically the
    /// canonical updated representation).
    fn put(&self, uri: &str, body: &str) -> Result<String>;
}

const XML_CONTENT_TYPE: &str = "application/xml";

/// [`Transport`] over `reqwest::blocking` with HTTP basic auth.
pub struct HttpTransport {
    http: reqwest::blocking::Client,
    username: String,
    password: String,
}

impl HttpTransport {
    /// Builds a transport with the given credentials and request timeout.
    pub fn new(username: &str, password: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(HttpTransport {
            http,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn handle(&self, uri: &str, response: reqwest::blocking::Response) -> Result<String> {
        let status = response.status();
        let body = response.text()?;
        if status.is_success() {
            return Ok(body);
        }
        debug!(uri = %uri, status = status.as_u16(), "request failed");
        Err(Error::Api {
            status: status.as_u16(),
            message: exception_message(&body)
                .unwrap_or_else(|| status.to_string()),
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, uri: &str) -> Result<String> {
        debug!(uri = %uri, "GET");
        let response = self
            .http
            .get(uri)
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::ACCEPT, XML_CONTENT_TYPE)
            .send()?;
        self.handle(uri, response)
    }

    fn post(&self, uri: &str, body: &str) -> Result<String> {
        debug!(uri = %uri, bytes = body.len(), "POST");
        let response = self
            .http
            .post(uri)
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::CONTENT_TYPE, XML_CONTENT_TYPE)
            .header(reqwest::header::ACCEPT, XML_CONTENT_TYPE)
            .body(body.to_string())
            .send()?;
        self.handle(uri, response)
    }

    fn put(&self, uri: &str, body: &str) -> Result<String> {
        debug!(uri = %uri, bytes = body.len(), "PUT");
        let response = self
            .http
            .put(uri)
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::CONTENT_TYPE, XML_CONTENT_TYPE)
            .header(reqwest::header::ACCEPT, XML_CONTENT_TYPE)
            .body(body.to_string())
            .send()?;
        self.handle(uri, response)
    }
}

/// Pulls the human-readable message out of a server error body, shaped as
/// `<exc:exception xmlns:exc="..."><message>...</message></exc:exception>`.
fn exception_message(body: &str) -> Option<String> {
    let doc = benchtop_xml::Document::parse(body).ok()?;
    if doc.root.name.local != "exception" {
        return None;
    }
    doc.root.child(None, "message")?.text()
}
