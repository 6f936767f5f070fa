//! The client session: transport + URI builder + entity cache.

use std::sync::Arc;
use std::time::Duration;

use benchtop_xml::{Document, Element};
use tracing::debug;

use crate::cache::EntityCache;
use crate::entity::{EntityRef, Resource};
use crate::error::Result;
use crate::transport::{HttpTransport, Transport};
use crate::uri::BaseUri;

/// Configuration for a client session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL, with or without the `/api/v2` suffix.
    pub base_uri: String,
    /// Basic-auth username.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Config with the default 60 second timeout.
    pub fn new(base_uri: &str, username: &str, password: &str) -> ClientConfig {
        ClientConfig {
            base_uri: base_uri.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> ClientConfig {
        self.timeout = timeout;
        self
    }
}

struct ClientInner {
    transport: Box<dyn Transport>,
    base: BaseUri,
    cache: EntityCache,
}

/// A session against one LIMS server. Owns the entity cache, so entity
/// identity (one instance per URI) holds within a session and no further.
/// Cloning is cheap and shares the session.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Opens a session over HTTP with basic auth.
    pub fn new(config: ClientConfig) -> Result<Client> {
        let transport =
            HttpTransport::new(&config.username, &config.password, config.timeout)?;
        Client::with_transport(&config.base_uri, Box::new(transport))
    }

    /// Opens a session over a caller-supplied transport. This is the seam
    /// tests use to substitute a scripted transport.
    pub fn with_transport(base_uri: &str, transport: Box<dyn Transport>) -> Result<Client> {
        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                base: BaseUri::new(base_uri)?,
                cache: EntityCache::new(),
            }),
        })
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    /// The session's URI builder.
    pub fn base(&self) -> &BaseUri {
        &self.inner.base
    }

    /// The session's entity cache.
    pub fn cache(&self) -> &EntityCache {
        &self.inner.cache
    }

    /// An untyped lazy handle for `uri`.
    pub fn entity(&self, uri: &str) -> EntityRef {
        EntityRef::new(self.clone(), self.inner.cache.get_or_create(uri))
    }

    /// A typed lazy handle for `uri`.
    pub fn from_uri<T: Resource>(&self, uri: &str) -> T {
        T::from_entity(self.entity(uri))
    }

    /// A typed lazy handle for an id under the resource's category, e.g.
    /// `by_id::<Sample>("s24-101")`.
    pub fn by_id<T: Resource>(&self, id: &str) -> T {
        let uri = T::uri_for(&self.inner.base, id);
        self.from_uri(&uri)
    }

    /// Resolves an embedded reference element into a typed handle. The
    /// element's `uri` attribute is the identity; if the fragment carries
    /// children (a partial representation) the new entity adopts it as its
    /// document, deferring a full fetch to an explicit
    /// [`refresh`](EntityRef::refresh).
    pub(crate) fn resolve_embedded<T: Resource>(&self, fragment: &Element) -> Option<T> {
        let uri = fragment.attr("uri")?;
        let entity = self.entity(uri);
        if fragment.children().next().is_some() {
            entity.adopt_fragment(fragment.clone());
        }
        Some(T::from_entity(entity))
    }

    /// Fetches every entity in a category index, following `next-page`
    /// links until exhausted. Entries come back as lazy shells; nothing
    /// beyond the index pages themselves is fetched.
    pub fn list<T: Resource>(&self, params: &[(&str, &str)]) -> Result<Vec<T>> {
        let mut out = Vec::new();
        let mut next = Some(self.inner.base.uri_with_params(T::CATEGORY, &[], params));
        while let Some(page_uri) = next.take() {
            debug!(uri = %page_uri, "listing page");
            let body = self.transport().get(&page_uri)?;
            let page = Document::parse(&body)?.root;
            for child in page.children() {
                // Pages after the first also carry a previous-page link;
                // neither navigation link is an index entry.
                if matches!(child.name.local.as_str(), "next-page" | "previous-page") {
                    continue;
                }
                if let Some(uri) = child.attr("uri") {
                    out.push(self.from_uri(uri));
                }
            }
            next = page
                .child(None, "next-page")
                .and_then(|e| e.attr("uri").map(str::to_string));
        }
        Ok(out)
    }

    /// Lists samples matching the query parameters.
    pub fn samples(&self, params: &[(&str, &str)]) -> Result<Vec<crate::entities::Sample>> {
        self.list(params)
    }

    /// Lists artifacts matching the query parameters.
    pub fn artifacts(&self, params: &[(&str, &str)]) -> Result<Vec<crate::entities::Artifact>> {
        self.list(params)
    }

    /// Lists projects matching the query parameters.
    pub fn projects(&self, params: &[(&str, &str)]) -> Result<Vec<crate::entities::Project>> {
        self.list(params)
    }

    /// Lists researchers matching the query parameters.
    pub fn researchers(&self, params: &[(&str, &str)]) -> Result<Vec<crate::entities::Researcher>> {
        self.list(params)
    }

    /// Lists containers matching the query parameters.
    pub fn containers(&self, params: &[(&str, &str)]) -> Result<Vec<crate::entities::Container>> {
        self.list(params)
    }

    /// Lists processes matching the query parameters.
    pub fn processes(&self, params: &[(&str, &str)]) -> Result<Vec<crate::entities::Process>> {
        self.list(params)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base", &self.inner.base.as_str())
            .field("cached_entities", &self.inner.cache.len())
            .finish()
    }
}
