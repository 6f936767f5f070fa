//! Entity handles and the lazy loading protocol.
//!
//! An [`EntityRef`] is a cheap handle to one cached, URI-identified
//! document. Every typed accessor funnels through [`EntityRef::with_root`] /
//! [`EntityRef::with_root_mut`], which perform the lazy fetch at a single,
//! explicit point: if the document is absent it is GET-ed and parsed under
//! the entity's lock, exactly once; a loaded entity is never re-fetched
//! implicitly. Re-fetching is the explicit [`EntityRef::refresh`].

use std::sync::Arc;

use benchtop_xml::{Document, Element};
use tracing::debug;

use crate::cache::EntityState;
use crate::client::Client;
use crate::descriptor::{Descriptor, DescriptorMut};
use crate::error::Result;
use crate::uri::BaseUri;

/// Handle to a cached entity. Clones share the same underlying state;
/// equality is identity (same cache slot), which by the cache invariant
/// means same URI within a session.
#[derive(Clone)]
pub struct EntityRef {
    client: Client,
    state: Arc<EntityState>,
}

impl EntityRef {
    pub(crate) fn new(client: Client, state: Arc<EntityState>) -> EntityRef {
        EntityRef { client, state }
    }

    /// The entity's URI — its only durable identity.
    pub fn uri(&self) -> &str {
        &self.state.uri
    }

    /// The owning session.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// True once a document is held, whether fetched or adopted from an
    /// embedded fragment.
    pub fn is_loaded(&self) -> bool {
        self.state.doc.lock().is_some()
    }

    /// Adopts `fragment` as this entity's document if it has none yet.
    /// Used for entities that arrive embedded inside another response; an
    /// already-loaded (or already-adopted) document wins.
    pub(crate) fn adopt_fragment(&self, fragment: Element) {
        let mut guard = self.state.doc.lock();
        if guard.is_none() {
            *guard = Some(fragment);
        }
    }

    /// Runs `f` against the loaded document, fetching it first if absent.
    pub fn with_root<T>(&self, f: impl FnOnce(&Element) -> T) -> Result<T> {
        self.with_doc(|root| f(root))
    }

    /// Mutable variant of [`with_root`](Self::with_root).
    pub fn with_root_mut<T>(&self, f: impl FnOnce(&mut Element) -> T) -> Result<T> {
        self.with_doc(f)
    }

    fn with_doc<T>(&self, f: impl FnOnce(&mut Element) -> T) -> Result<T> {
        let mut guard = self.state.doc.lock();
        let root = match guard.take() {
            Some(root) => guard.insert(root),
            None => {
                debug!(uri = %self.state.uri, "lazy load");
                let body = self.client.transport().get(&self.state.uri)?;
                guard.insert(Document::parse(&body)?.root)
            }
        };
        Ok(f(root))
    }

    /// Fetches the document even if one is already loaded. On success the
    /// previous tree (and any unsaved mutations) is discarded; on error the
    /// previous tree is kept.
    pub fn refresh(&self) -> Result<()> {
        let body = self.client.transport().get(&self.state.uri)?;
        let root = Document::parse(&body)?.root;
        *self.state.doc.lock() = Some(root);
        Ok(())
    }

    /// Serializes the current document (loading it first if needed).
    pub fn to_xml(&self) -> Result<String> {
        let root = self.with_doc(|root| root.clone())?;
        Ok(Document::from_root(root).to_xml()?)
    }

    /// Serializes the current tree and PUTs it to the entity's URI. The
    /// server's response — the canonical updated representation — replaces
    /// the in-memory tree.
    pub fn put(&self) -> Result<()> {
        let body = self.to_xml()?;
        let response = self.client.transport().put(&self.state.uri, &body)?;
        let root = Document::parse(&response)?.root;
        *self.state.doc.lock() = Some(root);
        Ok(())
    }

    /// POST variant of [`put`](Self::put), for resources created or acted
    /// on by POSTing their representation.
    pub fn post(&self) -> Result<()> {
        let body = self.to_xml()?;
        let response = self.client.transport().post(&self.state.uri, &body)?;
        let root = Document::parse(&response)?.root;
        *self.state.doc.lock() = Some(root);
        Ok(())
    }

    /// Reads a typed field from the document.
    pub fn get<D: Descriptor>(&self, descriptor: &D) -> Result<D::Output> {
        self.with_doc(|root| descriptor.get(root))?
    }

    /// Writes a typed field into the document. The change is in-memory
    /// until [`put`](Self::put).
    pub fn set<D: DescriptorMut>(&self, descriptor: &D, value: D::Input) -> Result<()> {
        self.with_doc(|root| descriptor.set(root, value))?
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Eq for EntityRef {}

impl std::fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRef")
            .field("uri", &self.state.uri)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// A typed LIMS resource: a thin wrapper over an [`EntityRef`] plus the
/// resource category its URIs live under.
pub trait Resource: Sized {
    /// URI path category, e.g. `"artifacts"`.
    const CATEGORY: &'static str;

    /// Wraps a handle. Use [`Client::by_id`](crate::Client::by_id) or
    /// [`Client::from_uri`](crate::Client::from_uri) rather than calling
    /// this directly.
    fn from_entity(entity: EntityRef) -> Self;

    /// The underlying handle.
    fn entity(&self) -> &EntityRef;

    /// The resource URI.
    fn uri(&self) -> &str {
        self.entity().uri()
    }

    /// The canonical URI for an id. Subresources that live under another
    /// resource's path override this.
    fn uri_for(base: &BaseUri, id: &str) -> String {
        base.uri(Self::CATEGORY, &[id])
    }
}
