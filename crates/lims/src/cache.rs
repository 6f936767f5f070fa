//! Per-session entity cache.
//!
//! The cache enforces the core identity invariant: at most one live entity
//! per URI, so a mutation made through any handle is visible to every other
//! holder. It is owned by a [`Client`](crate::Client) — one cache per
//! session, not a process-wide singleton — and entries live until the
//! session is dropped (no TTL or eviction).
//!
//! Identity is by URI *string*. Two spellings of the same logical resource
//! (trailing slash, percent-encoding, host case) are distinct entries; the
//! URI builder keeps client-constructed URIs canonical, but URIs taken from
//! server responses are trusted as-is. Accepted limitation.

use std::collections::HashMap;
use std::sync::Arc;

use benchtop_xml::Element;
use parking_lot::Mutex;
use tracing::trace;

/// Cached state for one URI: the identity string plus the lazily-fetched
/// document tree (`None` until first load).
#[derive(Debug)]
pub(crate) struct EntityState {
    pub(crate) uri: String,
    pub(crate) doc: Mutex<Option<Element>>,
}

/// URI-keyed registry of entity state, shared by all handles of a session.
#[derive(Debug, Default)]
pub struct EntityCache {
    entries: Mutex<HashMap<String, Arc<EntityState>>>,
}

impl EntityCache {
    pub(crate) fn new() -> EntityCache {
        EntityCache::default()
    }

    /// Returns the single cached state for `uri`, registering an unloaded
    /// shell first if the URI is new. Check-then-insert happens under one
    /// lock, so the at-most-one-instance invariant holds across threads,
    /// and the shell is registered before any network activity.
    pub(crate) fn get_or_create(&self, uri: &str) -> Arc<EntityState> {
        let mut entries = self.entries.lock();
        if let Some(state) = entries.get(uri) {
            return Arc::clone(state);
        }
        trace!(uri = %uri, "registering entity shell");
        let state = Arc::new(EntityState {
            uri: uri.to_string(),
            doc: Mutex::new(None),
        });
        entries.insert(uri.to_string(), Arc::clone(&state));
        state
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// True if `uri` has a registered entity (loaded or shell).
    pub fn contains(&self, uri: &str) -> bool {
        self.entries.lock().contains_key(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_returns_same_instance() {
        let cache = EntityCache::new();
        let a = cache.get_or_create("http://x/api/v2/samples/s1");
        let b = cache.get_or_create("http://x/api/v2/samples/s1");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_uri_strings_are_not_normalized() {
        let cache = EntityCache::new();
        let a = cache.get_or_create("http://x/api/v2/samples/s1");
        let b = cache.get_or_create("http://x/api/v2/samples/s1/");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_shell_starts_unloaded() {
        let cache = EntityCache::new();
        let state = cache.get_or_create("http://x/api/v2/samples/s1");
        assert!(state.doc.lock().is_none());
    }
}
