//! Scripted in-memory transport for integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use benchtop_lims::{Client, Error, Result, Transport};

#[derive(Default)]
struct Inner {
    responses: Mutex<HashMap<String, String>>,
    gets: Mutex<Vec<String>>,
    puts: Mutex<Vec<(String, String)>>,
    posts: Mutex<Vec<(String, String)>>,
}

/// A [`Transport`] that serves canned responses and records traffic.
/// Cloning shares the script and the recorded calls, so tests can keep a
/// handle after giving one to the client.
#[derive(Clone, Default)]
pub struct FakeTransport {
    inner: Arc<Inner>,
}

impl FakeTransport {
    pub fn new() -> FakeTransport {
        FakeTransport::default()
    }

    /// Scripts the GET response for `uri`.
    pub fn respond(&self, uri: &str, body: &str) {
        self.inner
            .responses
            .lock()
            .unwrap()
            .insert(uri.to_string(), body.to_string());
    }

    /// How many times `uri` was GET-ed.
    pub fn get_count(&self, uri: &str) -> usize {
        self.inner
            .gets
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == uri)
            .count()
    }

    /// The most recent PUT, if any.
    pub fn last_put(&self) -> Option<(String, String)> {
        self.inner.puts.lock().unwrap().last().cloned()
    }

    /// The most recent POST, if any.
    pub fn last_post(&self) -> Option<(String, String)> {
        self.inner.posts.lock().unwrap().last().cloned()
    }

    fn scripted_or_echo(&self, uri: &str, body: &str) -> String {
        // Unless a response is scripted under the same URI via `respond`,
        // echo the body back as the canonical representation.
        match self.inner.responses.lock().unwrap().get(uri) {
            Some(scripted) => scripted.clone(),
            None => body.to_string(),
        }
    }
}

impl Transport for FakeTransport {
    fn get(&self, uri: &str) -> Result<String> {
        self.inner.gets.lock().unwrap().push(uri.to_string());
        self.inner
            .responses
            .lock()
            .unwrap()
            .get(uri)
            .cloned()
            .ok_or_else(|| Error::Api {
                status: 404,
                message: format!("no scripted response for {uri}"),
            })
    }

    fn post(&self, uri: &str, body: &str) -> Result<String> {
        self.inner
            .posts
            .lock()
            .unwrap()
            .push((uri.to_string(), body.to_string()));
        Ok(self.scripted_or_echo(uri, body))
    }

    fn put(&self, uri: &str, body: &str) -> Result<String> {
        self.inner
            .puts
            .lock()
            .unwrap()
            .push((uri.to_string(), body.to_string()));
        Ok(self.scripted_or_echo(uri, body))
    }
}

pub const BASE: &str = "http://testbenchtop.example.com:4040";

/// A client wired to a fresh fake transport.
pub fn test_client() -> (Client, FakeTransport) {
    let transport = FakeTransport::new();
    let client = Client::with_transport(BASE, Box::new(transport.clone()))
        .expect("base URI is valid");
    (client, transport)
}
