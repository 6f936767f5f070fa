//! # Benchtop LIMS client
//!
//! Client library mapping a REST+XML Laboratory Information Management
//! System API onto typed Rust objects.
//!
//! ## Architecture
//!
//! - **Session** ([`Client`]): owns the HTTP transport, the URI builder,
//!   and the per-session [`EntityCache`]. One cache per session — entity
//!   identity (at most one instance per URI) holds within a session.
//! - **Entities** ([`EntityRef`] + the typed wrappers in [`entities`]):
//!   lazily loaded XML documents. The first accessor touched triggers a
//!   single GET; references between entities resolve to cached shells
//!   without fetching.
//! - **Descriptors** ([`descriptor`]): typed bindings (string, attribute,
//!   list, dictionary, integer, boolean, entity link) that read and write
//!   subtrees of an entity's document in place.
//! - **UDFs** ([`UdfMap`]): mapping view over typed user-defined fields,
//!   with declared-type checking at assignment.
//!
//! Mutations edit the in-memory tree; [`EntityRef::put`] serializes the
//! tree, PUTs it, and adopts the server's canonical response.
//!
//! ## Example
//!
//! ```no_run
//! use benchtop_lims::{Client, ClientConfig, Resource, UdfValue};
//! use benchtop_lims::entities::Sample;
//!
//! # fn main() -> benchtop_lims::Result<()> {
//! let client = Client::new(ClientConfig::new(
//!     "https://lims.example.com",
//!     "apiuser",
//!     "secret",
//! ))?;
//!
//! let sample: Sample = client.by_id("s24-101");
//! println!("{:?}", sample.name()?);
//!
//! sample.udfs().set("Concentration", UdfValue::Numeric(21.0))?;
//! sample.entity().put()?;
//! # Ok(())
//! # }
//! ```

mod cache;
mod client;
pub mod descriptor;
pub mod entities;
mod entity;
mod error;
mod transport;
mod udf;
mod uri;

pub use cache::EntityCache;
pub use client::{Client, ClientConfig};
pub use entity::{EntityRef, Resource};
pub use error::{Error, Result};
pub use transport::{HttpTransport, Transport};
pub use udf::{UdfMap, UdfValue, UDF_NS};
pub use uri::BaseUri;
