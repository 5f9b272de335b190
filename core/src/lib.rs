//! Client for rendering PlantUML diagrams on a remote PlantUML server.
//!
//! # Overview
//! Diagram text is compressed and packed into a URL-safe token
//! ([`encoding`]), appended to the server's base URL, and fetched with a
//! single GET. The server answers with the rendered image.
//!
//! # Design
//! - `encoding` is pure and deterministic: the same text always yields the
//!   same token.
//! - `PlantUml` is a session: it validates its `ServerConfig`, authenticates
//!   once (basic credentials or a form-login cookie), then serves any number
//!   of independent fetches.
//! - Requests and responses are plain data (`http`); the network round-trip
//!   sits behind the `Transport` trait, with `UreqTransport` as the blocking
//!   production implementation.
//! - Errors nest as `PlantUmlError` ⊃ `ConnectionError` ⊃ `HttpError`.
//!
//! ```no_run
//! use plantuml_core::{PlantUml, ServerConfig};
//!
//! let client = PlantUml::new(ServerConfig::default().with_env_proxy())?;
//! let png = client.fetch("@startuml\nAlice -> Bob\n@enduml")?;
//! # Ok::<(), plantuml_core::PlantUmlError>(())
//! ```

pub mod client;
pub mod config;
pub mod encoding;
pub mod error;
pub mod files;
pub mod http;
pub mod transport;

pub use client::PlantUml;
pub use config::{AuthMode, BasicAuth, FormAuth, ServerConfig, DEFAULT_SERVER_URL};
pub use error::{ConnectionError, HttpError, PlantUmlError, TransportError};
pub use files::FileOptions;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use transport::UreqTransport;
