//! Blocking client for the SAS9API REST proxy.
//!
//! # Overview
//! The proxy exposes a SAS 9 metadata server and its workspace servers over
//! HTTP. This crate has one function per proxy endpoint: server, library
//! and dataset enumeration, record retrieval and mutation, user/group/role
//! lookup, command execution, and metadata object search/move/delete.
//!
//! # Design
//! - `Sas9ApiClient` is stateless; it holds a base URL and a `Transport`.
//! - Each operation is split into `build_*` (produces an `HttpRequest` from
//!   the endpoint catalog) and the call itself, which sends the request
//!   once and classifies the response as success, `Transport`, `Http` or
//!   `MalformedResponse`.
//! - Target-scoped operations take a `Target`: a named server, a host/port
//!   pair, or the proxy's configured default.
//!
//! ```no_run
//! use sas9api::{ClientConfig, ResponseMode, Sas9ApiClient, Target};
//!
//! let client = Sas9ApiClient::new(ClientConfig::new("http://sas.local:8080"))?;
//! let libraries = client.get_library_list(&Target::server("SASApp"), ResponseMode::PayloadOnly)?;
//! println!("{libraries}");
//! # Ok::<(), sas9api::ApiError>(())
//! ```

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod target;
pub mod transport;
pub mod types;

pub use client::{parse_response, Sas9ApiClient};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use endpoint::{Operation, RequestBuilder, Route};
pub use error::ApiError;
pub use http::{join_url, HttpMethod, HttpRequest, HttpResponse};
pub use target::Target;
pub use transport::{Transport, UreqTransport};
pub use types::{
    DataWindow, Envelope, LibraryDefinition, ObjectRef, Record, ResponseMode, SearchCriteria,
    DEFAULT_REPOSITORY,
};
