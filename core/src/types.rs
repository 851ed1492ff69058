//! Request and response DTOs for the SAS9API proxy.
//!
//! # Design
//! Per-call options are plain structs with `Default` impls, so every call
//! starts from freshly constructed defaults. Response payloads stay untyped
//! (`serde_json::Value`): their shape differs per endpoint and per proxy
//! version, and callers pick out what they need.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata repository used when a call does not name one.
pub const DEFAULT_REPOSITORY: &str = "Foundation";

/// One dataset row: a flat column-name to value mapping.
pub type Record = Map<String, Value>;

/// What an endpoint call returns on success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseMode {
    /// The whole decoded envelope (`status`, `error`, `payload`).
    #[default]
    Envelope,
    /// Only the envelope's `payload` field.
    PayloadOnly,
}

/// The response envelope proxy endpoints answer with. A bodiless success
/// decodes to `Envelope::default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub payload: Value,
    /// Any fields beyond the standard three.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    /// The `error` field as text, if the proxy set one.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().and_then(error_text)
    }
}

/// Render an envelope `error` value as a message. Strings are used verbatim,
/// structures are serialized, `null` yields nothing.
pub(crate) fn error_text(error: &Value) -> Option<String> {
    match error {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

/// The record window for `retrieve_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataWindow {
    /// Number of records to return. The proxy caps this at 10000.
    pub limit: u32,
    pub offset: u32,
    /// Dataset filter as a JSON document, passed through verbatim.
    pub filter: Option<String>,
}

impl Default for DataWindow {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
            filter: None,
        }
    }
}

/// Parameters of a library created with `create_library`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryDefinition {
    /// Library engine, e.g. `BASE`.
    pub engine: String,
    pub display_name: String,
    /// Physical path of the library on the workspace server.
    pub path: String,
    /// Metadata folder the library object is created in.
    pub location: String,
    pub is_preassigned: bool,
}

/// Filters for `find_object`.
///
/// The proxy only returns meaningful results when at least one criterion is
/// set. That is not enforced here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCriteria {
    pub repository: String,
    /// Folder to search in.
    pub location: Option<String>,
    /// Whether `location` includes its subfolders.
    pub location_recursive: bool,
    pub object_id: Option<String>,
    /// Metadata object type; `None` searches all types.
    pub object_type: Option<String>,
    /// Comma-separated list of PublicType attributes.
    pub public_type: Option<String>,
    pub name_equals: Option<String>,
    pub name_starts: Option<String>,
    pub name_contains: Option<String>,
    pub name_regex: Option<String>,
    pub description_contains: Option<String>,
    pub description_regex: Option<String>,
    /// MetadataCreated lower bound (ISO date-time).
    pub created_gt: Option<String>,
    pub created_lt: Option<String>,
    /// MetadataModified lower bound (ISO date-time).
    pub modified_gt: Option<String>,
    pub modified_lt: Option<String>,
    pub table_libref: Option<String>,
    pub table_dbms: Option<String>,
    pub include_associations: bool,
    pub include_permissions: bool,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            repository: DEFAULT_REPOSITORY.to_string(),
            location: None,
            location_recursive: true,
            object_id: None,
            object_type: None,
            public_type: None,
            name_equals: None,
            name_starts: None,
            name_contains: None,
            name_regex: None,
            description_contains: None,
            description_regex: None,
            created_gt: None,
            created_lt: None,
            modified_gt: None,
            modified_lt: None,
            table_libref: None,
            table_dbms: None,
            include_associations: false,
            include_permissions: false,
        }
    }
}

impl SearchCriteria {
    /// True if any filtering criterion is set. Repository, recursion and
    /// the include flags shape the result but do not filter it.
    pub fn has_filter(&self) -> bool {
        [
            &self.location,
            &self.object_id,
            &self.object_type,
            &self.public_type,
            &self.name_equals,
            &self.name_starts,
            &self.name_contains,
            &self.name_regex,
            &self.description_contains,
            &self.description_regex,
            &self.created_gt,
            &self.created_lt,
            &self.modified_gt,
            &self.modified_lt,
            &self.table_libref,
            &self.table_dbms,
        ]
        .iter()
        .any(|criterion| criterion.is_some())
    }
}

/// A metadata object addressed by folder, name and PublicType.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub location: String,
    pub name: String,
    pub public_type: String,
}

impl ObjectRef {
    pub fn new(
        location: impl Into<String>,
        name: impl Into<String>,
        public_type: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            name: name.into(),
            public_type: public_type.into(),
        }
    }
}
