//! The proxy's endpoint catalog and the request builder shared by every
//! operation.
//!
//! # Design
//! `Operation` fixes the verb of each remote function, and `Route` fixes
//! each path template. `RequestBuilder` turns an operation, a route and its
//! parameters into an `HttpRequest`. Target selection is applied the same
//! way for every target-scoped operation. A server-scoped path is the plain
//! path with `servers/<name>/` inserted after the `sas/` prefix.

use serde::Serialize;

use crate::error::ApiError;
use crate::http::{join_url, HttpMethod, HttpRequest};
use crate::target::Target;

/// One remote function of the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetMetadataServerConfig,
    GetLicenseInfo,
    GetWorkspaceServerList,
    GetWorkspaceServerConfig,
    GetStpServerList,
    GetStpServerConfig,
    ExecuteCommand,
    GetUserList,
    GetConfiguredUserInfo,
    GetUserInfo,
    GetGroupList,
    GetGroupInfo,
    GetRoleList,
    GetRoleInfo,
    GetLibraryList,
    GetLibraryInfo,
    CreateLibrary,
    DeleteLibrary,
    GetDatasetList,
    GetDatasetInfo,
    RetrieveData,
    InsertData,
    ReplaceAllData,
    DeleteDataset,
    FindObject,
    MoveObject,
    DeleteObject,
}

impl Operation {
    pub const ALL: [Operation; 27] = [
        Operation::GetMetadataServerConfig,
        Operation::GetLicenseInfo,
        Operation::GetWorkspaceServerList,
        Operation::GetWorkspaceServerConfig,
        Operation::GetStpServerList,
        Operation::GetStpServerConfig,
        Operation::ExecuteCommand,
        Operation::GetUserList,
        Operation::GetConfiguredUserInfo,
        Operation::GetUserInfo,
        Operation::GetGroupList,
        Operation::GetGroupInfo,
        Operation::GetRoleList,
        Operation::GetRoleInfo,
        Operation::GetLibraryList,
        Operation::GetLibraryInfo,
        Operation::CreateLibrary,
        Operation::DeleteLibrary,
        Operation::GetDatasetList,
        Operation::GetDatasetInfo,
        Operation::RetrieveData,
        Operation::InsertData,
        Operation::ReplaceAllData,
        Operation::DeleteDataset,
        Operation::FindObject,
        Operation::MoveObject,
        Operation::DeleteObject,
    ];

    pub fn method(self) -> HttpMethod {
        use Operation::*;
        match self {
            ExecuteCommand | InsertData => HttpMethod::Put,
            CreateLibrary | ReplaceAllData | MoveObject | DeleteObject => HttpMethod::Post,
            DeleteLibrary | DeleteDataset => HttpMethod::Delete,
            GetMetadataServerConfig | GetLicenseInfo | GetWorkspaceServerList
            | GetWorkspaceServerConfig | GetStpServerList | GetStpServerConfig | GetUserList
            | GetConfiguredUserInfo | GetUserInfo | GetGroupList | GetGroupInfo | GetRoleList
            | GetRoleInfo | GetLibraryList | GetLibraryInfo | GetDatasetList | GetDatasetInfo
            | RetrieveData | FindObject => HttpMethod::Get,
        }
    }

    /// Whether the operation accepts a `Target`.
    pub fn is_target_scoped(self) -> bool {
        use Operation::*;
        matches!(
            self,
            ExecuteCommand
                | GetLibraryList
                | GetLibraryInfo
                | GetDatasetList
                | GetDatasetInfo
                | RetrieveData
                | InsertData
                | ReplaceAllData
                | DeleteDataset
        )
    }

    pub fn name(self) -> &'static str {
        use Operation::*;
        match self {
            GetMetadataServerConfig => "get_metadata_server_config",
            GetLicenseInfo => "get_license_info",
            GetWorkspaceServerList => "get_workspace_server_list",
            GetWorkspaceServerConfig => "get_workspace_server_config",
            GetStpServerList => "get_stp_server_list",
            GetStpServerConfig => "get_stp_server_config",
            ExecuteCommand => "execute_command",
            GetUserList => "get_user_list",
            GetConfiguredUserInfo => "get_configured_user_info",
            GetUserInfo => "get_user_info",
            GetGroupList => "get_group_list",
            GetGroupInfo => "get_group_info",
            GetRoleList => "get_role_list",
            GetRoleInfo => "get_role_info",
            GetLibraryList => "get_library_list",
            GetLibraryInfo => "get_library_info",
            CreateLibrary => "create_library",
            DeleteLibrary => "delete_library",
            GetDatasetList => "get_dataset_list",
            GetDatasetInfo => "get_dataset_info",
            RetrieveData => "retrieve_data",
            InsertData => "insert_data",
            ReplaceAllData => "replace_all_data",
            DeleteDataset => "delete_dataset",
            FindObject => "find_object",
            MoveObject => "move_object",
            DeleteObject => "delete_object",
        }
    }

    /// Look an operation up by its `name()`.
    pub fn from_name(name: &str) -> Option<Operation> {
        Operation::ALL.into_iter().find(|op| op.name() == name)
    }
}

/// Path templates of the proxy, relative to the base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    MetadataServer,
    License,
    WorkspaceServers,
    WorkspaceServer(&'a str),
    StpServers,
    StpServer(&'a str),
    Command,
    Users,
    User(&'a str),
    ConfiguredUser,
    Groups,
    Group(&'a str),
    Roles,
    Role(&'a str),
    Libraries,
    Library(&'a str),
    Datasets { library: &'a str },
    Dataset { library: &'a str, dataset: &'a str },
    Data { library: &'a str, dataset: &'a str },
    Search,
    MoveObject,
    DeleteObject,
}

impl Route<'_> {
    /// The path below `sas/`, with name segments percent-encoded.
    fn tail(&self) -> String {
        let enc = urlencoding::encode;
        match *self {
            Route::MetadataServer => String::new(),
            Route::License => "license".to_string(),
            Route::WorkspaceServers => "servers".to_string(),
            Route::WorkspaceServer(name) => format!("servers/{}", enc(name)),
            Route::StpServers => "stp".to_string(),
            Route::StpServer(name) => format!("stp/{}", enc(name)),
            Route::Command => "cmd".to_string(),
            Route::Users => "meta/users".to_string(),
            Route::User(name) => format!("meta/users/{}", enc(name)),
            Route::ConfiguredUser => "user".to_string(),
            Route::Groups => "meta/groups".to_string(),
            Route::Group(name) => format!("meta/groups/{}", enc(name)),
            Route::Roles => "meta/roles".to_string(),
            Route::Role(name) => format!("meta/roles/{}", enc(name)),
            Route::Libraries => "libraries".to_string(),
            Route::Library(name) => format!("libraries/{}", enc(name)),
            Route::Datasets { library } => format!("libraries/{}/datasets", enc(library)),
            Route::Dataset { library, dataset } => {
                format!("libraries/{}/datasets/{}", enc(library), enc(dataset))
            }
            Route::Data { library, dataset } => {
                format!("libraries/{}/datasets/{}/data", enc(library), enc(dataset))
            }
            Route::Search => "meta/search".to_string(),
            Route::MoveObject => "meta/objects/move".to_string(),
            Route::DeleteObject => "meta/objects/delete".to_string(),
        }
    }

    /// The relative path, scoped to `server` when one is given.
    pub fn path(&self, server: Option<&str>) -> String {
        match server {
            Some(server) => format!("sas/servers/{}/{}", urlencoding::encode(server), self.tail()),
            None => format!("sas/{}", self.tail()),
        }
    }
}

/// Builds the `HttpRequest` for one operation.
#[derive(Debug)]
pub struct RequestBuilder<'a> {
    base_url: &'a str,
    operation: Operation,
    route: Route<'a>,
    server: Option<&'a str>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(base_url: &'a str, operation: Operation, route: Route<'a>) -> Self {
        Self {
            base_url,
            operation,
            route,
            server: None,
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Append a query parameter. A key that is already present is
    /// overwritten in place.
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        match self.query.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value,
            None => self.query.push((key.to_string(), value)),
        }
        self
    }

    /// Append a query parameter only when `value` is present.
    pub fn param_opt<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Append a boolean query parameter as `true` / `false`.
    pub fn flag(self, key: &str, value: bool) -> Self {
        self.param(key, if value { "true" } else { "false" })
    }

    /// Scope the path to a named server.
    pub fn server(mut self, name: &'a str) -> Self {
        self.server = Some(name);
        self
    }

    /// Apply a target selection.
    pub fn target(self, target: &'a Target) -> Self {
        debug_assert!(
            self.operation.is_target_scoped(),
            "{} does not take a target",
            self.operation.name()
        );
        match target {
            Target::Server { name, repository } => {
                self.server(name).param("repositoryName", repository)
            }
            Target::Address { url, port } => {
                self.param("serverUrl", url).param("serverPort", port)
            }
            Target::Default => {
                tracing::info!(
                    operation = self.operation.name(),
                    "The default Server Name from the configuration file will be used \
                     because neither server name nor (server url and server port) are specified"
                );
                self
            }
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Attach a raw text body.
    pub fn text_body(mut self, text: impl Into<String>) -> Self {
        self.body = Some(text.into());
        self.header("content-type", "text/plain; charset=utf-8")
    }

    /// Attach a JSON body.
    pub fn json_body<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, ApiError> {
        let body =
            serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.body = Some(body);
        Ok(self.header("content-type", "application/json"))
    }

    pub fn build(self) -> HttpRequest {
        let endpoint = self.route.path(self.server);
        HttpRequest {
            method: self.operation.method(),
            url: join_url(self.base_url, &endpoint),
            endpoint,
            query: self.query,
            headers: self.headers,
            body: self.body,
        }
    }
}
