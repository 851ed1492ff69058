//! Stateless client for the SAS9API proxy.
//!
//! # Design
//! `Sas9ApiClient` holds its base URL and a transport and nothing else, so
//! one client can be shared freely between callers. Every operation is split
//! in two. `build_<op>` produces an `HttpRequest` from the endpoint catalog.
//! `<op>` builds the request and runs it through `execute`, which sends it
//! exactly once and classifies the response.

use std::time::Instant;

use serde_json::Value;

use crate::config::ClientConfig;
use crate::endpoint::{Operation, RequestBuilder, Route};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::target::Target;
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    error_text, DataWindow, Envelope, LibraryDefinition, ObjectRef, Record, ResponseMode,
    SearchCriteria,
};

/// Blocking client for the SAS9API proxy.
#[derive(Debug, Clone)]
pub struct Sas9ApiClient<T = UreqTransport> {
    base_url: String,
    transport: T,
}

impl Sas9ApiClient<UreqTransport> {
    /// Create a client that talks to `config.base_url` over HTTP.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let transport = UreqTransport::new(&config);
        Ok(Self {
            base_url: config.base_url,
            transport,
        })
    }
}

impl<T: Transport> Sas9ApiClient<T> {
    /// Create a client that sends its requests through `transport`.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ApiError> {
        config.validate()?;
        Ok(Self {
            base_url: config.base_url,
            transport,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn request<'a>(&'a self, operation: Operation, route: Route<'a>) -> RequestBuilder<'a> {
        RequestBuilder::new(&self.base_url, operation, route)
    }

    // ---------------------------------------------------------------------
    // Request execution
    // ---------------------------------------------------------------------

    /// Send `request` once and return the envelope or its payload.
    pub fn execute(&self, request: &HttpRequest, mode: ResponseMode) -> Result<Value, ApiError> {
        let start = Instant::now();
        tracing::debug!(
            method = %request.method,
            endpoint = %request.endpoint,
            "Sending request"
        );

        let response = match self.transport.send(request) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(
                    method = %request.method,
                    endpoint = %request.endpoint,
                    error = %err,
                    "Request failed before a response was received"
                );
                return Err(err);
            }
        };

        tracing::debug!(
            method = %request.method,
            endpoint = %request.endpoint,
            status = response.status,
            duration_ms = start.elapsed().as_millis() as u64,
            "Received response"
        );

        parse_response(request, response, mode).inspect_err(|err| {
            tracing::warn!(
                method = %request.method,
                endpoint = %request.endpoint,
                error = %err,
                "Request failed"
            );
        })
    }

    /// Send `request` once and decode the whole envelope.
    pub fn send(&self, request: &HttpRequest) -> Result<Envelope, ApiError> {
        let value = self.execute(request, ResponseMode::Envelope)?;
        if value.is_null() {
            return Ok(Envelope::default());
        }
        serde_json::from_value(value).map_err(|e| ApiError::malformed(&request.endpoint, e.to_string()))
    }

    // ---------------------------------------------------------------------
    // Metadata server and license
    // ---------------------------------------------------------------------

    pub fn build_get_metadata_server_config(&self) -> HttpRequest {
        self.request(Operation::GetMetadataServerConfig, Route::MetadataServer)
            .build()
    }

    /// Current metadata server configuration.
    pub fn get_metadata_server_config(&self, mode: ResponseMode) -> Result<Value, ApiError> {
        self.execute(&self.build_get_metadata_server_config(), mode)
    }

    pub fn build_get_license_info(&self) -> HttpRequest {
        self.request(Operation::GetLicenseInfo, Route::License).build()
    }

    /// Information about the active proxy license.
    pub fn get_license_info(&self, mode: ResponseMode) -> Result<Value, ApiError> {
        self.execute(&self.build_get_license_info(), mode)
    }

    // ---------------------------------------------------------------------
    // Workspace and stored process servers
    // ---------------------------------------------------------------------

    pub fn build_get_workspace_server_list(&self, repository: &str) -> HttpRequest {
        self.request(Operation::GetWorkspaceServerList, Route::WorkspaceServers)
            .param("repositoryName", repository)
            .build()
    }

    /// Workspace servers and their connections.
    pub fn get_workspace_server_list(
        &self,
        repository: &str,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        self.execute(&self.build_get_workspace_server_list(repository), mode)
    }

    pub fn build_get_workspace_server_config(&self, server_name: &str, repository: &str) -> HttpRequest {
        self.request(
            Operation::GetWorkspaceServerConfig,
            Route::WorkspaceServer(server_name),
        )
        .param("repositoryName", repository)
        .build()
    }

    pub fn get_workspace_server_config(
        &self,
        server_name: &str,
        repository: &str,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        self.execute(
            &self.build_get_workspace_server_config(server_name, repository),
            mode,
        )
    }

    pub fn build_get_stp_server_list(&self, repository: &str) -> HttpRequest {
        self.request(Operation::GetStpServerList, Route::StpServers)
            .param("repositoryName", repository)
            .build()
    }

    /// Stored Process servers and their connections.
    pub fn get_stp_server_list(&self, repository: &str, mode: ResponseMode) -> Result<Value, ApiError> {
        self.execute(&self.build_get_stp_server_list(repository), mode)
    }

    pub fn build_get_stp_server_config(&self, server_name: &str, repository: &str) -> HttpRequest {
        self.request(Operation::GetStpServerConfig, Route::StpServer(server_name))
            .param("repositoryName", repository)
            .build()
    }

    pub fn get_stp_server_config(
        &self,
        server_name: &str,
        repository: &str,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        self.execute(&self.build_get_stp_server_config(server_name, repository), mode)
    }

    // ---------------------------------------------------------------------
    // Command execution
    // ---------------------------------------------------------------------

    pub fn build_execute_command(&self, command: &str, target: &Target, log_enabled: bool) -> HttpRequest {
        self.request(Operation::ExecuteCommand, Route::Command)
            .flag("logEnabled", log_enabled)
            .target(target)
            .text_body(command)
            .build()
    }

    /// Run SAS code on a workspace server. With `log_enabled` the SAS log is
    /// part of the response.
    pub fn execute_command(
        &self,
        command: &str,
        target: &Target,
        log_enabled: bool,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        self.execute(&self.build_execute_command(command, target, log_enabled), mode)
    }

    // ---------------------------------------------------------------------
    // Users, groups and roles
    // ---------------------------------------------------------------------

    pub fn build_get_user_list(&self, repository: &str) -> HttpRequest {
        self.request(Operation::GetUserList, Route::Users)
            .param("repositoryName", repository)
            .build()
    }

    /// Server users and their identities.
    pub fn get_user_list(&self, repository: &str, mode: ResponseMode) -> Result<Value, ApiError> {
        self.execute(&self.build_get_user_list(repository), mode)
    }

    pub fn build_get_configured_user_info(&self, repository: &str) -> HttpRequest {
        self.request(Operation::GetConfiguredUserInfo, Route::ConfiguredUser)
            .param("repositoryName", repository)
            .build()
    }

    /// The user the proxy itself is configured to connect as.
    pub fn get_configured_user_info(
        &self,
        repository: &str,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        self.execute(&self.build_get_configured_user_info(repository), mode)
    }

    pub fn build_get_user_info(&self, user_name: &str, repository: &str) -> HttpRequest {
        self.request(Operation::GetUserInfo, Route::User(user_name))
            .param("repositoryName", repository)
            .build()
    }

    pub fn get_user_info(
        &self,
        user_name: &str,
        repository: &str,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        self.execute(&self.build_get_user_info(user_name, repository), mode)
    }

    pub fn build_get_group_list(&self, repository: &str) -> HttpRequest {
        self.request(Operation::GetGroupList, Route::Groups)
            .param("repositoryName", repository)
            .build()
    }

    /// Groups with their member groups and users.
    pub fn get_group_list(&self, repository: &str, mode: ResponseMode) -> Result<Value, ApiError> {
        self.execute(&self.build_get_group_list(repository), mode)
    }

    pub fn build_get_group_info(&self, group_name: &str, repository: &str) -> HttpRequest {
        self.request(Operation::GetGroupInfo, Route::Group(group_name))
            .param("repositoryName", repository)
            .build()
    }

    pub fn get_group_info(
        &self,
        group_name: &str,
        repository: &str,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        self.execute(&self.build_get_group_info(group_name, repository), mode)
    }

    pub fn build_get_role_list(&self, repository: &str) -> HttpRequest {
        self.request(Operation::GetRoleList, Route::Roles)
            .param("repositoryName", repository)
            .build()
    }

    /// Roles with their member groups and users.
    pub fn get_role_list(&self, repository: &str, mode: ResponseMode) -> Result<Value, ApiError> {
        self.execute(&self.build_get_role_list(repository), mode)
    }

    pub fn build_get_role_info(&self, role_name: &str, repository: &str) -> HttpRequest {
        self.request(Operation::GetRoleInfo, Route::Role(role_name))
            .param("repositoryName", repository)
            .build()
    }

    pub fn get_role_info(
        &self,
        role_name: &str,
        repository: &str,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        self.execute(&self.build_get_role_info(role_name, repository), mode)
    }

    // ---------------------------------------------------------------------
    // Libraries
    // ---------------------------------------------------------------------

    pub fn build_get_library_list(&self, target: &Target) -> HttpRequest {
        self.request(Operation::GetLibraryList, Route::Libraries)
            .target(target)
            .build()
    }

    /// Libraries visible on the target workspace server.
    pub fn get_library_list(&self, target: &Target, mode: ResponseMode) -> Result<Value, ApiError> {
        self.execute(&self.build_get_library_list(target), mode)
    }

    pub fn build_get_library_info(&self, library: &str, target: &Target) -> HttpRequest {
        self.request(Operation::GetLibraryInfo, Route::Library(library))
            .target(target)
            .build()
    }

    pub fn get_library_info(
        &self,
        library: &str,
        target: &Target,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        self.execute(&self.build_get_library_info(library, target), mode)
    }

    pub fn build_create_library(
        &self,
        server_name: &str,
        library: &str,
        definition: &LibraryDefinition,
        repository: &str,
    ) -> HttpRequest {
        self.request(Operation::CreateLibrary, Route::Library(library))
            .server(server_name)
            .param("engine", &definition.engine)
            .param("displayName", &definition.display_name)
            .param("path", &definition.path)
            .param("location", &definition.location)
            .param("repositoryName", repository)
            .flag("isPreassigned", definition.is_preassigned)
            .build()
    }

    /// Register a library on a named workspace server.
    pub fn create_library(
        &self,
        server_name: &str,
        library: &str,
        definition: &LibraryDefinition,
        repository: &str,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        self.execute(
            &self.build_create_library(server_name, library, definition, repository),
            mode,
        )
    }

    pub fn build_delete_library(&self, server_name: &str, library: &str, repository: &str) -> HttpRequest {
        self.request(Operation::DeleteLibrary, Route::Library(library))
            .server(server_name)
            .param("repositoryName", repository)
            .build()
    }

    /// Remove every library named `library` from a workspace server.
    pub fn delete_library(
        &self,
        server_name: &str,
        library: &str,
        repository: &str,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        self.execute(&self.build_delete_library(server_name, library, repository), mode)
    }

    // ---------------------------------------------------------------------
    // Datasets and data
    // ---------------------------------------------------------------------

    pub fn build_get_dataset_list(&self, library: &str, target: &Target) -> HttpRequest {
        self.request(Operation::GetDatasetList, Route::Datasets { library })
            .target(target)
            .build()
    }

    pub fn get_dataset_list(
        &self,
        library: &str,
        target: &Target,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        self.execute(&self.build_get_dataset_list(library, target), mode)
    }

    pub fn build_get_dataset_info(&self, library: &str, dataset: &str, target: &Target) -> HttpRequest {
        self.request(Operation::GetDatasetInfo, Route::Dataset { library, dataset })
            .target(target)
            .build()
    }

    pub fn get_dataset_info(
        &self,
        library: &str,
        dataset: &str,
        target: &Target,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        self.execute(&self.build_get_dataset_info(library, dataset, target), mode)
    }

    pub fn build_retrieve_data(
        &self,
        library: &str,
        dataset: &str,
        target: &Target,
        window: &DataWindow,
    ) -> HttpRequest {
        self.request(Operation::RetrieveData, Route::Data { library, dataset })
            .param("limit", window.limit)
            .param("offset", window.offset)
            .param_opt("filter", window.filter.as_deref())
            .target(target)
            .build()
    }

    /// Records of a dataset within `window`.
    pub fn retrieve_data(
        &self,
        library: &str,
        dataset: &str,
        target: &Target,
        window: &DataWindow,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        self.execute(&self.build_retrieve_data(library, dataset, target, window), mode)
    }

    pub fn build_insert_data(
        &self,
        library: &str,
        dataset: &str,
        records: &[Record],
        target: &Target,
        by_key: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        Ok(self
            .request(Operation::InsertData, Route::Data { library, dataset })
            .param_opt("byKey", by_key)
            .target(target)
            .json_body(records)?
            .build())
    }

    /// Append records to a dataset. With `by_key`, records whose value in
    /// that column matches an existing record replace it instead.
    pub fn insert_data(
        &self,
        library: &str,
        dataset: &str,
        records: &[Record],
        target: &Target,
        by_key: Option<&str>,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        let request = self.build_insert_data(library, dataset, records, target, by_key)?;
        self.execute(&request, mode)
    }

    pub fn build_replace_all_data(
        &self,
        library: &str,
        dataset: &str,
        records: &[Record],
        target: &Target,
    ) -> Result<HttpRequest, ApiError> {
        Ok(self
            .request(Operation::ReplaceAllData, Route::Data { library, dataset })
            .target(target)
            .json_body(records)?
            .build())
    }

    /// Replace the full contents of a dataset with `records`.
    pub fn replace_all_data(
        &self,
        library: &str,
        dataset: &str,
        records: &[Record],
        target: &Target,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        let request = self.build_replace_all_data(library, dataset, records, target)?;
        self.execute(&request, mode)
    }

    pub fn build_delete_dataset(&self, library: &str, dataset: &str, target: &Target) -> HttpRequest {
        self.request(Operation::DeleteDataset, Route::Data { library, dataset })
            .target(target)
            .build()
    }

    pub fn delete_dataset(
        &self,
        library: &str,
        dataset: &str,
        target: &Target,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        self.execute(&self.build_delete_dataset(library, dataset, target), mode)
    }

    // ---------------------------------------------------------------------
    // Metadata objects
    // ---------------------------------------------------------------------

    pub fn build_find_object(&self, criteria: &SearchCriteria) -> HttpRequest {
        if !criteria.has_filter() {
            tracing::warn!(
                "find_object called without any search criteria; the proxy will not return \
                 meaningful results"
            );
        }
        let c = criteria;
        self.request(Operation::FindObject, Route::Search)
            .param("repositoryName", &c.repository)
            .param_opt("location", c.location.as_deref())
            .flag("locationRecursive", c.location_recursive)
            .param_opt("objectID", c.object_id.as_deref())
            .param_opt("objectType", c.object_type.as_deref())
            .param_opt("publicType", c.public_type.as_deref())
            .param_opt("nameEquals", c.name_equals.as_deref())
            .param_opt("nameStarts", c.name_starts.as_deref())
            .param_opt("nameContains", c.name_contains.as_deref())
            .param_opt("nameRegex", c.name_regex.as_deref())
            .param_opt("descriptionContains", c.description_contains.as_deref())
            .param_opt("descriptionRegex", c.description_regex.as_deref())
            .param_opt("createdGt", c.created_gt.as_deref())
            .param_opt("createdLt", c.created_lt.as_deref())
            .param_opt("modifiedGt", c.modified_gt.as_deref())
            .param_opt("modifiedLt", c.modified_lt.as_deref())
            .param_opt("tableLibref", c.table_libref.as_deref())
            .param_opt("tableDBMS", c.table_dbms.as_deref())
            .flag("includeAssociations", c.include_associations)
            .flag("includePermissions", c.include_permissions)
            .build()
    }

    /// Search metadata objects.
    pub fn find_object(&self, criteria: &SearchCriteria, mode: ResponseMode) -> Result<Value, ApiError> {
        self.execute(&self.build_find_object(criteria), mode)
    }

    /// Build a move request.
    ///
    /// `destinationLocation` carries the PublicType and `publicType` carries
    /// the destination folder. The proxy reads these two parameters the
    /// other way round; swapping them here makes the move land where asked.
    /// Both sides have to change together once the proxy is fixed.
    pub fn build_move_object(
        &self,
        object: &ObjectRef,
        destination_location: &str,
        repository: &str,
    ) -> HttpRequest {
        self.request(Operation::MoveObject, Route::MoveObject)
            .param("sourceLocation", &object.location)
            .param("sourceName", &object.name)
            .param("destinationLocation", &object.public_type)
            .param("publicType", destination_location)
            .param("repositoryName", repository)
            .build()
    }

    /// Move a metadata object to another folder.
    pub fn move_object(
        &self,
        object: &ObjectRef,
        destination_location: &str,
        repository: &str,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        self.execute(
            &self.build_move_object(object, destination_location, repository),
            mode,
        )
    }

    pub fn build_delete_object(&self, object: &ObjectRef, repository: &str) -> HttpRequest {
        self.request(Operation::DeleteObject, Route::DeleteObject)
            .param("sourceLocation", &object.location)
            .param("sourceName", &object.name)
            .param("publicType", &object.public_type)
            .param("repositoryName", repository)
            .build()
    }

    pub fn delete_object(
        &self,
        object: &ObjectRef,
        repository: &str,
        mode: ResponseMode,
    ) -> Result<Value, ApiError> {
        self.execute(&self.build_delete_object(object, repository), mode)
    }
}

/// Classify the response to `request`.
///
/// A non-2xx status is an `Http` failure carrying the envelope's `error`
/// when the body has one. A 2xx with an empty or `null` body is a bodiless
/// success and yields `Value::Null` in either mode. Any other 2xx body must
/// be a JSON object; in `PayloadOnly` mode it must also contain `payload`.
pub fn parse_response(
    request: &HttpRequest,
    response: HttpResponse,
    mode: ResponseMode,
) -> Result<Value, ApiError> {
    if !response.is_success() {
        return Err(http_failure(request, response));
    }

    // Move and delete answer success with no envelope at all.
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    let value: Value = serde_json::from_str(&response.body)
        .map_err(|e| ApiError::malformed(&request.endpoint, format!("body is not JSON: {e}")))?;
    if value.is_null() {
        return Ok(Value::Null);
    }
    let Value::Object(mut envelope) = value else {
        return Err(ApiError::malformed(
            &request.endpoint,
            "expected a JSON object envelope",
        ));
    };

    match mode {
        ResponseMode::Envelope => Ok(Value::Object(envelope)),
        ResponseMode::PayloadOnly => envelope
            .remove("payload")
            .ok_or_else(|| ApiError::malformed(&request.endpoint, "envelope has no payload field")),
    }
}

fn http_failure(request: &HttpRequest, response: HttpResponse) -> ApiError {
    let server_message = serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|body| body.get("error").and_then(error_text));
    let message = server_message.unwrap_or_else(|| {
        format!(
            "HTTP error status {} for url: {}",
            response.status,
            request.full_url()
        )
    });
    ApiError::Http {
        status: response.status,
        endpoint: request.endpoint.clone(),
        message,
        body: response.body,
    }
}
