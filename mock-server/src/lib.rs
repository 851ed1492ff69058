//! In-memory stand-in for the SAS9API proxy.
//!
//! Serves the proxy's endpoint catalog over axum with seeded metadata: two
//! workspace servers, a stored process server, users, groups, roles, the
//! `SASHELP.CLASS` dataset and a few metadata folder objects. Answers are
//! envelopes `{status, error, payload}`, except that object move and delete
//! succeed without one.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub type Record = Map<String, Value>;
pub type Params = HashMap<String, String>;
pub type Db = Arc<RwLock<Proxy>>;
pub type ApiResult = Result<Json<Value>, ProxyError>;

/// The only metadata repository the mock knows.
pub const REPOSITORY: &str = "Foundation";
/// Server used when a request names neither a server nor a host/port.
pub const DEFAULT_SERVER: &str = "SASApp";

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceServer {
    pub name: String,
    pub host: String,
    pub port: u16,
    #[serde(skip)]
    pub libraries: BTreeMap<String, Library>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub name: String,
    pub engine: String,
    pub display_name: String,
    pub path: String,
    pub location: String,
    pub is_preassigned: bool,
    #[serde(skip)]
    pub datasets: BTreeMap<String, Vec<Record>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaObject {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub public_type: String,
    pub description: String,
}

/// Proxy state shared by all handlers.
#[derive(Clone, Debug)]
pub struct Proxy {
    pub servers: BTreeMap<String, WorkspaceServer>,
    pub stp_servers: Vec<Value>,
    pub users: Vec<Value>,
    pub configured_user: String,
    pub groups: Vec<Value>,
    pub roles: Vec<Value>,
    pub objects: Vec<MetaObject>,
}

impl Proxy {
    pub fn seeded() -> Self {
        let class = [("Alfred", "M", 14), ("Alice", "F", 13), ("Barbara", "F", 13), ("Carol", "F", 14), ("Henry", "M", 14)]
            .into_iter()
            .map(|(name, sex, age)| record(json!({"Name": name, "Sex": sex, "Age": age})))
            .collect();

        let sashelp = Library {
            name: "SASHELP".to_string(),
            engine: "V9".to_string(),
            display_name: "SAS Help Files".to_string(),
            path: "/opt/sas/sashelp".to_string(),
            location: "/Shared Data".to_string(),
            is_preassigned: true,
            datasets: BTreeMap::from([("CLASS".to_string(), class)]),
        };
        let work = Library {
            name: "WORK".to_string(),
            engine: "V9".to_string(),
            display_name: "Work".to_string(),
            path: "/saswork".to_string(),
            location: "/Shared Data".to_string(),
            is_preassigned: true,
            datasets: BTreeMap::new(),
        };

        let servers = [
            WorkspaceServer {
                name: DEFAULT_SERVER.to_string(),
                host: "sas-compute.local".to_string(),
                port: 8591,
                libraries: BTreeMap::from([("SASHELP".to_string(), sashelp)]),
            },
            WorkspaceServer {
                name: "SASBatch".to_string(),
                host: "sas-batch.local".to_string(),
                port: 8592,
                libraries: BTreeMap::from([("WORK".to_string(), work)]),
            },
        ]
        .into_iter()
        .map(|server| (server.name.clone(), server))
        .collect();

        let object = |name: &str, location: &str, public_type: &str, description: &str| MetaObject {
            id: Uuid::new_v4(),
            name: name.to_string(),
            location: location.to_string(),
            public_type: public_type.to_string(),
            description: description.to_string(),
        };

        Self {
            servers,
            stp_servers: vec![json!({
                "name": "SASApp - Stored Process Server",
                "host": "sas-compute.local",
                "port": 8601,
            })],
            users: vec![
                json!({"name": "sasadm", "displayName": "SAS Administrator", "identities": ["SAS Administrators"]}),
                json!({"name": "sasdemo", "displayName": "SAS Demo User", "identities": ["SASUSERS"]}),
            ],
            configured_user: "sasdemo".to_string(),
            groups: vec![
                json!({"name": "SAS Administrators", "groups": [], "users": ["sasadm"]}),
                json!({"name": "SASUSERS", "groups": ["SAS Administrators"], "users": ["sasdemo"]}),
            ],
            roles: vec![json!({
                "name": "Management Console: Advanced",
                "groups": ["SAS Administrators"],
                "users": [],
            })],
            objects: vec![
                object("Sales Summary", "/Shared Data/Reports", "Report", "Quarterly sales by region"),
                object("CLASS", "/Shared Data/Tables", "Table", "Student roster"),
                object("Orders", "/Shared Data/Tables/Archive", "Table", "Archived order lines"),
            ],
        }
    }

    /// Resolve the server a request addresses: path scope first, then the
    /// `serverUrl`/`serverPort` pair, then the default server.
    pub fn resolve_server(&self, scoped: Option<&str>, params: &Params) -> Result<String, ProxyError> {
        if let Some(name) = scoped {
            return self
                .servers
                .contains_key(name)
                .then(|| name.to_string())
                .ok_or_else(|| ProxyError::not_found(format!("Server '{name}' not found")));
        }
        match (params.get("serverUrl"), params.get("serverPort")) {
            (Some(url), Some(port)) => self
                .servers
                .values()
                .find(|s| &s.host == url && s.port.to_string() == *port)
                .map(|s| s.name.clone())
                .ok_or_else(|| ProxyError::not_found(format!("No server at {url}:{port}"))),
            _ => Ok(DEFAULT_SERVER.to_string()),
        }
    }

    fn library(&self, server: &str, library: &str) -> Result<&Library, ProxyError> {
        self.servers
            .get(server)
            .and_then(|s| s.libraries.get(library))
            .ok_or_else(|| ProxyError::not_found(format!("Library '{library}' not found on '{server}'")))
    }

    fn library_mut(&mut self, server: &str, library: &str) -> Result<&mut Library, ProxyError> {
        self.servers
            .get_mut(server)
            .and_then(|s| s.libraries.get_mut(library))
            .ok_or_else(|| ProxyError::not_found(format!("Library '{library}' not found on '{server}'")))
    }
}

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

/// A failed request, rendered as an error envelope.
#[derive(Debug)]
pub struct ProxyError {
    pub status: StatusCode,
    pub message: String,
}

impl ProxyError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::debug!(status = self.status.as_u16(), error = %self.message, "Rejecting request");
        let body = json!({
            "status": self.status.as_u16(),
            "error": self.message,
            "payload": null,
        });
        (self.status, Json(body)).into_response()
    }
}

fn ok(payload: Value) -> ApiResult {
    Ok(Json(json!({"status": 200, "error": null, "payload": payload})))
}

fn to_payload<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn check_repository(params: &Params) -> Result<(), ProxyError> {
    match params.get("repositoryName") {
        Some(repository) if repository != REPOSITORY => Err(ProxyError::not_found(format!(
            "Repository '{repository}' not found"
        ))),
        _ => Ok(()),
    }
}

fn required<'a>(params: &'a Params, key: &str) -> Result<&'a str, ProxyError> {
    params
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| ProxyError::bad_request(format!("Missing parameter '{key}'")))
}

fn find_named<'a>(items: &'a [Value], name: &str, kind: &str) -> Result<&'a Value, ProxyError> {
    items
        .iter()
        .find(|item| item["name"] == name)
        .ok_or_else(|| ProxyError::not_found(format!("{kind} '{name}' not found")))
}

pub fn app() -> Router {
    app_with(Proxy::seeded())
}

pub fn app_with(proxy: Proxy) -> Router {
    let db: Db = Arc::new(RwLock::new(proxy));
    Router::new()
        .route("/sas/", get(metadata_config))
        .route("/sas/license", get(license))
        .route("/sas/servers", get(list_servers))
        .route("/sas/servers/{server}", get(get_server))
        .route("/sas/stp", get(list_stp_servers))
        .route("/sas/stp/{server}", get(get_stp_server))
        .route("/sas/cmd", put(command))
        .route("/sas/servers/{server}/cmd", put(command_on))
        .route("/sas/user", get(configured_user))
        .route("/sas/meta/users", get(list_users))
        .route("/sas/meta/users/{name}", get(get_user))
        .route("/sas/meta/groups", get(list_groups))
        .route("/sas/meta/groups/{name}", get(get_group))
        .route("/sas/meta/roles", get(list_roles))
        .route("/sas/meta/roles/{name}", get(get_role))
        .route("/sas/libraries", get(libraries))
        .route("/sas/libraries/{library}", get(library))
        .route("/sas/libraries/{library}/datasets", get(datasets))
        .route("/sas/libraries/{library}/datasets/{dataset}", get(dataset))
        .route(
            "/sas/libraries/{library}/datasets/{dataset}/data",
            get(read_data).put(insert_data).post(replace_data).delete(delete_data),
        )
        .route("/sas/servers/{server}/libraries", get(libraries_on))
        .route(
            "/sas/servers/{server}/libraries/{library}",
            get(library_on).post(create_library).delete(delete_library),
        )
        .route("/sas/servers/{server}/libraries/{library}/datasets", get(datasets_on))
        .route(
            "/sas/servers/{server}/libraries/{library}/datasets/{dataset}",
            get(dataset_on),
        )
        .route(
            "/sas/servers/{server}/libraries/{library}/datasets/{dataset}/data",
            get(read_data_on)
                .put(insert_data_on)
                .post(replace_data_on)
                .delete(delete_data_on),
        )
        .route("/sas/meta/search", get(search))
        .route("/sas/meta/objects/move", post(move_object))
        .route("/sas/meta/objects/delete", post(delete_object))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Metadata server, license, servers
// ---------------------------------------------------------------------------

async fn metadata_config() -> ApiResult {
    ok(json!({
        "host": "sas-meta.local",
        "port": 8561,
        "repository": REPOSITORY,
        "user": "sasdemo",
    }))
}

async fn license() -> ApiResult {
    ok(json!({
        "product": "SAS9API",
        "licensedTo": "Example Corp",
        "expiresAt": "2027-12-31",
    }))
}

async fn list_servers(State(db): State<Db>, Query(params): Query<Params>) -> ApiResult {
    check_repository(&params)?;
    let proxy = db.read().await;
    ok(to_payload(&proxy.servers.values().collect::<Vec<_>>()))
}

async fn get_server(
    State(db): State<Db>,
    Path(server): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult {
    check_repository(&params)?;
    let proxy = db.read().await;
    let server = proxy
        .servers
        .get(&server)
        .ok_or_else(|| ProxyError::not_found(format!("Server '{server}' not found")))?;
    ok(to_payload(server))
}

async fn list_stp_servers(State(db): State<Db>, Query(params): Query<Params>) -> ApiResult {
    check_repository(&params)?;
    ok(Value::Array(db.read().await.stp_servers.clone()))
}

async fn get_stp_server(
    State(db): State<Db>,
    Path(server): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult {
    check_repository(&params)?;
    let proxy = db.read().await;
    ok(find_named(&proxy.stp_servers, &server, "Stored Process server")?.clone())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn command(State(db): State<Db>, Query(params): Query<Params>, code: String) -> ApiResult {
    run_command(&db, None, &params, &code).await
}

async fn command_on(
    State(db): State<Db>,
    Path(server): Path<String>,
    Query(params): Query<Params>,
    code: String,
) -> ApiResult {
    run_command(&db, Some(&server), &params, &code).await
}

async fn run_command(db: &Db, scoped: Option<&str>, params: &Params, code: &str) -> ApiResult {
    check_repository(params)?;
    let server = db.read().await.resolve_server(scoped, params)?;
    if code.trim().is_empty() {
        return Err(ProxyError::bad_request("Command is empty"));
    }
    let mut payload = json!({"server": server});
    if params.get("logEnabled").map(String::as_str) == Some("true") {
        let log = code
            .lines()
            .enumerate()
            .map(|(i, line)| format!("{:<5}{line}", i + 1))
            .collect::<Vec<_>>()
            .join("\n");
        payload["log"] = Value::String(log);
    }
    ok(payload)
}

// ---------------------------------------------------------------------------
// Users, groups, roles
// ---------------------------------------------------------------------------

async fn configured_user(State(db): State<Db>, Query(params): Query<Params>) -> ApiResult {
    check_repository(&params)?;
    let proxy = db.read().await;
    ok(find_named(&proxy.users, &proxy.configured_user, "User")?.clone())
}

async fn list_users(State(db): State<Db>, Query(params): Query<Params>) -> ApiResult {
    check_repository(&params)?;
    ok(Value::Array(db.read().await.users.clone()))
}

async fn get_user(
    State(db): State<Db>,
    Path(name): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult {
    check_repository(&params)?;
    ok(find_named(&db.read().await.users, &name, "User")?.clone())
}

async fn list_groups(State(db): State<Db>, Query(params): Query<Params>) -> ApiResult {
    check_repository(&params)?;
    ok(Value::Array(db.read().await.groups.clone()))
}

async fn get_group(
    State(db): State<Db>,
    Path(name): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult {
    check_repository(&params)?;
    ok(find_named(&db.read().await.groups, &name, "Group")?.clone())
}

async fn list_roles(State(db): State<Db>, Query(params): Query<Params>) -> ApiResult {
    check_repository(&params)?;
    ok(Value::Array(db.read().await.roles.clone()))
}

async fn get_role(
    State(db): State<Db>,
    Path(name): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult {
    check_repository(&params)?;
    ok(find_named(&db.read().await.roles, &name, "Role")?.clone())
}

// ---------------------------------------------------------------------------
// Libraries
// ---------------------------------------------------------------------------

async fn libraries(State(db): State<Db>, Query(params): Query<Params>) -> ApiResult {
    list_libraries(&db, None, &params).await
}

async fn libraries_on(
    State(db): State<Db>,
    Path(server): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult {
    list_libraries(&db, Some(&server), &params).await
}

async fn list_libraries(db: &Db, scoped: Option<&str>, params: &Params) -> ApiResult {
    check_repository(params)?;
    let proxy = db.read().await;
    let server = proxy.resolve_server(scoped, params)?;
    let libraries: Vec<&Library> = proxy.servers[&server].libraries.values().collect();
    ok(to_payload(&libraries))
}

async fn library(
    State(db): State<Db>,
    Path(library): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult {
    library_info(&db, None, &library, &params).await
}

async fn library_on(
    State(db): State<Db>,
    Path((server, library)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> ApiResult {
    library_info(&db, Some(&server), &library, &params).await
}

async fn library_info(db: &Db, scoped: Option<&str>, library: &str, params: &Params) -> ApiResult {
    check_repository(params)?;
    let proxy = db.read().await;
    let server = proxy.resolve_server(scoped, params)?;
    let library = proxy.library(&server, library)?;
    let mut payload = to_payload(library);
    payload["datasets"] = library.datasets.keys().cloned().collect();
    ok(payload)
}

async fn create_library(
    State(db): State<Db>,
    Path((server, library)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> ApiResult {
    check_repository(&params)?;
    let definition = Library {
        name: library.clone(),
        engine: required(&params, "engine")?.to_string(),
        display_name: required(&params, "displayName")?.to_string(),
        path: required(&params, "path")?.to_string(),
        location: required(&params, "location")?.to_string(),
        is_preassigned: params.get("isPreassigned").map(String::as_str) == Some("true"),
        datasets: BTreeMap::new(),
    };

    let mut proxy = db.write().await;
    let server = proxy.resolve_server(Some(&server), &params)?;
    let libraries = &mut proxy
        .servers
        .get_mut(&server)
        .ok_or_else(|| ProxyError::not_found(format!("Server '{server}' not found")))?
        .libraries;
    if libraries.contains_key(&library) {
        return Err(ProxyError::conflict(format!(
            "Library '{library}' already exists on '{server}'"
        )));
    }
    let payload = to_payload(&definition);
    libraries.insert(library, definition);
    ok(payload)
}

async fn delete_library(
    State(db): State<Db>,
    Path((server, library)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> ApiResult {
    check_repository(&params)?;
    let mut proxy = db.write().await;
    let server = proxy.resolve_server(Some(&server), &params)?;
    proxy
        .servers
        .get_mut(&server)
        .and_then(|s| s.libraries.remove(&library))
        .ok_or_else(|| ProxyError::not_found(format!("Library '{library}' not found on '{server}'")))?;
    ok(json!({"deleted": library}))
}

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

async fn datasets(
    State(db): State<Db>,
    Path(library): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult {
    list_datasets(&db, None, &library, &params).await
}

async fn datasets_on(
    State(db): State<Db>,
    Path((server, library)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> ApiResult {
    list_datasets(&db, Some(&server), &library, &params).await
}

async fn list_datasets(db: &Db, scoped: Option<&str>, library: &str, params: &Params) -> ApiResult {
    check_repository(params)?;
    let proxy = db.read().await;
    let server = proxy.resolve_server(scoped, params)?;
    let datasets: Vec<Value> = proxy
        .library(&server, library)?
        .datasets
        .iter()
        .map(|(name, rows)| dataset_summary(library, name, rows))
        .collect();
    ok(Value::Array(datasets))
}

async fn dataset(
    State(db): State<Db>,
    Path((library, dataset)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> ApiResult {
    dataset_info(&db, None, &library, &dataset, &params).await
}

async fn dataset_on(
    State(db): State<Db>,
    Path((server, library, dataset)): Path<(String, String, String)>,
    Query(params): Query<Params>,
) -> ApiResult {
    dataset_info(&db, Some(&server), &library, &dataset, &params).await
}

async fn dataset_info(
    db: &Db,
    scoped: Option<&str>,
    library: &str,
    dataset: &str,
    params: &Params,
) -> ApiResult {
    check_repository(params)?;
    let proxy = db.read().await;
    let server = proxy.resolve_server(scoped, params)?;
    let rows = proxy
        .library(&server, library)?
        .datasets
        .get(dataset)
        .ok_or_else(|| ProxyError::not_found(format!("Dataset '{library}.{dataset}' not found")))?;
    ok(dataset_summary(library, dataset, rows))
}

fn dataset_summary(library: &str, dataset: &str, rows: &[Record]) -> Value {
    let columns: Vec<&String> = rows.first().map(|row| row.keys().collect()).unwrap_or_default();
    json!({
        "library": library,
        "name": dataset,
        "rowCount": rows.len(),
        "columns": columns,
    })
}

// ---------------------------------------------------------------------------
// Data
// ---------------------------------------------------------------------------

async fn read_data(
    State(db): State<Db>,
    Path((library, dataset)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> ApiResult {
    select_rows(&db, None, &library, &dataset, &params).await
}

async fn read_data_on(
    State(db): State<Db>,
    Path((server, library, dataset)): Path<(String, String, String)>,
    Query(params): Query<Params>,
) -> ApiResult {
    select_rows(&db, Some(&server), &library, &dataset, &params).await
}

async fn select_rows(
    db: &Db,
    scoped: Option<&str>,
    library: &str,
    dataset: &str,
    params: &Params,
) -> ApiResult {
    check_repository(params)?;
    let limit = numeric(params, "limit", 100)?.min(10_000);
    let offset = numeric(params, "offset", 0)?;
    let filter = match params.get("filter") {
        Some(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(filter)) => filter,
            _ => return Err(ProxyError::bad_request("filter must be a JSON object")),
        },
        None => Map::new(),
    };

    let proxy = db.read().await;
    let server = proxy.resolve_server(scoped, params)?;
    let rows = proxy
        .library(&server, library)?
        .datasets
        .get(dataset)
        .ok_or_else(|| ProxyError::not_found(format!("Dataset '{library}.{dataset}' not found")))?;
    let selected: Vec<&Record> = rows
        .iter()
        .filter(|row| matches_filter(row, &filter))
        .skip(offset)
        .take(limit)
        .collect();
    ok(to_payload(&selected))
}

fn numeric(params: &Params, key: &str, default: usize) -> Result<usize, ProxyError> {
    match params.get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ProxyError::bad_request(format!("'{key}' must be a non-negative integer"))),
        None => Ok(default),
    }
}

/// A row matches when every filter column holds an equal value.
pub fn matches_filter(row: &Record, filter: &Map<String, Value>) -> bool {
    filter.iter().all(|(column, expected)| row.get(column) == Some(expected))
}

async fn insert_data(
    State(db): State<Db>,
    Path((library, dataset)): Path<(String, String)>,
    Query(params): Query<Params>,
    Json(records): Json<Vec<Record>>,
) -> ApiResult {
    upsert_rows(&db, None, &library, &dataset, &params, records).await
}

async fn insert_data_on(
    State(db): State<Db>,
    Path((server, library, dataset)): Path<(String, String, String)>,
    Query(params): Query<Params>,
    Json(records): Json<Vec<Record>>,
) -> ApiResult {
    upsert_rows(&db, Some(&server), &library, &dataset, &params, records).await
}

async fn upsert_rows(
    db: &Db,
    scoped: Option<&str>,
    library: &str,
    dataset: &str,
    params: &Params,
    records: Vec<Record>,
) -> ApiResult {
    check_repository(params)?;
    let mut proxy = db.write().await;
    let server = proxy.resolve_server(scoped, params)?;
    let rows = proxy
        .library_mut(&server, library)?
        .datasets
        .get_mut(dataset)
        .ok_or_else(|| ProxyError::not_found(format!("Dataset '{library}.{dataset}' not found")))?;

    let by_key = params.get("byKey");
    let (mut inserted, mut updated) = (0, 0);
    for incoming in records {
        let existing = by_key.and_then(|key| {
            let value = incoming.get(key)?;
            rows.iter().position(|row| row.get(key) == Some(value))
        });
        match existing {
            Some(index) => {
                rows[index] = incoming;
                updated += 1;
            }
            None => {
                rows.push(incoming);
                inserted += 1;
            }
        }
    }
    ok(json!({"inserted": inserted, "updated": updated}))
}

async fn replace_data(
    State(db): State<Db>,
    Path((library, dataset)): Path<(String, String)>,
    Query(params): Query<Params>,
    Json(records): Json<Vec<Record>>,
) -> ApiResult {
    replace_rows(&db, None, &library, &dataset, &params, records).await
}

async fn replace_data_on(
    State(db): State<Db>,
    Path((server, library, dataset)): Path<(String, String, String)>,
    Query(params): Query<Params>,
    Json(records): Json<Vec<Record>>,
) -> ApiResult {
    replace_rows(&db, Some(&server), &library, &dataset, &params, records).await
}

/// Replace the rows of a dataset, creating the dataset if needed.
async fn replace_rows(
    db: &Db,
    scoped: Option<&str>,
    library: &str,
    dataset: &str,
    params: &Params,
    records: Vec<Record>,
) -> ApiResult {
    check_repository(params)?;
    let mut proxy = db.write().await;
    let server = proxy.resolve_server(scoped, params)?;
    let count = records.len();
    proxy
        .library_mut(&server, library)?
        .datasets
        .insert(dataset.to_string(), records);
    ok(json!({"rows": count}))
}

async fn delete_data(
    State(db): State<Db>,
    Path((library, dataset)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> ApiResult {
    drop_dataset(&db, None, &library, &dataset, &params).await
}

async fn delete_data_on(
    State(db): State<Db>,
    Path((server, library, dataset)): Path<(String, String, String)>,
    Query(params): Query<Params>,
) -> ApiResult {
    drop_dataset(&db, Some(&server), &library, &dataset, &params).await
}

async fn drop_dataset(
    db: &Db,
    scoped: Option<&str>,
    library: &str,
    dataset: &str,
    params: &Params,
) -> ApiResult {
    check_repository(params)?;
    let mut proxy = db.write().await;
    let server = proxy.resolve_server(scoped, params)?;
    proxy
        .library_mut(&server, library)?
        .datasets
        .remove(dataset)
        .ok_or_else(|| ProxyError::not_found(format!("Dataset '{library}.{dataset}' not found")))?;
    ok(Value::Null)
}

// ---------------------------------------------------------------------------
// Metadata objects
// ---------------------------------------------------------------------------

/// Parameters that count as search criteria. `objectType` and the regex,
/// date and table filters are accepted but not evaluated.
const SEARCH_FILTERS: [&str; 16] = [
    "location",
    "objectID",
    "objectType",
    "publicType",
    "nameEquals",
    "nameStarts",
    "nameContains",
    "nameRegex",
    "descriptionContains",
    "descriptionRegex",
    "createdGt",
    "createdLt",
    "modifiedGt",
    "modifiedLt",
    "tableLibref",
    "tableDBMS",
];

async fn search(State(db): State<Db>, Query(params): Query<Params>) -> ApiResult {
    check_repository(&params)?;
    if !SEARCH_FILTERS.iter().any(|key| params.contains_key(*key)) {
        return ok(json!([]));
    }
    let proxy = db.read().await;
    let found: Vec<&MetaObject> = proxy
        .objects
        .iter()
        .filter(|object| matches_search(object, &params))
        .collect();
    ok(to_payload(&found))
}

pub fn matches_search(object: &MetaObject, params: &Params) -> bool {
    fn lower(s: &str) -> String {
        s.to_lowercase()
    }
    let name = lower(&object.name);
    let recursive = params.get("locationRecursive").map(String::as_str) != Some("false");

    params.get("location").is_none_or(|location| {
        object.location == *location
            || (recursive && object.location.starts_with(&format!("{}/", location.trim_end_matches('/'))))
    }) && params
        .get("objectID")
        .is_none_or(|id| object.id.to_string() == *id)
        && params
            .get("publicType")
            .is_none_or(|types| types.split(',').any(|t| t.trim() == object.public_type))
        && params.get("nameEquals").is_none_or(|v| name == lower(v))
        && params.get("nameStarts").is_none_or(|v| name.starts_with(&lower(v)))
        && params.get("nameContains").is_none_or(|v| name.contains(&lower(v)))
        && params
            .get("descriptionContains")
            .is_none_or(|v| lower(&object.description).contains(&lower(v)))
}

/// Move an object between folders.
///
/// The proxy reads `publicType` as the destination folder and
/// `destinationLocation` as the object's PublicType; clients send them
/// accordingly. Success carries no body.
async fn move_object(
    State(db): State<Db>,
    Query(params): Query<Params>,
) -> Result<StatusCode, ProxyError> {
    check_repository(&params)?;
    let location = required(&params, "sourceLocation")?;
    let name = required(&params, "sourceName")?;
    let public_type = required(&params, "destinationLocation")?;
    let destination = required(&params, "publicType")?;

    let mut proxy = db.write().await;
    let object = proxy
        .objects
        .iter_mut()
        .find(|o| o.location == location && o.name == name && o.public_type == public_type)
        .ok_or_else(|| {
            ProxyError::not_found(format!("{public_type} '{name}' not found in '{location}'"))
        })?;
    object.location = destination.to_string();
    Ok(StatusCode::NO_CONTENT)
}

/// Success answers with a bare `null` instead of an envelope.
async fn delete_object(State(db): State<Db>, Query(params): Query<Params>) -> ApiResult {
    check_repository(&params)?;
    let location = required(&params, "sourceLocation")?;
    let name = required(&params, "sourceName")?;
    let public_type = required(&params, "publicType")?;

    let mut proxy = db.write().await;
    let before = proxy.objects.len();
    proxy
        .objects
        .retain(|o| !(o.location == location && o.name == name && o.public_type == public_type));
    if proxy.objects.len() == before {
        return Err(ProxyError::not_found(format!(
            "{public_type} '{name}' not found in '{location}'"
        )));
    }
    Ok(Json(Value::Null))
}
