//! Verify request building and response classification against the JSON
//! vectors stored in `test-vectors/`.
//!
//! `endpoints.json` pins the method, path and ordered query of every
//! operation. `responses.json` pins how simulated responses are classified.
//! Bodies are compared as parsed JSON, not raw strings.

use std::collections::BTreeSet;

use sas9api::{
    parse_response, ApiError, ClientConfig, DataWindow, HttpMethod, HttpRequest, HttpResponse,
    LibraryDefinition, ObjectRef, Operation, Record, ResponseMode, Sas9ApiClient, SearchCriteria,
    Target, UreqTransport,
};
use serde_json::Value;

fn client(base_url: &str) -> Sas9ApiClient<UreqTransport> {
    Sas9ApiClient::new(ClientConfig::new(base_url)).unwrap()
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn str_arg<'a>(args: &'a Value, key: &str) -> &'a str {
    args[key]
        .as_str()
        .unwrap_or_else(|| panic!("missing string argument {key}"))
}

/// `null` is the default server; otherwise the object's fields go through
/// `Target::resolve`.
fn target_arg(args: &Value) -> Target {
    let t = &args["target"];
    if t.is_null() {
        return Target::Default;
    }
    Target::resolve(
        t["server_name"].as_str(),
        t["repository"].as_str().unwrap_or("Foundation"),
        t["server_url"].as_str(),
        t["server_port"].as_u64().map(|p| p as u16),
    )
}

fn from_arg<T: serde::de::DeserializeOwned>(args: &Value, key: &str) -> T {
    serde_json::from_value(args[key].clone()).unwrap_or_else(|e| panic!("bad argument {key}: {e}"))
}

fn build(c: &Sas9ApiClient, operation: Operation, args: &Value) -> HttpRequest {
    let repository = || str_arg(args, "repository");
    match operation {
        Operation::GetMetadataServerConfig => c.build_get_metadata_server_config(),
        Operation::GetLicenseInfo => c.build_get_license_info(),
        Operation::GetWorkspaceServerList => c.build_get_workspace_server_list(repository()),
        Operation::GetWorkspaceServerConfig => {
            c.build_get_workspace_server_config(str_arg(args, "server_name"), repository())
        }
        Operation::GetStpServerList => c.build_get_stp_server_list(repository()),
        Operation::GetStpServerConfig => {
            c.build_get_stp_server_config(str_arg(args, "server_name"), repository())
        }
        Operation::ExecuteCommand => c.build_execute_command(
            str_arg(args, "command"),
            &target_arg(args),
            args["log_enabled"].as_bool().unwrap_or(false),
        ),
        Operation::GetUserList => c.build_get_user_list(repository()),
        Operation::GetConfiguredUserInfo => c.build_get_configured_user_info(repository()),
        Operation::GetUserInfo => c.build_get_user_info(str_arg(args, "name"), repository()),
        Operation::GetGroupList => c.build_get_group_list(repository()),
        Operation::GetGroupInfo => c.build_get_group_info(str_arg(args, "name"), repository()),
        Operation::GetRoleList => c.build_get_role_list(repository()),
        Operation::GetRoleInfo => c.build_get_role_info(str_arg(args, "name"), repository()),
        Operation::GetLibraryList => c.build_get_library_list(&target_arg(args)),
        Operation::GetLibraryInfo => {
            c.build_get_library_info(str_arg(args, "library"), &target_arg(args))
        }
        Operation::CreateLibrary => {
            let definition: LibraryDefinition = from_arg(args, "definition");
            c.build_create_library(
                str_arg(args, "server_name"),
                str_arg(args, "library"),
                &definition,
                repository(),
            )
        }
        Operation::DeleteLibrary => c.build_delete_library(
            str_arg(args, "server_name"),
            str_arg(args, "library"),
            repository(),
        ),
        Operation::GetDatasetList => {
            c.build_get_dataset_list(str_arg(args, "library"), &target_arg(args))
        }
        Operation::GetDatasetInfo => c.build_get_dataset_info(
            str_arg(args, "library"),
            str_arg(args, "dataset"),
            &target_arg(args),
        ),
        Operation::RetrieveData => {
            let window: DataWindow = from_arg(args, "window");
            c.build_retrieve_data(
                str_arg(args, "library"),
                str_arg(args, "dataset"),
                &target_arg(args),
                &window,
            )
        }
        Operation::InsertData => {
            let records: Vec<Record> = from_arg(args, "records");
            c.build_insert_data(
                str_arg(args, "library"),
                str_arg(args, "dataset"),
                &records,
                &target_arg(args),
                args["by_key"].as_str(),
            )
            .unwrap()
        }
        Operation::ReplaceAllData => {
            let records: Vec<Record> = from_arg(args, "records");
            c.build_replace_all_data(
                str_arg(args, "library"),
                str_arg(args, "dataset"),
                &records,
                &target_arg(args),
            )
            .unwrap()
        }
        Operation::DeleteDataset => c.build_delete_dataset(
            str_arg(args, "library"),
            str_arg(args, "dataset"),
            &target_arg(args),
        ),
        Operation::FindObject => {
            let criteria: SearchCriteria = from_arg(args, "criteria");
            c.build_find_object(&criteria)
        }
        Operation::MoveObject => {
            let object: ObjectRef = from_arg(args, "object");
            c.build_move_object(&object, str_arg(args, "destination_location"), repository())
        }
        Operation::DeleteObject => {
            let object: ObjectRef = from_arg(args, "object");
            c.build_delete_object(&object, repository())
        }
    }
}

// ---------------------------------------------------------------------------
// Endpoint catalog
// ---------------------------------------------------------------------------

#[test]
fn endpoint_test_vectors() {
    let raw = include_str!("../../test-vectors/endpoints.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let base_url = vectors["base_url"].as_str().unwrap();
    let c = client(base_url);

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let operation = Operation::from_name(case["operation"].as_str().unwrap())
            .unwrap_or_else(|| panic!("{name}: unknown operation"));
        let expected = &case["expected_request"];
        assert_eq!(
            case["args"].get("target").is_some(),
            operation.is_target_scoped(),
            "{name}: only target-scoped operations take a target"
        );

        let req = build(&c, operation, &case["args"]);
        assert_eq!(
            req.method,
            parse_method(expected["method"].as_str().unwrap()),
            "{name}: method"
        );
        assert_eq!(req.method, operation.method(), "{name}: catalog method");
        let endpoint = expected["endpoint"].as_str().unwrap();
        assert_eq!(req.endpoint, endpoint, "{name}: endpoint");
        assert_eq!(req.url, format!("http://sas.local:8080/{endpoint}"), "{name}: url");

        let expected_query: Vec<(String, String)> =
            serde_json::from_value(expected["query"].clone()).unwrap();
        assert_eq!(req.query, expected_query, "{name}: query");

        if let Some(body) = expected["body"].as_str() {
            assert_eq!(req.body.as_deref(), Some(body), "{name}: text body");
        } else if !expected["json_body"].is_null() {
            let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(body, expected["json_body"], "{name}: json body");
            assert_eq!(req.header("content-type"), Some("application/json"), "{name}: content type");
        } else {
            assert_eq!(req.body, None, "{name}: no body");
        }
    }
}

#[test]
fn endpoint_vectors_cover_every_operation() {
    let raw = include_str!("../../test-vectors/endpoints.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let covered: BTreeSet<&str> = vectors["cases"]
        .as_array()
        .unwrap()
        .iter()
        .map(|case| case["operation"].as_str().unwrap())
        .collect();
    for operation in Operation::ALL {
        assert!(covered.contains(operation.name()), "no vector for {}", operation.name());
    }
}

// ---------------------------------------------------------------------------
// Response classification
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client("http://sas.local:8080");
    let req = c.build_get_library_list(&Target::address("sas.local", 8591));
    assert_eq!(req.full_url(), vectors["request"]["url"].as_str().unwrap());

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let mode = match case["mode"].as_str().unwrap() {
            "envelope" => ResponseMode::Envelope,
            "payload_only" => ResponseMode::PayloadOnly,
            other => panic!("{name}: unknown mode {other}"),
        };
        let sim = &case["simulated_response"];
        let response = HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: sim["body"].as_str().unwrap().to_string(),
        };
        let expected = &case["expected"];
        let result = parse_response(&req, response, mode);

        if let Some(ok) = expected.get("ok") {
            assert_eq!(&result.unwrap(), ok, "{name}: result");
        } else if let Some(http) = expected.get("http") {
            match result {
                Err(ApiError::Http {
                    status,
                    endpoint,
                    message,
                    ..
                }) => {
                    assert_eq!(u64::from(status), http["status"].as_u64().unwrap(), "{name}: status");
                    assert_eq!(endpoint, "sas/libraries", "{name}: endpoint");
                    assert_eq!(message, http["message"].as_str().unwrap(), "{name}: message");
                }
                other => panic!("{name}: expected Http failure, got {other:?}"),
            }
        } else {
            assert!(
                matches!(result, Err(ApiError::MalformedResponse { .. })),
                "{name}: expected MalformedResponse, got {result:?}"
            );
        }
    }
}
