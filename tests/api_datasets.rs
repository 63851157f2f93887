//! End-to-end HTTP scenarios for `/configuration/datasets`, exercised
//! through Rocket's own local test client since real routing and catchers
//! only run against a built `Rocket` instance.

use std::sync::Arc;

use flocker_control::cluster_state::ClusterStateService;
use flocker_control::persistence::PersistenceService;
use flocker_control::server::build_rocket;
use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;

fn test_client() -> (Client, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("create tempdir");
    let runtime = tokio::runtime::Runtime::new().expect("build runtime");
    let persistence = runtime
        .block_on(PersistenceService::start(dir.path()))
        .expect("start persistence service");
    let cluster_state = ClusterStateService::new();

    let rocket = build_rocket(0, Arc::new(persistence), Arc::new(cluster_state));
    let client = Client::tracked(rocket).expect("valid rocket instance");
    (client, dir)
}

#[test]
fn create_returns_201_with_generated_id() {
    let (client, _dir) = test_client();

    let response = client
        .post("/v1/configuration/datasets")
        .header(ContentType::JSON)
        .body(r#"{"primary":"192.0.2.1"}"#)
        .dispatch();

    assert_eq!(response.status(), Status::Created);
    let body: serde_json::Value = response.into_json().expect("JSON body");
    assert_eq!(body["primary"], "192.0.2.1");
    assert_eq!(body["metadata"], serde_json::json!({}));
    assert!(!body["dataset_id"].as_str().unwrap().is_empty());

    let configured = client.get("/v1/configuration/datasets").dispatch();
    let items: serde_json::Value = configured.into_json().expect("JSON body");
    let items = items.as_array().expect("array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["primary"], "192.0.2.1");
}

#[test]
fn duplicate_dataset_id_conflicts() {
    let (client, _dir) = test_client();

    let created = client
        .post("/v1/configuration/datasets")
        .header(ContentType::JSON)
        .body(r#"{"primary":"node-a","dataset_id":"X"}"#)
        .dispatch();
    assert_eq!(created.status(), Status::Created);

    let different_node = client
        .post("/v1/configuration/datasets")
        .header(ContentType::JSON)
        .body(r#"{"primary":"node-b","dataset_id":"X"}"#)
        .dispatch();
    assert_eq!(different_node.status(), Status::Conflict);

    let same_node = client
        .post("/v1/configuration/datasets")
        .header(ContentType::JSON)
        .body(r#"{"primary":"node-a","dataset_id":"X"}"#)
        .dispatch();
    assert_eq!(same_node.status(), Status::Conflict);

    let different_case = client
        .post("/v1/configuration/datasets")
        .header(ContentType::JSON)
        .body(r#"{"primary":"node-a","dataset_id":"x"}"#)
        .dispatch();
    assert_eq!(different_case.status(), Status::Conflict);

    let configured = client.get("/v1/configuration/datasets").dispatch();
    let items: serde_json::Value = configured.into_json().expect("JSON body");
    assert_eq!(items.as_array().unwrap().len(), 1);
}

#[test]
fn unknown_field_is_rejected() {
    let (client, _dir) = test_client();

    let response = client
        .post("/v1/configuration/datasets")
        .header(ContentType::JSON)
        .body(r#"{"primary":"192.0.2.1","junk":"garbage"}"#)
        .dispatch();

    assert_eq!(response.status(), Status::BadRequest);
    let body: serde_json::Value = response.into_json().expect("JSON body");
    assert!(!body["errors"].as_array().expect("errors array").is_empty());
}

#[test]
fn version_reports_the_crate_version() {
    let (client, _dir) = test_client();
    let response = client.get("/v1/version").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().expect("JSON body");
    assert_eq!(body["flocker"], env!("CARGO_PKG_VERSION"));
}
