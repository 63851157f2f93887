//! `/configuration/datasets` and `/state/datasets` handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use rocket::response::status::Custom;
use rocket::serde::json::{json, Json, Value};
use rocket::{get, http::Status, post, State};
use uuid::Uuid;

use crate::cluster_state::ClusterStateService;
use crate::error::{ApiError, ConflictError};
use crate::model::{Dataset, Deployment, Manifestation};
use crate::persistence::PersistenceService;

use super::super::schemas;

/// `{primary, dataset_id, metadata, maximum_size?}`, the canonicalized
/// representation used by every dataset-listing endpoint.
fn dataset_response(primary: &str, dataset: &Dataset) -> Value {
    let mut body = json!({
        "primary": primary,
        "dataset_id": dataset.dataset_id,
        "metadata": dataset.metadata,
    });
    if let Some(maximum_size) = dataset.maximum_size {
        body["maximum_size"] = json!(maximum_size);
    }
    body
}

/// Enumerates every primary manifestation in `deployment`, pairing it with
/// the hostname of the node that holds it.
fn primary_dataset_responses(deployment: &Deployment) -> Vec<Value> {
    let mut responses = Vec::new();
    for wrapped_node in &deployment.nodes {
        let node = &wrapped_node.0;
        for manifestation in node.manifestations() {
            if manifestation.0.primary {
                responses.push(dataset_response(&node.hostname, &manifestation.0.dataset));
            }
        }
    }
    responses
}

#[post("/configuration/datasets", format = "json", data = "<body>")]
pub async fn create_dataset(
    persistence: &State<Arc<PersistenceService>>,
    body: Json<Value>,
) -> Result<Custom<Json<Value>>, ApiError> {
    schemas::validate_dataset_request(&body)?;

    let primary = body["primary"].as_str().expect("validated by schema").to_string();
    let dataset_id = body
        .get("dataset_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let maximum_size = body.get("maximum_size").and_then(Value::as_u64);
    let metadata: BTreeMap<String, String> = body
        .get("metadata")
        .and_then(Value::as_object)
        .map(|object| {
            object
                .iter()
                .filter_map(|(key, value)| value.as_str().map(|value| (key.clone(), value.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let deployment = persistence.get();
    if deployment.dataset_id_collides(&dataset_id) {
        log::info!(target: "api", "dataset creation rejected, dataset_id {} already in use", dataset_id);
        return Err(ConflictError::DatasetIdInUse.into());
    }

    let dataset = Dataset::new(dataset_id).with_maximum_size(maximum_size).with_metadata(metadata);
    let manifestation = Manifestation::primary_of(dataset.clone());
    let updated = deployment.with_primary_manifestation(&primary, manifestation);
    persistence.save(updated).await?;

    log::info!(target: "api", "created dataset {} with primary {}", dataset.dataset_id, primary);
    Ok(Custom(Status::Created, Json(dataset_response(&primary, &dataset))))
}

#[get("/configuration/datasets")]
pub async fn list_configured_datasets(persistence: &State<Arc<PersistenceService>>) -> Json<Value> {
    let deployment = persistence.get();
    Json(json!(primary_dataset_responses(&deployment)))
}

#[get("/state/datasets")]
pub async fn list_observed_datasets(cluster_state: &State<Arc<ClusterStateService>>) -> Json<Value> {
    let deployment = cluster_state.as_deployment();
    Json(json!(primary_dataset_responses(&deployment)))
}
