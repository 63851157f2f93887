//! Top-level, unversioned endpoints mounted at `/`.

use rocket::get;
use rocket::serde::json::{json, Json, Value};

#[get("/health")]
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
