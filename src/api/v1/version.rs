//! `GET /version`.

use rocket::get;
use rocket::serde::json::{json, Json, Value};

#[get("/version")]
pub async fn version() -> Json<Value> {
    Json(json!({ "flocker": env!("CARGO_PKG_VERSION") }))
}
