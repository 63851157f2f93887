//! Error taxonomy for the control service and agent.
//!
//! Each variant maps to one of the categories in the design: validation and
//! conflict errors become HTTP 4xx responses, persistence errors are fatal at
//! startup and surfaced to the caller at runtime, transport errors drive the
//! agent's disconnect signal, and deployer errors are absorbed by the
//! convergence loop rather than propagated.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("The provided JSON doesn't match the required schema.")]
    SchemaMismatch { errors: Vec<String> },
}

#[derive(Error, Debug)]
pub enum ConflictError {
    #[error("The provided dataset_id is already in use.")]
    DatasetIdInUse,
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("failed to write configuration to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("configuration file is corrupt: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unsupported on-disk configuration version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection to {peer} failed: {source}")]
    Connect {
        peer: String,
        #[source]
        source: std::io::Error,
    },
    #[error("frame I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed frame: {0}")]
    Codec(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write config file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("config file {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum DeployerError {
    #[error("local state discovery failed: {0}")]
    Discovery(String),
    #[error("applying state change failed: {0}")]
    Apply(String),
}

/// The error type surfaced by the HTTP API, covering every domain error that
/// a v1 endpoint can produce.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl ApiError {
    /// The `{description, errors?}` body mandated by the HTTP API design.
    pub fn body(&self) -> serde_json::Value {
        match self {
            ApiError::Validation(ValidationError::SchemaMismatch { errors }) => serde_json::json!({
                "description": self.to_string(),
                "errors": errors,
            }),
            ApiError::Conflict(_) => serde_json::json!({ "description": self.to_string() }),
            ApiError::Persistence(_) => serde_json::json!({ "description": self.to_string() }),
        }
    }

    pub fn status(&self) -> rocket::http::Status {
        match self {
            ApiError::Validation(_) => rocket::http::Status::BadRequest,
            ApiError::Conflict(_) => rocket::http::Status::Conflict,
            ApiError::Persistence(_) => rocket::http::Status::InternalServerError,
        }
    }
}

impl<'r> rocket::response::Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r rocket::Request<'_>) -> rocket::response::Result<'static> {
        log::warn!(target: "api", "request failed: {}", self);
        rocket::serde::json::Json(self.body())
            .respond_to(request)
            .map(|mut response| {
                response.set_status(self.status());
                response
            })
    }
}
