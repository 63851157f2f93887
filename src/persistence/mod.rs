//! Durable storage for the desired `Deployment`.
//!
//! Mirrors the shape of the pack's other JSON-backed persistence: an
//! in-memory cache guarded by an async mutex for serialized `save`s, a
//! versioned on-disk envelope, and change listeners invoked synchronously on
//! every successful save (used to push `ClusterStatusCommand`s to connected
//! agents).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock as SyncRwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::PersistenceError;
use crate::model::Deployment;

const CURRENT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct OnDiskEnvelope {
    version: u32,
    deployment: Deployment,
}

/// A listener invoked, in registration order, after every successful `save`.
pub type ChangeListener = Arc<dyn Fn(Deployment) + Send + Sync>;

/// Owns the authoritative desired `Deployment`.
///
/// `get` reads the in-memory cache and never fails. `save` durably writes
/// through to disk before updating the cache and notifying listeners, and
/// serializes concurrent callers through `write_lock` so saves apply in
/// submission order.
pub struct PersistenceService {
    data_path: PathBuf,
    cache: SyncRwLock<Deployment>,
    write_lock: Mutex<()>,
    listeners: SyncRwLock<Vec<ChangeListener>>,
}

impl PersistenceService {
    /// Loads the service from `data_path/deployment.json`, starting from an
    /// empty `Deployment` if the file is absent or unreadable.
    pub async fn start(data_path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let data_path = data_path.into();
        let config_path = data_path.clone();
        let loaded = tokio::task::spawn_blocking(move || load_from_disk(&config_path))
            .await
            .expect("blocking load task panicked")?;

        let deployment = match loaded {
            Some(deployment) => deployment,
            None => {
                log::info!(target: "persistence", "no existing configuration at {:?}, starting empty", data_path);
                Deployment::empty()
            }
        };

        Ok(Self {
            data_path,
            cache: SyncRwLock::new(deployment),
            write_lock: Mutex::new(()),
            listeners: SyncRwLock::new(Vec::new()),
        })
    }

    pub fn get(&self) -> Deployment {
        self.cache.read().clone()
    }

    pub fn register_listener(&self, listener: ChangeListener) {
        self.listeners.write().push(listener);
    }

    /// Durably replaces the stored `Deployment`, then notifies every
    /// registered listener, in registration order, before returning.
    pub async fn save(&self, deployment: Deployment) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;

        let path = self.data_path.clone();
        let to_write = deployment.clone();
        tokio::task::spawn_blocking(move || write_to_disk(&path, &to_write))
            .await
            .expect("blocking write task panicked")?;

        *self.cache.write() = deployment.clone();
        log::info!(target: "persistence", "saved deployment with {} node(s)", deployment.nodes.len());

        let listeners = self.listeners.read().clone();
        for listener in listeners.iter() {
            listener(deployment.clone());
        }

        Ok(())
    }
}

fn load_from_disk(data_path: &Path) -> Result<Option<Deployment>, PersistenceError> {
    let file_path = deployment_file(data_path);
    let contents = match fs::read_to_string(&file_path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            log::warn!(target: "persistence", "could not read {:?}: {}", file_path, err);
            return Ok(None);
        }
    };

    let envelope: OnDiskEnvelope =
        serde_json::from_str(&contents).map_err(PersistenceError::Decode)?;
    if envelope.version != CURRENT_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: envelope.version,
            expected: CURRENT_VERSION,
        });
    }
    Ok(Some(envelope.deployment))
}

fn write_to_disk(data_path: &Path, deployment: &Deployment) -> Result<(), PersistenceError> {
    fs::create_dir_all(data_path).map_err(|source| PersistenceError::Write {
        path: data_path.display().to_string(),
        source,
    })?;

    let file_path = deployment_file(data_path);
    let tmp_path = file_path.with_extension("json.tmp");

    let envelope = OnDiskEnvelope {
        version: CURRENT_VERSION,
        deployment: deployment.clone(),
    };
    let serialized = serde_json::to_vec_pretty(&envelope)?;

    fs::write(&tmp_path, &serialized).map_err(|source| PersistenceError::Write {
        path: tmp_path.display().to_string(),
        source,
    })?;
    fs::rename(&tmp_path, &file_path).map_err(|source| PersistenceError::Write {
        path: file_path.display().to_string(),
        source,
    })?;
    Ok(())
}

fn deployment_file(data_path: &Path) -> PathBuf {
    data_path.join("deployment.json")
}
