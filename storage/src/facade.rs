/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use bytes::Bytes;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel};
use serde_json::Value;
use tracing::{error, info, warn};

use super::backend::StorageBackend;
use super::registry::BackendRegistry;
use super::StorageError;

/// Per-backend result of a facade write. The request is durable as long
/// as at least one backend took the bytes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl WriteOutcome {
    pub fn is_durable(&self) -> bool {
        !self.succeeded.is_empty()
    }
}

/// Composes the enabled backend instances in deterministic key order and
/// routes create/read/delete with primary-first semantics.
pub struct StorageService {
    backends: Vec<(String, Box<dyn StorageBackend>)>,
    primary: Option<String>,
}

/// Overlay operator-set values onto a backend's current defaults. New
/// default keys appear; values the operator already set win.
pub fn merge_config(default: &Value, existing: &Value) -> Value {
    let mut merged = default.clone();
    if let (Some(target), Some(source)) = (merged.as_object_mut(), existing.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Align the storage config rows with the registry: insert defaults for
/// new backend kinds, drop rows for removed ones, merge newly-introduced
/// config keys into surviving rows and keep the primary flag consistent.
pub async fn reconcile(
    db: &DatabaseConnection,
    registry: &BackendRegistry,
) -> Result<(), StorageError> {
    let rows = entity::storage::Entity::find().all(db).await?;

    for row in &rows {
        if registry.get(&row.key).is_none() {
            info!(backend = %row.key, "removing config row for unregistered backend");
            entity::storage::Entity::delete_by_id(row.key.clone())
                .exec(db)
                .await?;
        }
    }

    for key in registry.keys() {
        let Some(entry) = registry.get(key) else {
            continue;
        };
        let meta = entry.meta;
        match rows.iter().find(|r| r.key == key) {
            None => {
                info!(backend = key, "inserting default config row");
                entity::storage::ActiveModel {
                    key: Set(key.to_string()),
                    enabled: Set(meta.default_enabled),
                    is_primary: Set(meta.default_primary),
                    config: Set(meta.default_config()),
                }
                .insert(db)
                .await?;
            }
            Some(row) => {
                let merged = merge_config(&meta.default_config(), &row.config);
                if merged != row.config {
                    let mut active = row.clone().into_active_model();
                    active.config = Set(merged);
                    active.update(db).await?;
                }
            }
        }
    }

    // Exactly one enabled row may be primary.
    let mut rows = entity::storage::Entity::find().all(db).await?;
    rows.sort_by(|a, b| a.key.cmp(&b.key));
    let mut primary_seen = false;
    let mut first_enabled: Option<entity::storage::Model> = None;

    for row in rows {
        if !row.enabled {
            if row.is_primary {
                let mut active = row.into_active_model();
                active.is_primary = Set(false);
                active.update(db).await?;
            }
            continue;
        }

        if first_enabled.is_none() {
            first_enabled = Some(row.clone());
        }

        if row.is_primary {
            if primary_seen {
                let mut active = row.into_active_model();
                active.is_primary = Set(false);
                active.update(db).await?;
            } else {
                primary_seen = true;
            }
        }
    }

    if !primary_seen {
        if let Some(row) = first_enabled {
            warn!(backend = %row.key, "no primary backend configured, promoting");
            let mut active = row.into_active_model();
            active.is_primary = Set(true);
            active.update(db).await?;
        }
    }

    Ok(())
}

impl StorageService {
    /// Assemble from explicit parts. Used by tests and by callers that
    /// manage their own config source.
    pub fn from_parts(
        mut backends: Vec<(String, Box<dyn StorageBackend>)>,
        primary: Option<String>,
    ) -> Self {
        backends.sort_by(|a, b| a.0.cmp(&b.0));
        Self { backends, primary }
    }

    /// Reconcile the config rows, then instantiate and `init()` every
    /// enabled backend. Backend init failure is fatal to startup.
    pub async fn from_database(
        db: &DatabaseConnection,
        registry: &BackendRegistry,
    ) -> Result<Self, StorageError> {
        reconcile(db, registry).await?;

        let mut rows = entity::storage::Entity::find().all(db).await?;
        rows.sort_by(|a, b| a.key.cmp(&b.key));

        let mut backends = Vec::new();
        let mut primary = None;

        for row in rows.into_iter().filter(|r| r.enabled) {
            let backend = registry.construct(&row.key, &row.config)?;
            if !backend.validate_credentials().await {
                warn!(backend = %row.key, "storage backend failed credential probe");
            }
            backend.init().await?;
            info!(backend = %row.key, primary = row.is_primary, "storage backend initialized");
            if row.is_primary {
                primary = Some(row.key.clone());
            }
            backends.push((row.key, backend));
        }

        Ok(Self::from_parts(backends, primary))
    }

    pub fn backend_keys(&self) -> Vec<&str> {
        self.backends.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    fn named(&self, key: &str) -> Result<&dyn StorageBackend, StorageError> {
        self.backends
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, b)| b.as_ref())
            .ok_or_else(|| StorageError::UnknownBackend(key.to_string()))
    }

    /// Enabled backends with the primary moved to the front.
    fn ordered(&self) -> Vec<&(String, Box<dyn StorageBackend>)> {
        let mut ordered: Vec<_> = self.backends.iter().collect();
        if let Some(primary) = &self.primary {
            ordered.sort_by_key(|(k, _)| (k != primary, k.clone()));
        }
        ordered
    }

    /// Write `data` under `path`. With a named backend, only there.
    /// Otherwise primary first, falling back to every other enabled
    /// backend on primary failure. Never raises on write failure; the
    /// outcome lists which backends took the bytes.
    pub async fn create(
        &self,
        path: &str,
        data: Bytes,
        backend: Option<&str>,
    ) -> Result<WriteOutcome, StorageError> {
        let mut outcome = WriteOutcome::default();

        if let Some(key) = backend {
            match self.named(key)?.create(path, data).await {
                Ok(()) => outcome.succeeded.push(key.to_string()),
                Err(e) => {
                    error!(backend = key, path, error = %e, "storage write failed");
                    outcome.failed.push(key.to_string());
                }
            }
            return Ok(outcome);
        }

        for (key, backend) in self.ordered() {
            match backend.create(path, data.clone()).await {
                Ok(()) => {
                    outcome.succeeded.push(key.clone());
                    if Some(key.as_str()) == self.primary.as_deref() {
                        return Ok(outcome);
                    }
                }
                Err(e) => {
                    error!(backend = %key, path, error = %e, "storage write failed");
                    outcome.failed.push(key.clone());
                }
            }
        }

        if !outcome.is_durable() {
            error!(path, "no storage backend accepted the write");
        } else if !outcome.failed.is_empty() {
            warn!(
                path,
                succeeded = ?outcome.succeeded,
                failed = ?outcome.failed,
                "write landed on fallback backends only"
            );
        }

        Ok(outcome)
    }

    /// Read `path`, scanning enabled backends primary-first when no
    /// backend is named. Absence everywhere is a typed NotFound.
    pub async fn read(&self, path: &str, backend: Option<&str>) -> Result<Bytes, StorageError> {
        if let Some(key) = backend {
            return self
                .named(key)?
                .read(path)
                .await?
                .ok_or_else(|| StorageError::NotFound(path.to_string()));
        }

        for (key, backend) in self.ordered() {
            match backend.read(path).await {
                Ok(Some(data)) => return Ok(data),
                Ok(None) => continue,
                Err(e) => {
                    warn!(backend = %key, path, error = %e, "storage read failed, trying next");
                }
            }
        }

        Err(StorageError::NotFound(path.to_string()))
    }

    /// Broadcast delete. Absence on a given backend is not an error.
    pub async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        let mut removed = false;
        for (key, backend) in &self.backends {
            match backend.delete(path).await {
                Ok(hit) => removed |= hit,
                Err(e) => {
                    error!(backend = %key, path, error = %e, "storage delete failed");
                }
            }
        }
        Ok(removed)
    }
}
