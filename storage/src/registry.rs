/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use super::backend::{BackendMeta, StorageBackend};
use super::{disk, s3, StorageError};

pub type BackendFactory = fn(&Value) -> Result<Box<dyn StorageBackend>, StorageError>;

pub struct RegistryEntry {
    pub meta: BackendMeta,
    pub factory: BackendFactory,
}

/// Write-once-at-startup catalog of backend kinds. Which of them are
/// enabled lives in the storage config rows, not here.
#[derive(Default)]
pub struct BackendRegistry {
    entries: BTreeMap<&'static str, RegistryEntry>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in backend kinds.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(disk::META, disk::DiskBackend::from_config);
        registry.register(s3::S3_META, s3::S3Backend::from_config);
        registry.register(s3::S3_GENERIC_META, s3::S3Backend::from_generic_config);
        registry
    }

    /// Registering an already-known key is a no-op, never an overwrite.
    pub fn register(&mut self, meta: BackendMeta, factory: BackendFactory) {
        if self.entries.contains_key(meta.key) {
            warn!(backend = meta.key, "storage backend already registered");
            return;
        }
        self.entries.insert(meta.key, RegistryEntry { meta, factory });
    }

    pub fn get(&self, key: &str) -> Option<&RegistryEntry> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn construct(
        &self,
        key: &str,
        config: &Value,
    ) -> Result<Box<dyn StorageBackend>, StorageError> {
        let entry = self
            .get(key)
            .ok_or_else(|| StorageError::UnknownBackend(key.to_string()))?;
        (entry.factory)(config)
    }
}
