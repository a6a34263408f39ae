/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value};

use super::StorageError;

/// One operator-configurable field of a backend, surfaced to the admin UI.
#[derive(Debug, Clone, Copy)]
pub struct ConfigField {
    pub key: &'static str,
    pub title: &'static str,
    pub default: &'static str,
    pub description: &'static str,
}

/// Static metadata a backend kind exposes to the registry.
#[derive(Debug, Clone, Copy)]
pub struct BackendMeta {
    pub key: &'static str,
    pub ui_name: &'static str,
    pub default_enabled: bool,
    pub default_primary: bool,
    pub fields: &'static [ConfigField],
}

impl BackendMeta {
    pub fn default_config(&self) -> Value {
        let mut map = Map::new();
        for field in self.fields {
            map.insert(
                field.key.to_string(),
                Value::String(field.default.to_string()),
            );
        }
        Value::Object(map)
    }
}

/// Uniform create/read/delete over one physical medium. Paths are logical
/// and backend-relative; absence on read is a normal outcome.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Idempotent setup, e.g. create the root directory or verify the
    /// bucket is reachable. May fail loudly at startup.
    async fn init(&self) -> Result<(), StorageError>;

    async fn create(&self, path: &str, data: Bytes) -> Result<(), StorageError>;

    async fn read(&self, path: &str) -> Result<Option<Bytes>, StorageError>;

    /// Set-to-absent, not a presence assertion. Returns whether the path
    /// existed before the call.
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;

    /// Lightweight, non-mutating reachability probe.
    async fn validate_credentials(&self) -> bool;
}

pub fn config_str<'a>(config: &'a Value, key: &str) -> Result<&'a str, StorageError> {
    config
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| StorageError::Config(format!("missing `{}`", key)))
}
