/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use super::backend::{BackendMeta, ConfigField, StorageBackend, config_str};
use super::StorageError;

pub const META: BackendMeta = BackendMeta {
    key: "filesystem",
    ui_name: "Filesystem",
    default_enabled: true,
    default_primary: true,
    fields: &[ConfigField {
        key: "path",
        title: "Storage Directory",
        default: "/storage",
        description: "Directory that stored files are written under",
    }],
};

/// Local-disk backend. Parent directories are created on demand and a
/// missing file on read or delete is not an error.
pub struct DiskBackend {
    root: PathBuf,
}

impl DiskBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &Value) -> Result<Box<dyn StorageBackend>, StorageError> {
        Ok(Box::new(Self::new(config_str(config, "path")?)))
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::Config(format!(
                "path `{}` escapes the storage root",
                path
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl StorageBackend for DiskBackend {
    async fn init(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StorageError::Io {
                path: self.root.display().to_string(),
                source,
            })
    }

    async fn create(&self, path: &str, data: Bytes) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        let io_err = |source| StorageError::Io {
            path: path.to_string(),
            source,
        };

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        tokio::fs::write(&target, &data).await.map_err(io_err)
    }

    async fn read(&self, path: &str) -> Result<Option<Bytes>, StorageError> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                path: path.to_string(),
                source,
            }),
        }
    }

    async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StorageError::Io {
                path: path.to_string(),
                source,
            }),
        }
    }

    async fn validate_credentials(&self) -> bool {
        tokio::fs::create_dir_all(&self.root).await.is_ok()
    }
}
