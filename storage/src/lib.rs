/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub mod backend;
pub mod disk;
pub mod facade;
pub mod registry;
pub mod s3;
pub mod tests;

pub use backend::{BackendMeta, ConfigField, StorageBackend};
pub use facade::{StorageService, WriteOutcome};
pub use registry::BackendRegistry;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("i/o error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),
    #[error("invalid backend config: {0}")]
    Config(String),
    #[error("unknown storage backend `{0}`")]
    UnknownBackend(String),
    #[error("`{0}` not found in any enabled backend")]
    NotFound(String),
    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}
