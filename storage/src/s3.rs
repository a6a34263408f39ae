/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde_json::Value;

use super::backend::{BackendMeta, ConfigField, StorageBackend, config_str};
use super::StorageError;

pub const S3_META: BackendMeta = BackendMeta {
    key: "s3",
    ui_name: "Amazon S3",
    default_enabled: false,
    default_primary: false,
    fields: &[
        ConfigField {
            key: "aws_access_key_id",
            title: "Access Key ID",
            default: "",
            description: "AWS access key id",
        },
        ConfigField {
            key: "aws_secret_access_key",
            title: "Secret Access Key",
            default: "",
            description: "AWS secret access key",
        },
        ConfigField {
            key: "bucket_name",
            title: "Bucket Name",
            default: "",
            description: "Bucket that stored files are written under",
        },
        ConfigField {
            key: "region_name",
            title: "Region",
            default: "us-east-1",
            description: "AWS region of the bucket",
        },
    ],
};

pub const S3_GENERIC_META: BackendMeta = BackendMeta {
    key: "s3generic",
    ui_name: "S3 Compatible",
    default_enabled: false,
    default_primary: false,
    fields: &[
        ConfigField {
            key: "aws_access_key_id",
            title: "Access Key ID",
            default: "",
            description: "Access key id",
        },
        ConfigField {
            key: "aws_secret_access_key",
            title: "Secret Access Key",
            default: "",
            description: "Secret access key",
        },
        ConfigField {
            key: "endpoint_url",
            title: "Endpoint URL",
            default: "",
            description: "S3-compatible API endpoint",
        },
        ConfigField {
            key: "bucket_name",
            title: "Bucket Name",
            default: "",
            description: "Bucket that stored files are written under",
        },
        ConfigField {
            key: "region_name",
            title: "Region",
            default: "us-east-1",
            description: "Region of the bucket",
        },
    ],
};

/// S3-API backend. Covers both the AWS-hosted default and generic
/// S3-compatible targets with an explicit endpoint.
pub struct S3Backend {
    store: AmazonS3,
}

impl S3Backend {
    pub fn from_config(config: &Value) -> Result<Box<dyn StorageBackend>, StorageError> {
        Self::build(config, None)
    }

    pub fn from_generic_config(config: &Value) -> Result<Box<dyn StorageBackend>, StorageError> {
        let endpoint = config_str(config, "endpoint_url")?.to_string();
        Self::build(config, Some(endpoint))
    }

    fn build(
        config: &Value,
        endpoint: Option<String>,
    ) -> Result<Box<dyn StorageBackend>, StorageError> {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(config_str(config, "bucket_name")?)
            .with_region(config_str(config, "region_name")?)
            .with_access_key_id(config_str(config, "aws_access_key_id")?)
            .with_secret_access_key(config_str(config, "aws_secret_access_key")?);

        if let Some(endpoint) = endpoint {
            builder = builder.with_endpoint(&endpoint).with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;
        Ok(Box::new(Self { store }))
    }

    async fn probe(&self) -> Result<(), StorageError> {
        // A head on an arbitrary key answers "is the bucket reachable with
        // these credentials"; NotFound means yes.
        match self.store.head(&ObjectPath::from(".crashpoint-probe")).await {
            Ok(_) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    async fn init(&self) -> Result<(), StorageError> {
        self.probe().await
    }

    async fn create(&self, path: &str, data: Bytes) -> Result<(), StorageError> {
        self.store.put(&ObjectPath::from(path), data.into()).await?;
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Option<Bytes>, StorageError> {
        match self.store.get(&ObjectPath::from(path)).await {
            Ok(result) => Ok(Some(result.bytes().await?)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        match self.store.delete(&ObjectPath::from(path)).await {
            Ok(()) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn validate_credentials(&self) -> bool {
        self.probe().await.is_ok()
    }
}
