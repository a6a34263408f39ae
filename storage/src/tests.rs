/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

#[cfg(test)]
mod tests {
    use crate::backend::StorageBackend;
    use crate::disk::DiskBackend;
    use crate::facade::{merge_config, reconcile, StorageService};
    use crate::registry::BackendRegistry;
    use crate::{disk, s3, StorageError};
    use async_trait::async_trait;
    use bytes::Bytes;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory backend for facade tests; optionally rejects writes.
    struct MemoryBackend {
        files: Mutex<HashMap<String, Bytes>>,
        writable: bool,
    }

    impl MemoryBackend {
        fn new(writable: bool) -> Box<Self> {
            Box::new(Self {
                files: Mutex::new(HashMap::new()),
                writable,
            })
        }
    }

    #[async_trait]
    impl StorageBackend for MemoryBackend {
        async fn init(&self) -> Result<(), StorageError> {
            Ok(())
        }

        async fn create(&self, path: &str, data: Bytes) -> Result<(), StorageError> {
            if !self.writable {
                return Err(StorageError::Config("read-only".to_string()));
            }
            self.files.lock().unwrap().insert(path.to_string(), data);
            Ok(())
        }

        async fn read(&self, path: &str) -> Result<Option<Bytes>, StorageError> {
            Ok(self.files.lock().unwrap().get(path).cloned())
        }

        async fn delete(&self, path: &str) -> Result<bool, StorageError> {
            Ok(self.files.lock().unwrap().remove(path).is_some())
        }

        async fn validate_credentials(&self) -> bool {
            true
        }
    }

    fn two_backend_service() -> StorageService {
        let backends: Vec<(String, Box<dyn StorageBackend>)> = vec![
            ("alpha".to_string(), MemoryBackend::new(true)),
            ("beta".to_string(), MemoryBackend::new(true)),
        ];
        StorageService::from_parts(backends, Some("beta".to_string()))
    }

    #[tokio::test]
    async fn test_create_prefers_primary_and_stops() {
        let service = two_backend_service();
        let outcome = service
            .create("minidump/p/a.dmp", Bytes::from_static(b"MDMP"), None)
            .await
            .unwrap();

        assert!(outcome.is_durable());
        assert_eq!(outcome.succeeded, vec!["beta".to_string()]);
        assert!(outcome.failed.is_empty());

        // Only the primary holds the bytes, yet an unnamed read finds them.
        assert!(service.read("minidump/p/a.dmp", Some("alpha")).await.is_err());
        let data = service.read("minidump/p/a.dmp", None).await.unwrap();
        assert_eq!(data, Bytes::from_static(b"MDMP"));
    }

    #[tokio::test]
    async fn test_create_falls_back_when_primary_fails() {
        let backends: Vec<(String, Box<dyn StorageBackend>)> = vec![
            ("alpha".to_string(), MemoryBackend::new(true)),
            ("broken".to_string(), MemoryBackend::new(false)),
        ];
        let service = StorageService::from_parts(backends, Some("broken".to_string()));

        let outcome = service
            .create("symbol/p/m/b/m.sym", Bytes::from_static(b"MODULE"), None)
            .await
            .unwrap();

        assert_eq!(outcome.failed, vec!["broken".to_string()]);
        assert_eq!(outcome.succeeded, vec!["alpha".to_string()]);
        assert!(outcome.is_durable());
    }

    #[tokio::test]
    async fn test_total_write_failure_is_reported_not_raised() {
        let backends: Vec<(String, Box<dyn StorageBackend>)> =
            vec![("broken".to_string(), MemoryBackend::new(false))];
        let service = StorageService::from_parts(backends, Some("broken".to_string()));

        let outcome = service
            .create("x", Bytes::from_static(b"y"), None)
            .await
            .unwrap();
        assert!(!outcome.is_durable());
    }

    #[tokio::test]
    async fn test_read_miss_is_typed_not_found() {
        let service = two_backend_service();
        let err = service.read("missing", None).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_broadcasts() {
        let service = two_backend_service();
        service
            .create("f", Bytes::from_static(b"1"), Some("alpha"))
            .await
            .unwrap();
        service
            .create("f", Bytes::from_static(b"1"), Some("beta"))
            .await
            .unwrap();

        assert!(service.delete("f").await.unwrap());
        assert!(!service.delete("f").await.unwrap());
        assert!(service.read("f", None).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_disk_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = DiskBackend::new(dir.path());
        backend.init().await.unwrap();

        backend
            .create("symbol/p/app.so/ABC/app.sym", Bytes::from_static(b"MODULE linux"))
            .await
            .unwrap();
        let data = backend.read("symbol/p/app.so/ABC/app.sym").await.unwrap();
        assert_eq!(data, Some(Bytes::from_static(b"MODULE linux")));

        assert!(backend.delete("symbol/p/app.so/ABC/app.sym").await.unwrap());
        assert!(!backend.delete("symbol/p/app.so/ABC/app.sym").await.unwrap());
        assert_eq!(backend.read("symbol/p/app.so/ABC/app.sym").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_disk_backend_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let backend = DiskBackend::new(dir.path());
        assert!(backend.read("../outside").await.is_err());
    }

    #[test]
    fn test_registry_register_is_not_an_overwrite() {
        let mut registry = BackendRegistry::with_defaults();
        let before: Vec<_> = registry.keys().collect();
        registry.register(disk::META, DiskBackend::from_config);
        let after: Vec<_> = registry.keys().collect();
        assert_eq!(before, after);
        assert_eq!(after, vec!["filesystem", "s3", "s3generic"]);
    }

    fn config_row(
        key: &str,
        enabled: bool,
        is_primary: bool,
        config: serde_json::Value,
    ) -> entity::storage::Model {
        entity::storage::Model {
            key: key.to_string(),
            enabled,
            is_primary,
            config,
        }
    }

    fn default_rows() -> (
        entity::storage::Model,
        entity::storage::Model,
        entity::storage::Model,
    ) {
        (
            config_row("filesystem", true, true, disk::META.default_config()),
            config_row("s3", false, false, s3::S3_META.default_config()),
            config_row("s3generic", false, false, s3::S3_GENERIC_META.default_config()),
        )
    }

    #[tokio::test]
    async fn test_reconcile_inserts_default_row_for_new_backend() {
        let (fs, s3_row, s3g) = default_rows();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![s3_row.clone(), s3g.clone()],
                vec![fs.clone()],
                vec![fs, s3_row, s3g],
            ])
            .into_connection();

        reconcile(&db, &BackendRegistry::with_defaults())
            .await
            .unwrap();

        // Debug-escaping turns `"` into `\"`; undo it so the raw SQL is matchable.
        let log = format!("{:?}", db.into_transaction_log()).replace("\\\"", "\"");
        assert!(log.contains(r#"INSERT INTO "storage""#));
        assert!(log.contains("filesystem"));
    }

    #[tokio::test]
    async fn test_reconcile_drops_row_for_unregistered_backend() {
        let (fs, s3_row, s3g) = default_rows();
        let legacy = config_row("legacy", true, false, json!({}));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![legacy, fs.clone(), s3_row.clone(), s3g.clone()],
                vec![fs, s3_row, s3g],
            ])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        reconcile(&db, &BackendRegistry::with_defaults())
            .await
            .unwrap();

        // Debug-escaping turns `"` into `\"`; undo it so the raw SQL is matchable.
        let log = format!("{:?}", db.into_transaction_log()).replace("\\\"", "\"");
        assert!(log.contains(r#"DELETE FROM "storage""#));
        assert!(log.contains("legacy"));
    }

    #[tokio::test]
    async fn test_reconcile_merges_new_defaults_without_clobbering() {
        let (_, s3_row, s3g) = default_rows();
        let fs_custom = config_row("filesystem", true, true, json!({"custom": "x"}));
        let fs_merged = config_row(
            "filesystem",
            true,
            true,
            json!({"path": "/storage", "custom": "x"}),
        );
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![fs_custom, s3_row.clone(), s3g.clone()],
                vec![fs_merged.clone()],
                vec![fs_merged, s3_row, s3g],
            ])
            .into_connection();

        reconcile(&db, &BackendRegistry::with_defaults())
            .await
            .unwrap();

        // Operator key survives and the missing default key is filled in.
        // Debug-escaping turns `"` into `\"`; undo it so the raw SQL is matchable.
        let log = format!("{:?}", db.into_transaction_log()).replace("\\\"", "\"");
        assert!(log.contains(r#"UPDATE "storage""#));
        assert!(log.contains("custom"));
        assert!(log.contains("/storage"));
    }

    #[tokio::test]
    async fn test_reconcile_promotes_enabled_backend_when_no_primary() {
        let (mut fs, s3_row, s3g) = default_rows();
        fs.is_primary = false;
        let mut fs_promoted = fs.clone();
        fs_promoted.is_primary = true;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![fs.clone(), s3_row.clone(), s3g.clone()],
                vec![fs, s3_row, s3g],
                vec![fs_promoted],
            ])
            .into_connection();

        reconcile(&db, &BackendRegistry::with_defaults())
            .await
            .unwrap();

        // Debug-escaping turns `"` into `\"`; undo it so the raw SQL is matchable.
        let log = format!("{:?}", db.into_transaction_log()).replace("\\\"", "\"");
        assert!(log.contains(r#"UPDATE "storage""#));
        assert!(log.contains("is_primary"));
    }

    #[tokio::test]
    async fn test_reconcile_demotes_disabled_primary() {
        let (fs, mut s3_row, s3g) = default_rows();
        s3_row.is_primary = true;
        let mut s3_demoted = s3_row.clone();
        s3_demoted.is_primary = false;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![fs.clone(), s3_row.clone(), s3g.clone()],
                vec![fs, s3_row, s3g],
                vec![s3_demoted],
            ])
            .into_connection();

        reconcile(&db, &BackendRegistry::with_defaults())
            .await
            .unwrap();

        // Debug-escaping turns `"` into `\"`; undo it so the raw SQL is matchable.
        let log = format!("{:?}", db.into_transaction_log()).replace("\\\"", "\"");
        assert!(log.contains(r#"UPDATE "storage""#));
        assert!(log.contains("is_primary"));
    }

    #[test]
    fn test_merge_config_keeps_operator_values() {
        let default = json!({"path": "/storage", "new_key": "default"});
        let existing = json!({"path": "/mnt/crash"});
        let merged = merge_config(&default, &existing);
        assert_eq!(merged["path"], "/mnt/crash");
        assert_eq!(merged["new_key"], "default");
    }

    #[test]
    fn test_default_config_from_meta() {
        assert_eq!(disk::META.default_config(), json!({"path": "/storage"}));
    }
}
