#[cfg(test)]
mod tests {
    use crate::minidump;
    use crate::project::{self, ProjectType};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, EntityTrait, MockDatabase};
    use uuid::Uuid;

    fn sample_project() -> project::Model {
        project::Model {
            id: Uuid::new_v4(),
            name: "browser".to_string(),
            project_type: ProjectType::Simple,
            minidump_api_key: "a".repeat(32),
            symbol_api_key: "b".repeat(32),
            created_at: Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn test_project_query() {
        let project = sample_project();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![project.clone()]])
            .into_connection();

        let found = project::Entity::find_by_id(project.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.name, "browser");
        assert_eq!(found.project_type, ProjectType::Simple);
    }

    #[test]
    fn test_project_serialization() {
        let project = sample_project();
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["name"], "browser");
        let back: project::Model = serde_json::from_value(json).unwrap();
        assert_eq!(back, project);
    }

    #[test]
    fn test_minidump_defaults_roundtrip() {
        let dump = minidump::Model {
            id: Uuid::new_v4(),
            project: Uuid::new_v4(),
            build_metadata: None,
            filename: "minidump-0.dmp".to_string(),
            client_guid: None,
            upload_ip: Some("203.0.113.7".to_string()),
            stacktrace: None,
            symbolicated: false,
            decode_task_complete: false,
            decode_attempts: 0,
            created_at: Utc::now().naive_utc(),
        };

        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(json["symbolicated"], false);
        assert_eq!(json["decode_task_complete"], false);
        let back: minidump::Model = serde_json::from_value(json).unwrap();
        assert_eq!(back, dump);
    }
}
