use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "minidump")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub project: Uuid,
    pub build_metadata: Option<Uuid>,
    pub filename: String,
    pub client_guid: Option<String>,
    pub upload_ip: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub stacktrace: Option<Json>,
    pub symbolicated: bool,
    pub decode_task_complete: bool,
    /// Bumped on every attempt write-back, successful or failed. Decode
    /// jobs record the value at claim time and discard their write if it
    /// moved; the queue stops claiming rows past the attempt budget.
    pub decode_attempts: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::Project",
        to = "super::project::Column::Id"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::build_metadata::Entity",
        from = "Column::BuildMetadata",
        to = "super::build_metadata::Column::Id"
    )]
    BuildMetadata,
}

impl ActiveModelBehavior for ActiveModel {}
