use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "symbol")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub project: Uuid,
    #[sea_orm(unique)]
    pub build_metadata: Uuid,
    pub os: String,
    pub arch: String,
    pub app_version: Option<String>,
    pub file_location: String,
    pub file_size_bytes: i64,
    pub file_hash: String,
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
