/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BuildMetadata::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BuildMetadata::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BuildMetadata::Project).uuid().not_null())
                    .col(ColumnDef::new(BuildMetadata::ModuleId).string().not_null())
                    .col(ColumnDef::new(BuildMetadata::BuildId).string().not_null())
                    .col(
                        ColumnDef::new(BuildMetadata::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-build_metadata-project")
                            .from(BuildMetadata::Table, BuildMetadata::Project)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-build_metadata-project-module-build")
                    .table(BuildMetadata::Table)
                    .col(BuildMetadata::Project)
                    .col(BuildMetadata::ModuleId)
                    .col(BuildMetadata::BuildId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BuildMetadata::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum BuildMetadata {
    Table,
    Id,
    Project,
    ModuleId,
    BuildId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Project {
    Table,
    Id,
}
