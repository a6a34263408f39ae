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
                    .table(SymUploadTracker::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SymUploadTracker::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SymUploadTracker::Project).uuid().not_null())
                    .col(ColumnDef::new(SymUploadTracker::ModuleId).string())
                    .col(ColumnDef::new(SymUploadTracker::BuildId).string())
                    .col(ColumnDef::new(SymUploadTracker::Os).string())
                    .col(ColumnDef::new(SymUploadTracker::Arch).string())
                    .col(ColumnDef::new(SymUploadTracker::FileHash).string())
                    .col(
                        ColumnDef::new(SymUploadTracker::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sym_upload_tracker-project")
                            .from(SymUploadTracker::Table, SymUploadTracker::Project)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SymUploadTracker::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SymUploadTracker {
    Table,
    Id,
    Project,
    ModuleId,
    BuildId,
    Os,
    Arch,
    FileHash,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Project {
    Table,
    Id,
}
