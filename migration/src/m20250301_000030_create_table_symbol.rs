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
                    .table(Symbol::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Symbol::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Symbol::Project).uuid().not_null())
                    .col(
                        ColumnDef::new(Symbol::BuildMetadata)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Symbol::Os).string().not_null())
                    .col(ColumnDef::new(Symbol::Arch).string().not_null())
                    .col(ColumnDef::new(Symbol::AppVersion).string())
                    .col(ColumnDef::new(Symbol::FileLocation).string().not_null())
                    .col(
                        ColumnDef::new(Symbol::FileSizeBytes)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Symbol::FileHash).string().not_null())
                    .col(ColumnDef::new(Symbol::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-symbol-project")
                            .from(Symbol::Table, Symbol::Project)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-symbol-build_metadata")
                            .from(Symbol::Table, Symbol::BuildMetadata)
                            .to(BuildMetadata::Table, BuildMetadata::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Symbol::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Symbol {
    Table,
    Id,
    Project,
    BuildMetadata,
    Os,
    Arch,
    AppVersion,
    FileLocation,
    FileSizeBytes,
    FileHash,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Project {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum BuildMetadata {
    Table,
    Id,
}
