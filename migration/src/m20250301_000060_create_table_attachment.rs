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
                    .table(Attachment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attachment::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Attachment::Project).uuid().not_null())
                    .col(ColumnDef::new(Attachment::Minidump).uuid().not_null())
                    .col(ColumnDef::new(Attachment::Filename).string().not_null())
                    .col(
                        ColumnDef::new(Attachment::OriginalFilename)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Attachment::MimeType).string().not_null())
                    .col(
                        ColumnDef::new(Attachment::FileSizeBytes)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Attachment::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-attachment-project")
                            .from(Attachment::Table, Attachment::Project)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-attachment-minidump")
                            .from(Attachment::Table, Attachment::Minidump)
                            .to(Minidump::Table, Minidump::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Attachment::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Attachment {
    Table,
    Id,
    Project,
    Minidump,
    Filename,
    OriginalFilename,
    MimeType,
    FileSizeBytes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Project {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Minidump {
    Table,
    Id,
}
