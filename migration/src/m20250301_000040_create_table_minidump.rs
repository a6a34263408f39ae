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
                    .table(Minidump::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Minidump::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Minidump::Project).uuid().not_null())
                    .col(ColumnDef::new(Minidump::BuildMetadata).uuid())
                    .col(ColumnDef::new(Minidump::Filename).string().not_null())
                    .col(ColumnDef::new(Minidump::ClientGuid).string())
                    .col(ColumnDef::new(Minidump::UploadIp).string())
                    .col(ColumnDef::new(Minidump::Stacktrace).json_binary())
                    .col(ColumnDef::new(Minidump::Symbolicated).boolean().not_null())
                    .col(
                        ColumnDef::new(Minidump::DecodeTaskComplete)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Minidump::DecodeAttempts)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Minidump::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-minidump-project")
                            .from(Minidump::Table, Minidump::Project)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-minidump-build_metadata")
                            .from(Minidump::Table, Minidump::BuildMetadata)
                            .to(BuildMetadata::Table, BuildMetadata::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-minidump-decode_task_complete")
                    .table(Minidump::Table)
                    .col(Minidump::DecodeTaskComplete)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Minidump::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Minidump {
    Table,
    Id,
    Project,
    BuildMetadata,
    Filename,
    ClientGuid,
    UploadIp,
    Stacktrace,
    Symbolicated,
    DecodeTaskComplete,
    DecodeAttempts,
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
