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
                    .table(Annotation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Annotation::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Annotation::Minidump).uuid().not_null())
                    .col(ColumnDef::new(Annotation::Key).string().not_null())
                    .col(ColumnDef::new(Annotation::Value).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-annotation-minidump")
                            .from(Annotation::Table, Annotation::Minidump)
                            .to(Minidump::Table, Minidump::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Annotation::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Annotation {
    Table,
    Id,
    Minidump,
    Key,
    Value,
}

#[derive(DeriveIden)]
enum Minidump {
    Table,
    Id,
}
