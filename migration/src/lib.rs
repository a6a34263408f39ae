/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub use sea_orm_migration::prelude::*;

mod m20250301_000010_create_table_project;
mod m20250301_000020_create_table_build_metadata;
mod m20250301_000030_create_table_symbol;
mod m20250301_000040_create_table_minidump;
mod m20250301_000050_create_table_annotation;
mod m20250301_000060_create_table_attachment;
mod m20250301_000070_create_table_storage;
mod m20250301_000080_create_table_sym_upload_tracker;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000010_create_table_project::Migration),
            Box::new(m20250301_000020_create_table_build_metadata::Migration),
            Box::new(m20250301_000030_create_table_symbol::Migration),
            Box::new(m20250301_000040_create_table_minidump::Migration),
            Box::new(m20250301_000050_create_table_annotation::Migration),
            Box::new(m20250301_000060_create_table_attachment::Migration),
            Box::new(m20250301_000070_create_table_storage::Migration),
            Box::new(m20250301_000080_create_table_sym_upload_tracker::Migration),
        ]
    }
}
