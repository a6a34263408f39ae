/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result};
use chrono::Utc;
use migration::Migrator;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectOptions, Database, DatabaseConnection,
    EntityTrait, QueryFilter,
};
use sea_orm_migration::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::log::LevelFilter;
use uuid::Uuid;

use super::types::*;

pub async fn connect_db(cli: &Cli) -> Result<DatabaseConnection> {
    let db_url = if let Some(file) = &cli.database_url_file {
        std::fs::read_to_string(file).context("Failed to read database url from file")?
    } else if let Some(url) = &cli.database_url {
        url.clone()
    } else {
        anyhow::bail!("No database url provided")
    };

    let mut opt = ConnectOptions::new(db_url);

    // Only enable SQL logging at debug level
    if cli.log_level == "debug" {
        opt.sqlx_logging(true)
            .sqlx_logging_level(LevelFilter::Debug);
    } else {
        opt.sqlx_logging(false);
    }

    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8));

    let db = Database::connect(opt)
        .await
        .context("Failed to connect to database")?;
    Migrator::up(&db, None)
        .await
        .context("Failed to run database migrations")?;
    Ok(db)
}

pub async fn get_project_by_minidump_key(
    state: Arc<ServerState>,
    api_key: &str,
) -> Result<Option<MProject>> {
    Ok(EProject::find()
        .filter(CProject::MinidumpApiKey.eq(api_key))
        .one(&state.db)
        .await
        .context("Failed to query project by minidump key")?)
}

pub async fn get_project_by_symbol_key(
    state: Arc<ServerState>,
    api_key: &str,
) -> Result<Option<MProject>> {
    Ok(EProject::find()
        .filter(CProject::SymbolApiKey.eq(api_key))
        .one(&state.db)
        .await
        .context("Failed to query project by symbol key")?)
}

pub async fn get_build_metadata(
    state: Arc<ServerState>,
    project_id: Uuid,
    module_id: &str,
    build_id: &str,
) -> Result<Option<MBuildMetadata>> {
    Ok(EBuildMetadata::find()
        .filter(CBuildMetadata::Project.eq(project_id))
        .filter(CBuildMetadata::ModuleId.eq(module_id))
        .filter(CBuildMetadata::BuildId.eq(build_id))
        .one(&state.db)
        .await
        .context("Failed to query build metadata")?)
}

/// Resolve or lazily create the correlation row for the full
/// (project, module_id, build_id) key.
pub async fn get_or_create_build_metadata(
    state: Arc<ServerState>,
    project_id: Uuid,
    module_id: &str,
    build_id: &str,
) -> Result<MBuildMetadata> {
    if let Some(build) =
        get_build_metadata(Arc::clone(&state), project_id, module_id, build_id).await?
    {
        return Ok(build);
    }

    let abuild = ABuildMetadata {
        id: Set(Uuid::new_v4()),
        project: Set(project_id),
        module_id: Set(module_id.to_string()),
        build_id: Set(build_id.to_string()),
        created_at: Set(Utc::now().naive_utc()),
    };

    Ok(abuild
        .insert(&state.db)
        .await
        .context("Failed to insert build metadata")?)
}

pub async fn get_symbol_for_build(
    state: Arc<ServerState>,
    build_metadata_id: Uuid,
) -> Result<Option<MSymbol>> {
    Ok(ESymbol::find()
        .filter(CSymbol::BuildMetadata.eq(build_metadata_id))
        .one(&state.db)
        .await
        .context("Failed to query symbol")?)
}
