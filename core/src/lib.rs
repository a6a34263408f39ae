/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub mod breakpad;
pub mod consts;
pub mod database;
pub mod input;
pub mod processor;
pub mod state;
pub mod tests;
pub mod types;

use anyhow::{Context, Result};
use clap::Parser;
use database::connect_db;
use std::sync::Arc;
use storage::{BackendRegistry, StorageService};
use tracing::info;
use types::*;

pub async fn init_state() -> Result<Arc<ServerState>> {
    let cli = Cli::parse();

    info!("Starting Crashpoint Server on {}:{}", cli.ip, cli.port);

    let db = connect_db(&cli).await?;

    let registry = BackendRegistry::with_defaults();
    let storage = StorageService::from_database(&db, &registry)
        .await
        .context("Failed to initialize storage backends")?;

    let state = Arc::new(ServerState { db, cli, storage });

    if let Some(file) = state.cli.state_file.clone() {
        state::apply_state_file(Arc::clone(&state), &file)
            .await
            .context("Failed to apply state file")?;
    }

    Ok(state)
}
