/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result};
use cache::{FetchOutcome, SymbolCache};
use crashpoint_core::breakpad::{canonical_sym_path, minidump_store_path, safe_identifier};
use crashpoint_core::database::{get_or_create_build_metadata, get_symbol_for_build};
use crashpoint_core::processor::run_stackwalker;
use crashpoint_core::types::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Whether a finished decode was written back or lost the claim race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Stored,
    Stale,
}

/// Everything a successful decode attempt wants to write back in one
/// conditional update.
#[derive(Debug, Clone)]
pub struct DecodeResult {
    pub build_metadata_id: Uuid,
    pub stacktrace: Value,
    pub symbolicated: bool,
}

/// Scratch directory for one decode job. Removed on drop so aborted
/// attempts do not accumulate under the base path.
struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    async fn create(base_path: &str) -> Result<Self> {
        let path = Path::new(base_path)
            .join("scratch")
            .join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&path)
            .await
            .context("Failed to create decode scratch directory")?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove scratch directory");
        }
    }
}

pub async fn decode_loop(state: Arc<ServerState>) {
    let _guard = if state.cli.report_errors {
        Some(sentry::init(
            "https://8c1f3ad2b4e94f0a9d1c6b7e2f5a8d30@reports.wavelens.io/4",
        ))
    } else {
        None
    };

    let mut current_schedules: Vec<(Uuid, JoinHandle<()>)> = vec![];
    let mut interval = time::interval(Duration::from_secs(5));

    info!("Decode scheduler loop started");

    loop {
        let mut added_schedule = false;
        current_schedules.retain(|(_, schedule)| !schedule.is_finished());

        if current_schedules.len() < state.cli.max_concurrent_decodes {
            let in_flight: Vec<Uuid> = current_schedules.iter().map(|(id, _)| *id).collect();
            let spare = state.cli.max_concurrent_decodes - current_schedules.len();

            match get_next_minidumps(Arc::clone(&state), spare as u64, &in_flight).await {
                Ok(dumps) => {
                    for dump in dumps {
                        debug!(minidump_id = %dump.id, "Claiming minidump from queue");
                        let id = dump.id;
                        let schedule = tokio::spawn(decode_minidump(Arc::clone(&state), dump));
                        current_schedules.push((id, schedule));
                        added_schedule = true;
                    }
                }
                Err(e) => {
                    error!(error = %e, "Failed to query decode queue");
                }
            }
        }

        if !added_schedule {
            interval.tick().await;
        }
    }
}

/// Oldest-first claim of dumps still owing a decode attempt, excluding
/// those a running task already holds. Dumps that burned through their
/// attempt budget stay unprocessed until a symbol upload re-queues them.
pub async fn get_next_minidumps(
    state: Arc<ServerState>,
    limit: u64,
    exclude: &[Uuid],
) -> Result<Vec<MMinidump>> {
    let mut query = EMinidump::find()
        .filter(CMinidump::DecodeTaskComplete.eq(false))
        .filter(CMinidump::DecodeAttempts.lt(state.cli.max_decode_attempts));

    if !exclude.is_empty() {
        query = query.filter(CMinidump::Id.is_not_in(exclude.to_vec()));
    }

    Ok(query
        .order_by_asc(CMinidump::CreatedAt)
        .limit(limit)
        .all(&state.db)
        .await
        .context("Failed to query minidump queue")?)
}

#[instrument(skip(state), fields(minidump_id = %dump.id))]
pub async fn decode_minidump(state: Arc<ServerState>, dump: MMinidump) {
    info!("Decoding minidump");
    let attempts_at_claim = dump.decode_attempts;

    match run_decode(Arc::clone(&state), &dump).await {
        Ok(result) => {
            match persist_decode_result(Arc::clone(&state), dump.id, attempts_at_claim, result)
                .await
            {
                Ok(PersistOutcome::Stored) => info!("Minidump decoded"),
                Ok(PersistOutcome::Stale) => {
                    warn!("Discarding decode result, minidump was reprocessed concurrently")
                }
                Err(e) => error!(error = %e, "Failed to persist decode result"),
            }
        }
        Err(e) => {
            error!(error = %e, "Decode attempt failed");
            match record_failed_attempt(Arc::clone(&state), dump.id, attempts_at_claim).await {
                Ok(PersistOutcome::Stored) => {
                    if attempts_at_claim + 1 >= state.cli.max_decode_attempts {
                        warn!("Decode attempt budget exhausted, leaving minidump unprocessed");
                    }
                }
                Ok(PersistOutcome::Stale) => {
                    warn!("Minidump was reprocessed concurrently, skipping attempt bump")
                }
                Err(e) => error!(error = %e, "Failed to record decode attempt"),
            }
        }
    }
}

/// Charge a failed attempt against the budget. The row keeps
/// decode_task_complete = false and stays claimable until the budget
/// runs out; the bump goes through the same fence as a successful
/// persist so a concurrent re-queue is never overwritten.
pub async fn record_failed_attempt(
    state: Arc<ServerState>,
    minidump_id: Uuid,
    attempts_at_claim: i32,
) -> Result<PersistOutcome> {
    let update = EMinidump::update_many()
        .filter(CMinidump::Id.eq(minidump_id))
        .filter(CMinidump::DecodeAttempts.eq(attempts_at_claim))
        .col_expr(
            CMinidump::DecodeAttempts,
            Expr::value(attempts_at_claim + 1),
        )
        .exec(&state.db)
        .await
        .context("Failed to update minidump row")?;

    if update.rows_affected == 0 {
        Ok(PersistOutcome::Stale)
    } else {
        Ok(PersistOutcome::Stored)
    }
}

async fn run_decode(state: Arc<ServerState>, dump: &MMinidump) -> Result<DecodeResult> {
    let scratch = ScratchDir::create(&state.cli.base_path).await?;
    let dump_path = scratch.path().join(&dump.filename);

    let dump_bytes = state
        .storage
        .read(&minidump_store_path(dump.project, &dump.filename), None)
        .await
        .context("Minidump bytes are missing from storage")?;
    tokio::fs::write(&dump_path, &dump_bytes)
        .await
        .context("Failed to write minidump to scratch directory")?;

    let report = run_stackwalker(
        &state.cli.binpath_stackwalker,
        &dump_path,
        None,
        state.cli.decode_timeout,
    )
    .await
    .context("Metadata stackwalk failed")?;

    let (module_id, build_id) = report
        .main_module_identity()
        .context("Stackwalker did not identify a main module")?;
    if !safe_identifier(&module_id) || !safe_identifier(&build_id) {
        anyhow::bail!("Main module identity {}/{} is not a safe path component", module_id, build_id);
    }

    let build =
        get_or_create_build_metadata(Arc::clone(&state), dump.project, &module_id, &build_id)
            .await?;

    let Some(symbol) = get_symbol_for_build(Arc::clone(&state), build.id).await? else {
        info!(module_id, build_id, "No symbol uploaded for build, storing metadata-only stacktrace");
        return Ok(DecodeResult {
            build_metadata_id: build.id,
            stacktrace: serde_json::to_value(&report)
                .context("Failed to serialize stackwalk report")?,
            symbolicated: false,
        });
    };

    let sym_dir = scratch.path().join("symbols");
    let sym_bytes = state
        .storage
        .read(&symbol.file_location, None)
        .await
        .context("Symbol bytes are missing from storage")?;
    write_sym(
        &sym_dir.join(canonical_sym_path(&build.module_id, &build.build_id)),
        &sym_bytes,
    )
    .await?;

    if symbol.os == "windows" {
        resolve_windows_symbols(Arc::clone(&state), &report.modules_missing_symbols(), &sym_dir)
            .await;
    }

    let report = run_stackwalker(
        &state.cli.binpath_stackwalker,
        &dump_path,
        Some(&sym_dir),
        state.cli.decode_timeout,
    )
    .await
    .context("Symbolicating stackwalk failed")?;

    Ok(DecodeResult {
        build_metadata_id: build.id,
        stacktrace: serde_json::to_value(&report).context("Failed to serialize stackwalk report")?,
        symbolicated: true,
    })
}

/// Pull vendor symbols for the modules the walker flagged into the
/// job-local symbol directory. Misses and fetch errors degrade the
/// stacktrace, they never fail the decode.
async fn resolve_windows_symbols(
    state: Arc<ServerState>,
    missing: &[(String, String)],
    sym_dir: &Path,
) {
    let symcache = match SymbolCache::from_state(&state) {
        Ok(symcache) => symcache,
        Err(e) => {
            warn!(error = %e, "Symbol cache unavailable, skipping vendor symbols");
            return;
        }
    };

    let mut downloaded = 0;
    let mut existing = 0;

    for (module_id, build_id) in missing {
        match symcache.ensure(module_id, build_id).await {
            Ok(FetchOutcome::Downloaded { .. }) => downloaded += 1,
            Ok(FetchOutcome::AlreadyCached) => existing += 1,
            Ok(FetchOutcome::Unavailable) => continue,
            Err(e) => {
                warn!(module_id, build_id, error = %e, "Vendor symbol fetch failed");
                continue;
            }
        }

        let target = sym_dir.join(canonical_sym_path(module_id, build_id));
        if let Some(parent) = target.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!(module_id, build_id, error = %e, "Failed to stage vendor symbol");
                continue;
            }
        }
        if let Err(e) = tokio::fs::copy(symcache.cached_sym_path(module_id, build_id), &target).await
        {
            warn!(module_id, build_id, error = %e, "Failed to stage vendor symbol");
        }
    }

    info!(downloaded, existing, "Resolved vendor symbols");
}

async fn write_sym(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .context("Failed to create symbol staging directory")?;
    }
    tokio::fs::write(path, data)
        .await
        .context("Failed to stage symbol file")
}

/// Write the attempt back only if nobody reset the row since the claim.
/// The attempt counter read at claim time is the fence; zero affected
/// rows means a symbol upload re-queued the dump mid-decode and this
/// result is based on stale inputs.
pub async fn persist_decode_result(
    state: Arc<ServerState>,
    minidump_id: Uuid,
    attempts_at_claim: i32,
    result: DecodeResult,
) -> Result<PersistOutcome> {
    let update = EMinidump::update_many()
        .filter(CMinidump::Id.eq(minidump_id))
        .filter(CMinidump::DecodeAttempts.eq(attempts_at_claim))
        .col_expr(
            CMinidump::BuildMetadata,
            Expr::value(Some(result.build_metadata_id)),
        )
        .col_expr(CMinidump::Stacktrace, Expr::value(result.stacktrace))
        .col_expr(CMinidump::Symbolicated, Expr::value(result.symbolicated))
        .col_expr(CMinidump::DecodeTaskComplete, Expr::value(true))
        .col_expr(
            CMinidump::DecodeAttempts,
            Expr::value(attempts_at_claim + 1),
        )
        .exec(&state.db)
        .await
        .context("Failed to update minidump row")?;

    if update.rows_affected == 0 {
        Ok(PersistOutcome::Stale)
    } else {
        Ok(PersistOutcome::Stored)
    }
}
