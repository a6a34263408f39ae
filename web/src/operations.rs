/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use bytes::Bytes;
use chrono::Utc;
use crashpoint_core::breakpad::{
    safe_identifier, symbol_store_path, tracker_store_path, trim_to_module, SymbolData,
};
use crashpoint_core::consts::{GZIP_MAGIC, MINIDUMP_MAGIC};
use crashpoint_core::database::{get_build_metadata, get_or_create_build_metadata, get_symbol_for_build};
use crashpoint_core::input::vec_to_hex;
use crashpoint_core::types::*;
use flate2::read::GzDecoder;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::{WebError, WebResult};

#[derive(Debug)]
pub enum SymbolOutcome {
    Created(MSymbol),
    /// The build already has a symbol; uploads are rejected, not merged.
    Duplicate,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CompleteOutcome {
    Ok,
    /// Byte-identical re-upload of a symbol the build already has.
    DuplicateData,
}

/// Transparently inflate gzip uploads and verify the minidump magic.
pub fn normalize_minidump(data: Bytes) -> WebResult<Bytes> {
    let data = if data.starts_with(GZIP_MAGIC) {
        let mut inflated = Vec::new();
        GzDecoder::new(&data[..])
            .read_to_end(&mut inflated)
            .map_err(|_| WebError::BadRequest("Corrupt gzip stream".to_string()))?;
        Bytes::from(inflated)
    } else {
        data
    };

    if !data.starts_with(MINIDUMP_MAGIC) {
        return Err(WebError::bad_minidump());
    }

    Ok(data)
}

pub fn sha256_hex(data: &[u8]) -> String {
    vec_to_hex(&Sha256::digest(data))
}

/// Single-shot symbol ingestion shared by both upload protocol
/// generations: parse the MODULE record, attach the symbol to its build
/// and re-queue every dump that was decoded without it.
pub async fn symbol_upload(
    state: Arc<ServerState>,
    project: &MProject,
    data: &[u8],
    app_version: Option<String>,
) -> WebResult<SymbolOutcome> {
    let data = trim_to_module(data).ok_or_else(WebError::not_breakpad)?;
    let sym = SymbolData::from_sym_contents(data).map_err(WebError::BadRequest)?;
    // Both identifiers become path components in the symbol store.
    if !safe_identifier(&sym.module_id) || !safe_identifier(&sym.build_id) {
        return Err(WebError::BadRequest(
            "Symbol identity is not a valid path component".to_string(),
        ));
    }

    let build = get_or_create_build_metadata(
        Arc::clone(&state),
        project.id,
        &sym.module_id,
        &sym.build_id,
    )
    .await?;

    if get_symbol_for_build(Arc::clone(&state), build.id)
        .await?
        .is_some()
    {
        return Ok(SymbolOutcome::Duplicate);
    }

    let file_location = symbol_store_path(project.id, &sym.module_id, &sym.build_id);
    let outcome = state
        .storage
        .create(&file_location, Bytes::copy_from_slice(data), None)
        .await
        .map_err(anyhow::Error::from)?;
    if !outcome.is_durable() {
        return Err(WebError::storage_rejected("symbol file"));
    }

    let symbol = ASymbol {
        id: Set(Uuid::new_v4()),
        project: Set(project.id),
        build_metadata: Set(build.id),
        os: Set(sym.os.clone()),
        arch: Set(sym.arch.clone()),
        app_version: Set(app_version),
        file_location: Set(file_location),
        file_size_bytes: Set(data.len() as i64),
        file_hash: Set(sha256_hex(data)),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(&state.db)
    .await?;

    info!(
        module_id = %sym.module_id,
        build_id = %sym.build_id,
        os = %sym.os,
        "Symbol uploaded"
    );

    reprocess_unsymbolicated(state, build.id).await?;

    Ok(SymbolOutcome::Created(symbol))
}

/// Re-queue every dump of this build that was decoded without a symbol.
/// Bumping the attempt counter fences out decode results that are still
/// in flight against the symbol-less state.
async fn reprocess_unsymbolicated(state: Arc<ServerState>, build_metadata_id: Uuid) -> WebResult<()> {
    let update = EMinidump::update_many()
        .filter(CMinidump::BuildMetadata.eq(build_metadata_id))
        .filter(CMinidump::Symbolicated.eq(false))
        .col_expr(CMinidump::DecodeTaskComplete, Expr::value(false))
        .col_expr(
            CMinidump::DecodeAttempts,
            Expr::col(CMinidump::DecodeAttempts).add(1),
        )
        .exec(&state.db)
        .await?;

    if update.rows_affected > 0 {
        info!(
            build_metadata_id = %build_metadata_id,
            count = update.rows_affected,
            "Re-queued minidumps for symbolication"
        );
    }

    Ok(())
}

/// Single-shot uploads may claim the debug identity in form fields; when
/// they do, it must agree with the MODULE record inside the file.
pub fn verify_claimed_identity(
    sym: &SymbolData,
    debug_file: Option<&str>,
    debug_id: Option<&str>,
) -> WebResult<()> {
    if debug_file.is_some_and(|f| f != sym.module_id) || debug_id.is_some_and(|d| d != sym.build_id)
    {
        return Err(WebError::BadRequest(
            "Symbol file does not match the claimed debug identity".to_string(),
        ));
    }
    Ok(())
}

/// `complete` step of the staged upload protocol. Reads the tracked
/// bytes back, acknowledges a byte-identical re-upload of an existing
/// symbol without touching stored data, otherwise ingests it as a
/// regular symbol upload. Tracker cleanup stays with the caller, which
/// owes it in every outcome.
pub async fn complete_tracked_upload(
    state: Arc<ServerState>,
    project: &MProject,
    tracker: &MSymUploadTracker,
) -> WebResult<CompleteOutcome> {
    let tracked_bytes = match state
        .storage
        .read(&tracker_store_path(tracker.id), None)
        .await
    {
        Ok(bytes) => bytes,
        Err(e) if e.is_not_found() => {
            return Err(WebError::BadRequest(
                "No symbol bytes were uploaded".to_string(),
            ));
        }
        Err(e) => return Err(WebError::Internal(e.into())),
    };

    if let (Some(module_id), Some(build_id), Some(file_hash)) =
        (&tracker.module_id, &tracker.build_id, &tracker.file_hash)
    {
        if let Some(build) =
            get_build_metadata(Arc::clone(&state), project.id, module_id, build_id).await?
        {
            if let Some(symbol) = get_symbol_for_build(Arc::clone(&state), build.id).await? {
                if symbol.file_hash == *file_hash {
                    return Ok(CompleteOutcome::DuplicateData);
                }
            }
        }
    }

    match symbol_upload(state, project, &tracked_bytes, None).await? {
        SymbolOutcome::Created(_) => Ok(CompleteOutcome::Ok),
        SymbolOutcome::Duplicate => Err(WebError::already_symbolized()),
    }
}

/// Drop a sym-upload-v2 tracking record and its staged bytes. Runs in
/// every `complete` outcome; failures are logged, the protocol response
/// does not depend on them.
pub async fn cleanup_tracker(state: Arc<ServerState>, tracker_id: Uuid) {
    let path = crashpoint_core::breakpad::tracker_store_path(tracker_id);
    if let Err(e) = state.storage.delete(&path).await {
        warn!(tracker_id = %tracker_id, error = %e, "Failed to delete tracked symbol bytes");
    }
    if let Err(e) = ESymUploadTracker::delete_by_id(tracker_id)
        .exec(&state.db)
        .await
    {
        warn!(tracker_id = %tracker_id, error = %e, "Failed to delete upload tracker row");
    }
}
