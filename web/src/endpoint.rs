/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use axum::extract::{ConnectInfo, Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use chrono::Utc;
use crashpoint_core::breakpad::{
    attachment_store_path, minidump_store_path, tracker_store_path, trim_to_module, SymbolData,
};
use crashpoint_core::database::{get_build_metadata, get_symbol_for_build};
use crashpoint_core::types::*;
use entity::project::ProjectType;
use rand::distr::Alphanumeric;
use rand::Rng;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, TransactionTrait,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::auth::{project_from_minidump_key, project_from_symbol_key};
use super::error::{WebError, WebResult};
use super::operations::{
    cleanup_tracker, complete_tracked_upload, normalize_minidump, sha256_hex, symbol_upload,
    verify_claimed_identity, CompleteOutcome, SymbolOutcome,
};
use super::requests::*;

pub async fn handle_404() -> (StatusCode, Json<BaseResponse<String>>) {
    (
        StatusCode::NOT_FOUND,
        Json(BaseResponse {
            error: true,
            message: "Not Found".to_string(),
        }),
    )
}

pub async fn get_health() -> Json<BaseResponse<String>> {
    Json(BaseResponse {
        error: false,
        message: "200 ALIVE".to_string(),
    })
}

fn client_ip(headers: &HeaderMap, addr: &SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| addr.ip().to_string())
}

pub async fn post_minidump_upload(
    state: State<Arc<ServerState>>,
    Query(query): Query<ApiKeyQuery>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> WebResult<Json<MinidumpUploadResponse>> {
    let project = project_from_minidump_key(Arc::clone(&state), &query.api_key).await?;

    let mut dump_bytes: Option<Bytes> = None;
    let mut client_guid: Option<String> = None;
    let mut annotations: Vec<(String, String)> = vec![];
    let mut attachments: Vec<(String, String, Bytes)> = vec![];

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "upload_file_minidump" {
            dump_bytes = Some(field.bytes().await?);
        } else if let Some(filename) = field.file_name().map(str::to_string) {
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            attachments.push((filename, mime_type, field.bytes().await?));
        } else {
            let value = field.text().await?;
            match name.as_str() {
                "guid" => client_guid = Some(value),
                // The key authenticates the request, it is not crash context.
                "api_key" => {}
                _ => annotations.push((name, value)),
            }
        }
    }

    let dump_bytes = normalize_minidump(dump_bytes.ok_or_else(WebError::bad_minidump)?)?;

    let minidump_id = Uuid::new_v4();
    let filename = format!("minidump-{}.dmp", minidump_id.simple());

    let outcome = state
        .storage
        .create(
            &minidump_store_path(project.id, &filename),
            dump_bytes,
            None,
        )
        .await
        .map_err(anyhow::Error::from)?;
    if !outcome.is_durable() {
        return Err(WebError::storage_rejected("minidump"));
    }

    AMinidump {
        id: Set(minidump_id),
        project: Set(project.id),
        build_metadata: Set(None),
        filename: Set(filename),
        client_guid: Set(client_guid),
        upload_ip: Set(Some(client_ip(&headers, &addr))),
        stacktrace: Set(None),
        symbolicated: Set(false),
        decode_task_complete: Set(false),
        decode_attempts: Set(0),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(&state.db)
    .await?;

    for (key, value) in annotations {
        AAnnotation {
            id: Set(Uuid::new_v4()),
            minidump: Set(minidump_id),
            key: Set(key),
            value: Set(value),
        }
        .insert(&state.db)
        .await?;
    }

    let dump_tag = minidump_id.simple().to_string();
    for (original_filename, mime_type, data) in attachments {
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        let stored_filename = format!("attachment-{}-{}", &dump_tag[..8], suffix);

        let outcome = state
            .storage
            .create(
                &attachment_store_path(project.id, &stored_filename),
                data.clone(),
                None,
            )
            .await
            .map_err(anyhow::Error::from)?;
        if !outcome.is_durable() {
            return Err(WebError::storage_rejected("attachment"));
        }

        AAttachment {
            id: Set(Uuid::new_v4()),
            project: Set(project.id),
            minidump: Set(minidump_id),
            filename: Set(stored_filename),
            original_filename: Set(original_filename),
            mime_type: Set(mime_type),
            file_size_bytes: Set(data.len() as i64),
            created_at: Set(Utc::now().naive_utc()),
        }
        .insert(&state.db)
        .await?;
    }

    info!(minidump_id = %minidump_id, project = %project.name, "Minidump uploaded");

    Ok(Json(MinidumpUploadResponse {
        status: "success".to_string(),
        id: minidump_id,
    }))
}

async fn owned_minidump(
    state: Arc<ServerState>,
    api_key: &str,
    minidump_id: Uuid,
) -> WebResult<MMinidump> {
    let project = project_from_minidump_key(Arc::clone(&state), api_key).await?;

    let dump = EMinidump::find_by_id(minidump_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| WebError::not_found("Minidump"))?;

    // Reports are only visible through their own project's key.
    if dump.project != project.id {
        return Err(WebError::not_found("Minidump"));
    }

    Ok(dump)
}

pub async fn get_minidump(
    state: State<Arc<ServerState>>,
    Path(minidump_id): Path<Uuid>,
    Query(query): Query<ApiKeyQuery>,
) -> WebResult<Json<MinidumpStatusResponse>> {
    let dump = owned_minidump(Arc::clone(&state), &query.api_key, minidump_id).await?;

    Ok(Json(MinidumpStatusResponse {
        id: dump.id,
        filename: dump.filename,
        client_guid: dump.client_guid,
        symbolicated: dump.symbolicated,
        decode_task_complete: dump.decode_task_complete,
        created_at: dump.created_at,
        stacktrace: dump.stacktrace,
    }))
}

pub async fn delete_minidump(
    state: State<Arc<ServerState>>,
    Path(minidump_id): Path<Uuid>,
    Query(query): Query<ApiKeyQuery>,
) -> WebResult<Json<BaseResponse<String>>> {
    let dump = owned_minidump(Arc::clone(&state), &query.api_key, minidump_id).await?;

    state
        .storage
        .delete(&minidump_store_path(dump.project, &dump.filename))
        .await
        .map_err(anyhow::Error::from)?;

    let attachments = EAttachment::find()
        .filter(CAttachment::Minidump.eq(dump.id))
        .all(&state.db)
        .await?;
    for attachment in &attachments {
        state
            .storage
            .delete(&attachment_store_path(dump.project, &attachment.filename))
            .await
            .map_err(anyhow::Error::from)?;
    }

    let txn = state.db.begin().await?;
    EAnnotation::delete_many()
        .filter(CAnnotation::Minidump.eq(dump.id))
        .exec(&txn)
        .await?;
    EAttachment::delete_many()
        .filter(CAttachment::Minidump.eq(dump.id))
        .exec(&txn)
        .await?;
    EMinidump::delete_by_id(dump.id).exec(&txn).await?;
    txn.commit().await?;

    info!(minidump_id = %dump.id, "Minidump deleted");

    Ok(Json(BaseResponse {
        error: false,
        message: "Minidump deleted".to_string(),
    }))
}

pub async fn post_sym_upload_v1(
    state: State<Arc<ServerState>>,
    Query(query): Query<V1UploadQuery>,
    mut multipart: Multipart,
) -> WebResult<Response> {
    let project = project_from_symbol_key(Arc::clone(&state), &query.api_key).await?;

    if project.project_type == ProjectType::Versioned && query.version.is_none() {
        return Err(WebError::BadRequest(
            "Version is required for this project".to_string(),
        ));
    }

    let mut symbol_file: Option<Bytes> = None;
    let mut debug_file: Option<String> = None;
    let mut debug_id: Option<String> = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "symbol_file" => symbol_file = Some(field.bytes().await?),
            "debug_file" => debug_file = Some(field.text().await?),
            "debug_identifier" => debug_id = Some(field.text().await?),
            // os and cpu are advisory; the MODULE record is authoritative.
            _ => {}
        }
    }
    let symbol_file = symbol_file.ok_or_else(WebError::not_breakpad)?;

    let trimmed = trim_to_module(&symbol_file).ok_or_else(WebError::not_breakpad)?;
    let sym = SymbolData::from_sym_contents(trimmed).map_err(WebError::BadRequest)?;
    verify_claimed_identity(&sym, debug_file.as_deref(), debug_id.as_deref())?;

    match symbol_upload(Arc::clone(&state), &project, &symbol_file, query.version).await? {
        SymbolOutcome::Created(symbol) => Ok(Json(SymbolSummary {
            id: symbol.id,
            os: symbol.os,
            arch: symbol.arch,
            app_version: symbol.app_version,
            file_size_bytes: symbol.file_size_bytes,
            file_hash: symbol.file_hash,
            created_at: symbol.created_at,
        })
        .into_response()),
        SymbolOutcome::Duplicate => Ok((
            StatusCode::NON_AUTHORITATIVE_INFORMATION,
            Json(BaseResponse {
                error: false,
                message: "Symbol already uploaded".to_string(),
            }),
        )
            .into_response()),
    }
}

/// The final path segment arrives as `<value>:<action>`; the router
/// cannot split mid-segment, so handlers strip the suffix themselves.
fn strip_action<'a>(segment: &'a str, action: &str) -> WebResult<&'a str> {
    segment
        .strip_suffix(action)
        .ok_or_else(|| WebError::not_found("Route"))
}

pub async fn get_sym_upload_v2_check_status(
    state: State<Arc<ServerState>>,
    Path((module_id, build_segment)): Path<(String, String)>,
    Query(query): Query<SymbolKeyQuery>,
) -> WebResult<Json<CheckStatusResponse>> {
    let build_id = strip_action(&build_segment, ":checkStatus")?;
    let project = project_from_symbol_key(Arc::clone(&state), &query.key).await?;

    let status = match get_build_metadata(Arc::clone(&state), project.id, &module_id, build_id)
        .await?
    {
        None => "STATUS_UNSPECIFIED",
        Some(build) => match get_symbol_for_build(Arc::clone(&state), build.id).await? {
            None => "MISSING",
            Some(_) => "FOUND",
        },
    };

    Ok(Json(CheckStatusResponse {
        status: status.to_string(),
    }))
}

pub async fn post_sym_upload_v2_create(
    state: State<Arc<ServerState>>,
    Query(query): Query<SymbolKeyQuery>,
) -> WebResult<Json<CreateUploadResponse>> {
    let project = project_from_symbol_key(Arc::clone(&state), &query.key).await?;

    let tracker = ASymUploadTracker {
        id: Set(Uuid::new_v4()),
        project: Set(project.id),
        module_id: Set(None),
        build_id: Set(None),
        os: Set(None),
        arch: Set(None),
        file_hash: Set(None),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(&state.db)
    .await?;

    Ok(Json(CreateUploadResponse {
        upload_url: format!(
            "{}/symupload/v2/upload?upload_key={}",
            state.cli.serve_url, tracker.id
        ),
        upload_key: tracker.id,
    }))
}

pub async fn put_sym_upload_v2_upload(
    state: State<Arc<ServerState>>,
    Query(query): Query<V2UploadQuery>,
    body: Bytes,
) -> WebResult<Json<BaseResponse<String>>> {
    let tracker = ESymUploadTracker::find_by_id(query.upload_key)
        .one(&state.db)
        .await?
        .ok_or_else(|| WebError::not_found("Upload key"))?;

    let data = trim_to_module(&body).ok_or_else(WebError::not_breakpad)?;
    let sym = SymbolData::from_sym_contents(data).map_err(WebError::BadRequest)?;

    let outcome = state
        .storage
        .create(
            &tracker_store_path(tracker.id),
            Bytes::copy_from_slice(data),
            None,
        )
        .await
        .map_err(anyhow::Error::from)?;
    if !outcome.is_durable() {
        return Err(WebError::storage_rejected("symbol file"));
    }

    let mut active = tracker.into_active_model();
    active.module_id = Set(Some(sym.module_id));
    active.build_id = Set(Some(sym.build_id));
    active.os = Set(Some(sym.os));
    active.arch = Set(Some(sym.arch));
    active.file_hash = Set(Some(sha256_hex(data)));
    active.update(&state.db).await?;

    Ok(Json(BaseResponse {
        error: false,
        message: "Uploaded".to_string(),
    }))
}

pub async fn post_sym_upload_v2_complete(
    state: State<Arc<ServerState>>,
    Path(key_segment): Path<String>,
    Query(query): Query<SymbolKeyQuery>,
    Json(request): Json<CompleteUploadRequest>,
) -> WebResult<Json<CompleteUploadResponse>> {
    let upload_key = strip_action(&key_segment, ":complete")?
        .parse::<Uuid>()
        .map_err(|_| WebError::BadRequest("Invalid upload key".to_string()))?;
    let project = project_from_symbol_key(Arc::clone(&state), &query.key).await?;

    let tracker = ESymUploadTracker::find_by_id(upload_key)
        .one(&state.db)
        .await?
        .ok_or_else(|| WebError::not_found("Upload key"))?;
    if tracker.project != project.id {
        cleanup_tracker(Arc::clone(&state), tracker.id).await;
        return Err(WebError::not_found("Upload key"));
    }

    if request.symbol_upload_type != "BREAKPAD" {
        cleanup_tracker(Arc::clone(&state), tracker.id).await;
        return Err(WebError::BadRequest(format!(
            "Unsupported symbol upload type: {}",
            request.symbol_upload_type
        )));
    }

    let result = complete_tracked_upload(Arc::clone(&state), &project, &tracker).await;
    cleanup_tracker(Arc::clone(&state), tracker.id).await;

    match result? {
        CompleteOutcome::Ok => Ok(Json(CompleteUploadResponse {
            result: "OK".to_string(),
        })),
        CompleteOutcome::DuplicateData => Ok(Json(CompleteUploadResponse {
            result: "DUPLICATE_DATA".to_string(),
        })),
    }
}
