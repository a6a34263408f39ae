/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ApiKeyQuery {
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct SymbolKeyQuery {
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct V1UploadQuery {
    pub api_key: String,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct V2UploadQuery {
    pub upload_key: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MinidumpUploadResponse {
    pub status: String,
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MinidumpStatusResponse {
    pub id: Uuid,
    pub filename: String,
    pub client_guid: Option<String>,
    pub symbolicated: bool,
    pub decode_task_complete: bool,
    pub created_at: NaiveDateTime,
    pub stacktrace: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SymbolSummary {
    pub id: Uuid,
    pub os: String,
    pub arch: String,
    pub app_version: Option<String>,
    pub file_size_bytes: i64,
    pub file_hash: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckStatusResponse {
    pub status: String,
}

/// Field names follow the breakpad sym-upload-v2 client, which expects
/// camelCase keys in this response.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUploadResponse {
    #[serde(rename = "uploadUrl")]
    pub upload_url: String,
    #[serde(rename = "uploadKey")]
    pub upload_key: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SymbolIdentity {
    pub debug_file: String,
    pub debug_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteUploadRequest {
    pub symbol_id: SymbolIdentity,
    pub symbol_upload_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteUploadResponse {
    pub result: String,
}
