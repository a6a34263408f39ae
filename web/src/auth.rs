/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crashpoint_core::database::{get_project_by_minidump_key, get_project_by_symbol_key};
use crashpoint_core::types::*;
use std::sync::Arc;

use super::error::{WebError, WebResult};

/// Resolve the project owning a crash-upload API key.
pub async fn project_from_minidump_key(
    state: Arc<ServerState>,
    api_key: &str,
) -> WebResult<MProject> {
    get_project_by_minidump_key(state, api_key)
        .await?
        .ok_or_else(WebError::invalid_api_key)
}

/// Resolve the project owning a symbol-upload API key.
pub async fn project_from_symbol_key(
    state: Arc<ServerState>,
    api_key: &str,
) -> WebResult<MProject> {
    get_project_by_symbol_key(state, api_key)
        .await?
        .ok_or_else(WebError::invalid_api_key)
}
