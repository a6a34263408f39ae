/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub mod auth;
mod endpoint;
pub mod error;
pub mod operations;
pub mod requests;
pub mod tests;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use crashpoint_core::types::ServerState;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Minidumps arrive with attachments in one multipart body.
const MAX_UPLOAD_BYTES: usize = 128 * 1024 * 1024;

pub async fn serve_web(state: Arc<ServerState>) -> std::io::Result<()> {
    let server_url = format!("{}:{}", state.cli.ip.clone(), state.cli.port.clone());
    let app = Router::new()
        .route("/api/minidump/upload", post(endpoint::post_minidump_upload))
        .route(
            "/api/minidump/{minidump}",
            get(endpoint::get_minidump).delete(endpoint::delete_minidump),
        )
        .route("/symupload/v1/upload", post(endpoint::post_sym_upload_v1))
        .route(
            "/symupload/v2/v1/symbols/{module_id}/{build_id}",
            get(endpoint::get_sym_upload_v2_check_status),
        )
        .route(
            "/symupload/v2/v1/uploads:create",
            post(endpoint::post_sym_upload_v2_create),
        )
        .route(
            "/symupload/v2/upload",
            put(endpoint::put_sym_upload_v2_upload),
        )
        .route(
            "/symupload/v2/v1/uploads/{upload_key}",
            post(endpoint::post_sym_upload_v2_complete),
        )
        .route("/api/health", get(endpoint::get_health))
        .fallback(endpoint::handle_404)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&server_url).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}
