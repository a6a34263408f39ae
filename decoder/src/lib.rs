/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub mod scheduler;
pub mod tests;

use crashpoint_core::types::ServerState;
use std::sync::Arc;

pub async fn start_decoder(state: Arc<ServerState>) -> std::io::Result<()> {
    tokio::spawn(scheduler::decode_loop(Arc::clone(&state)));
    Ok(())
}
