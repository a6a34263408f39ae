/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result};
use crashpoint_core::breakpad::{canonical_sym_path, safe_identifier, SymbolData};
use crashpoint_core::processor::run_dump_syms;
use crashpoint_core::types::ServerState;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of a cache lookup for one (module_id, build_id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Downloaded { os: String, arch: String },
    AlreadyCached,
    /// Upstream has no artifact for this identity. Normal, not an error.
    Unavailable,
}

/// On-demand fetch + convert + cache of third-party Windows symbols.
/// Filesystem presence of the converted `.sym` file is the cache index;
/// entries are never evicted here and the directory may be discarded and
/// rebuilt at any time.
pub struct SymbolCache {
    cache_dir: PathBuf,
    server_url: String,
    binpath_dump_syms: String,
    convert_timeout: u64,
    client: reqwest::Client,
}

impl SymbolCache {
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        server_url: impl Into<String>,
        binpath_dump_syms: impl Into<String>,
        fetch_timeout: u64,
        convert_timeout: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(fetch_timeout))
            .build()
            .context("Failed to build symbol server client")?;

        Ok(Self {
            cache_dir: cache_dir.into(),
            server_url: server_url.into(),
            binpath_dump_syms: binpath_dump_syms.into(),
            convert_timeout,
            client,
        })
    }

    pub fn from_state(state: &ServerState) -> Result<Self> {
        Self::new(
            Path::new(&state.cli.base_path).join("symcache"),
            state.cli.symbol_server_url.clone(),
            state.cli.binpath_dump_syms.clone(),
            state.cli.fetch_timeout,
            state.cli.decode_timeout,
        )
    }

    pub fn cached_sym_path(&self, module_id: &str, build_id: &str) -> PathBuf {
        self.cache_dir.join(canonical_sym_path(module_id, build_id))
    }

    pub fn download_url(&self, module_id: &str, build_id: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.server_url, module_id, build_id, module_id
        )
    }

    /// Make the converted symbol for (module_id, build_id) present in the
    /// cache, downloading and converting it if needed.
    pub async fn ensure(&self, module_id: &str, build_id: &str) -> Result<FetchOutcome> {
        // Identities come from walker output and become path components.
        if !safe_identifier(module_id) || !safe_identifier(build_id) {
            anyhow::bail!(
                "symbol identity {}/{} is not a safe path component",
                module_id,
                build_id
            );
        }

        let sym_path = self.cached_sym_path(module_id, build_id);
        if tokio::fs::try_exists(&sym_path).await.unwrap_or(false) {
            debug!(module_id, build_id, "symbol already cached");
            return Ok(FetchOutcome::AlreadyCached);
        }

        let url = self.download_url(module_id, build_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Symbol server request failed")?;

        if !response.status().is_success() {
            debug!(module_id, build_id, status = %response.status(), "symbol unavailable upstream");
            return Ok(FetchOutcome::Unavailable);
        }

        let artifact = response
            .bytes()
            .await
            .context("Failed to read symbol server response")?;

        let artifact_path = self
            .cache_dir
            .join(module_id)
            .join(build_id)
            .join(module_id);
        if let Some(parent) = artifact_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create symbol cache directory")?;
        }
        tokio::fs::write(&artifact_path, &artifact)
            .await
            .context("Failed to write downloaded artifact")?;

        let converted =
            run_dump_syms(&self.binpath_dump_syms, &artifact_path, self.convert_timeout).await;

        // The raw artifact is scratch in every outcome.
        if let Err(e) = tokio::fs::remove_file(&artifact_path).await {
            warn!(path = %artifact_path.display(), error = %e, "failed to remove raw artifact");
        }

        let converted = converted.context("Failed to convert downloaded symbol")?;
        let sym = SymbolData::from_sym_contents(&converted)
            .map_err(|e| anyhow::anyhow!("converted symbol is malformed: {}", e))?;

        tokio::fs::write(&sym_path, &converted)
            .await
            .context("Failed to write converted symbol")?;

        info!(module_id, build_id, os = %sym.os, arch = %sym.arch, "downloaded third-party symbol");
        Ok(FetchOutcome::Downloaded {
            os: sym.os,
            arch: sym.arch,
        })
    }
}
