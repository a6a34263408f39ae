/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("failed to spawn `{binary}`: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{binary}` did not finish within {seconds}s")]
    Timeout { binary: String, seconds: u64 },
    #[error("`{binary}` exited with {status}: {stderr}")]
    Failed {
        binary: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("failed to parse `{binary}` output: {source}")]
    Parse {
        binary: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrashInfo {
    #[serde(rename = "type")]
    pub crash_type: Option<String>,
    pub address: Option<String>,
    pub crashing_thread: Option<usize>,
    pub assertion: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: Option<String>,
    pub os_ver: Option<String>,
    pub cpu_arch: Option<String>,
    pub cpu_info: Option<String>,
    pub cpu_count: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub base_addr: Option<String>,
    pub end_addr: Option<String>,
    pub code_id: Option<String>,
    pub debug_file: Option<String>,
    pub debug_id: Option<String>,
    pub filename: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub missing_symbols: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameInfo {
    pub frame: Option<u32>,
    pub file: Option<String>,
    pub func: Option<String>,
    pub function_offset: Option<String>,
    pub line: Option<u32>,
    pub module: Option<String>,
    pub module_offset: Option<String>,
    pub offset: Option<String>,
    pub trust: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registers: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadInfo {
    pub frame_count: Option<u32>,
    #[serde(default)]
    pub frames: Vec<FrameInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// JSON emitted by the external stackwalker. Unknown fields survive a
/// round trip through the `extra` maps so the stored stacktrace is not
/// lossy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackwalkReport {
    #[serde(default)]
    pub crash_info: CrashInfo,
    #[serde(default)]
    pub system_info: SystemInfo,
    #[serde(default)]
    pub modules: Vec<ModuleInfo>,
    #[serde(default)]
    pub threads: Vec<ThreadInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crashing_thread: Option<ThreadInfo>,
    pub main_module: Option<usize>,
    pub pid: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StackwalkReport {
    /// Debug identity of the module the crash originated in.
    pub fn main_module_identity(&self) -> Option<(String, String)> {
        let module = self.modules.get(self.main_module?)?;
        Some((module.debug_file.clone()?, module.debug_id.clone()?))
    }

    /// (debug_file, debug_id) for every module the walker flagged.
    pub fn modules_missing_symbols(&self) -> Vec<(String, String)> {
        self.modules
            .iter()
            .filter(|m| m.missing_symbols)
            .filter_map(|m| Some((m.debug_file.clone()?, m.debug_id.clone()?)))
            .collect()
    }

    /// The walker reports register state only on the standalone
    /// crashing_thread object; copy it onto the thread list so the stored
    /// stacktrace is self-contained.
    pub fn merge_crashing_thread_registers(&mut self) {
        let Some(index) = self.crash_info.crashing_thread else {
            return;
        };
        let registers = self
            .crashing_thread
            .as_ref()
            .and_then(|t| t.frames.first())
            .and_then(|f| f.registers.clone());

        if let (Some(registers), Some(frame)) = (
            registers,
            self.threads
                .get_mut(index)
                .and_then(|t| t.frames.first_mut()),
        ) {
            frame.registers = Some(registers);
        }
    }
}

async fn run_with_timeout(
    binary: &str,
    mut command: Command,
    seconds: u64,
) -> Result<std::process::Output, ProcessorError> {
    let child = command
        .kill_on_drop(true)
        .output();

    let output = timeout(Duration::from_secs(seconds), child)
        .await
        .map_err(|_| ProcessorError::Timeout {
            binary: binary.to_string(),
            seconds,
        })?
        .map_err(|source| ProcessorError::Spawn {
            binary: binary.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ProcessorError::Failed {
            binary: binary.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(output)
}

/// `stackwalker <dump_path> [<symbol_dir>]`, JSON on stdout.
pub async fn run_stackwalker(
    binpath: &str,
    dump_path: &Path,
    symbol_dir: Option<&Path>,
    timeout_secs: u64,
) -> Result<StackwalkReport, ProcessorError> {
    let mut command = Command::new(binpath);
    command.arg(dump_path);
    if let Some(dir) = symbol_dir {
        command.arg(dir);
    }

    let output = run_with_timeout(binpath, command, timeout_secs).await?;

    let mut report: StackwalkReport =
        serde_json::from_slice(&output.stdout).map_err(|source| ProcessorError::Parse {
            binary: binpath.to_string(),
            source,
        })?;
    report.merge_crashing_thread_registers();
    Ok(report)
}

/// `dump_syms <artifact_path>`, breakpad sym text on stdout.
pub async fn run_dump_syms(
    binpath: &str,
    artifact_path: &Path,
    timeout_secs: u64,
) -> Result<Vec<u8>, ProcessorError> {
    let mut command = Command::new(binpath);
    command.arg(artifact_path);

    let output = run_with_timeout(binpath, command, timeout_secs).await?;
    Ok(output.stdout)
}
