/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use uuid::Uuid;

/// Identity parsed from the first line of a breakpad symbol file:
/// `MODULE <os> <arch> <build_id> <module_id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolData {
    pub os: String,
    pub arch: String,
    pub build_id: String,
    pub module_id: String,
}

impl SymbolData {
    pub fn from_module_line(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();

        if parts.next() != Some("MODULE") {
            return Err("symbol file does not start with a MODULE record".to_string());
        }

        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(os), Some(arch), Some(build_id), Some(module_id)) => Ok(Self {
                os: os.to_string(),
                arch: arch.to_string(),
                build_id: build_id.to_string(),
                module_id: module_id.to_string(),
            }),
            _ => Err("incomplete MODULE record".to_string()),
        }
    }

    pub fn from_sym_contents(data: &[u8]) -> Result<Self, String> {
        let first_line = data
            .split(|b| *b == b'\n')
            .next()
            .ok_or_else(|| "empty symbol file".to_string())?;
        let line = std::str::from_utf8(first_line)
            .map_err(|_| "MODULE record is not valid utf-8".to_string())?;
        Self::from_module_line(line)
    }
}

/// Uploads sometimes carry junk ahead of the MODULE record; drop it.
pub fn trim_to_module(data: &[u8]) -> Option<&[u8]> {
    data.windows(6)
        .position(|w| w == b"MODULE")
        .map(|start| &data[start..])
}

/// Debug identifiers end up as path components under the scratch, cache
/// and storage roots. Anything that is not a single normal component is
/// rejected before it touches a path join.
pub fn safe_identifier(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && !s.contains(['/', '\\'])
        && !s.contains('\0')
}

/// `app.pdb` becomes `app`; identifiers without a dot stay whole.
pub fn module_stem(module_id: &str) -> &str {
    module_id.split('.').next().unwrap_or(module_id)
}

pub fn sym_file_name(module_id: &str) -> String {
    format!("{}.sym", module_stem(module_id))
}

/// Cache-relative location symbolicator tools expect:
/// `<module_id>/<build_id>/<stem>.sym`.
pub fn canonical_sym_path(module_id: &str, build_id: &str) -> String {
    format!("{}/{}/{}", module_id, build_id, sym_file_name(module_id))
}

pub fn symbol_store_path(project_id: Uuid, module_id: &str, build_id: &str) -> String {
    format!(
        "symbol/{}/{}",
        project_id,
        canonical_sym_path(module_id, build_id)
    )
}

pub fn minidump_store_path(project_id: Uuid, filename: &str) -> String {
    format!("minidump/{}/{}", project_id, filename)
}

pub fn attachment_store_path(project_id: Uuid, filename: &str) -> String {
    format!("attachment/{}/{}", project_id, filename)
}

pub fn tracker_store_path(tracker_id: Uuid) -> String {
    format!("sym_upload/{}.sym", tracker_id)
}
