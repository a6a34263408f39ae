/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use std::ops::RangeInclusive;

pub const PORT_RANGE: RangeInclusive<usize> = 1..=65535;

/// First four bytes of every valid minidump.
pub const MINIDUMP_MAGIC: &[u8; 4] = b"MDMP";

pub const GZIP_MAGIC: &[u8; 2] = &[0x1f, 0x8b];

/// Vendor symbol server for third-party Windows symbols.
pub const WINDOWS_SYMBOL_SERVER_URL: &str = "https://msdl.microsoft.com/download/symbols";

pub const API_KEY_LENGTH: usize = 32;
