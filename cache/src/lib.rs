/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub mod symsrv;
pub mod tests;

pub use symsrv::{FetchOutcome, SymbolCache};
