/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use super::input::{greater_than_zero, port_in_range};
use clap::Parser;
use entity::{
    annotation, attachment, build_metadata, minidump, project, storage as storage_table,
    sym_upload_tracker, symbol,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use storage::StorageService;

#[derive(Parser, Debug, Clone)]
#[command(name = "Crashpoint", display_name = "Crashpoint", bin_name = "crashpoint-server", author = "Wavelens", version, about, long_about = None)]
pub struct Cli {
    #[arg(long, env = "CRASHPOINT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
    #[arg(long, env = "CRASHPOINT_IP", default_value = "127.0.0.1")]
    pub ip: String,
    #[arg(long, env = "CRASHPOINT_PORT", value_parser = port_in_range, default_value_t = 3000)]
    pub port: u16,
    #[arg(
        long,
        env = "CRASHPOINT_SERVE_URL",
        default_value = "http://127.0.0.1:3000"
    )]
    pub serve_url: String,
    #[arg(long, env = "CRASHPOINT_DATABASE_URL")]
    pub database_url: Option<String>,
    #[arg(long, env = "CRASHPOINT_DATABASE_URL_FILE")]
    pub database_url_file: Option<String>,
    #[arg(long, env = "CRASHPOINT_MAX_CONCURRENT_DECODES", value_parser = greater_than_zero::<usize>, default_value = "10")]
    pub max_concurrent_decodes: usize,
    #[arg(long, env = "CRASHPOINT_MAX_DECODE_ATTEMPTS", value_parser = greater_than_zero::<i32>, default_value = "5")]
    pub max_decode_attempts: i32,
    #[arg(long, env = "CRASHPOINT_DECODE_TIMEOUT", value_parser = greater_than_zero::<u64>, default_value = "120")]
    pub decode_timeout: u64,
    #[arg(long, env = "CRASHPOINT_FETCH_TIMEOUT", value_parser = greater_than_zero::<u64>, default_value = "30")]
    pub fetch_timeout: u64,
    #[arg(long, env = "CRASHPOINT_BASE_PATH", default_value = ".")]
    pub base_path: String,
    #[arg(
        long,
        env = "CRASHPOINT_SYMBOL_SERVER_URL",
        default_value = super::consts::WINDOWS_SYMBOL_SERVER_URL
    )]
    pub symbol_server_url: String,
    #[arg(
        long,
        env = "CRASHPOINT_BINPATH_STACKWALKER",
        default_value = "stackwalker"
    )]
    pub binpath_stackwalker: String,
    #[arg(long, env = "CRASHPOINT_BINPATH_DUMP_SYMS", default_value = "dump_syms")]
    pub binpath_dump_syms: String,
    #[arg(long, env = "CRASHPOINT_REPORT_ERRORS", default_value = "false")]
    pub report_errors: bool,
    #[arg(long, env = "CRASHPOINT_STATE_FILE")]
    pub state_file: Option<String>,
}

pub struct ServerState {
    pub db: DatabaseConnection,
    pub cli: Cli,
    pub storage: StorageService,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct BaseResponse<T> {
    pub error: bool,
    pub message: T,
}

pub type EAnnotation = annotation::Entity;
pub type EAttachment = attachment::Entity;
pub type EBuildMetadata = build_metadata::Entity;
pub type EMinidump = minidump::Entity;
pub type EProject = project::Entity;
pub type EStorage = storage_table::Entity;
pub type ESymUploadTracker = sym_upload_tracker::Entity;
pub type ESymbol = symbol::Entity;

pub type MAnnotation = annotation::Model;
pub type MAttachment = attachment::Model;
pub type MBuildMetadata = build_metadata::Model;
pub type MMinidump = minidump::Model;
pub type MProject = project::Model;
pub type MStorage = storage_table::Model;
pub type MSymUploadTracker = sym_upload_tracker::Model;
pub type MSymbol = symbol::Model;

pub type AAnnotation = annotation::ActiveModel;
pub type AAttachment = attachment::ActiveModel;
pub type ABuildMetadata = build_metadata::ActiveModel;
pub type AMinidump = minidump::ActiveModel;
pub type AProject = project::ActiveModel;
pub type AStorage = storage_table::ActiveModel;
pub type ASymUploadTracker = sym_upload_tracker::ActiveModel;
pub type ASymbol = symbol::ActiveModel;

pub type CAnnotation = annotation::Column;
pub type CAttachment = attachment::Column;
pub type CBuildMetadata = build_metadata::Column;
pub type CMinidump = minidump::Column;
pub type CProject = project::Column;
pub type CStorage = storage_table::Column;
pub type CSymUploadTracker = sym_upload_tracker::Column;
pub type CSymbol = symbol::Column;
