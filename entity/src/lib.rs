pub mod tests;

pub mod annotation;
pub mod attachment;
pub mod build_metadata;
pub mod minidump;
pub mod project;
pub mod storage;
pub mod sym_upload_tracker;
pub mod symbol;
