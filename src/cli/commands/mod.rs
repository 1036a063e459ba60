//! CLI command implementations

pub mod completions;
pub mod entity;
pub mod finance;
pub mod init;
pub mod item;
