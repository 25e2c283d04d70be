//! CLI command handlers.

pub mod catalog;
pub mod embed;
pub mod recommend;
pub mod rules;
pub mod status;
