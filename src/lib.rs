pub mod cli;
pub mod db;
pub mod embedding;
pub mod error;
pub mod init;
pub mod models;
pub mod rules;
pub mod services;
pub mod utils;

pub use error::VestraError;
