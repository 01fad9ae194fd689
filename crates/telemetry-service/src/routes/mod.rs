//! HTTP endpoints

pub mod config;
pub mod read;
pub mod status;
