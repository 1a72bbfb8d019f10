//! # hostfacts Common Library
//!
//! Shared code for the hostfacts crates including:
//! - Error type
//! - TOML bootstrap configuration and root folder resolution
//! - Database initialization, schema and row models

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
