//! # tabsight Common Library
//!
//! Shared code for the tabsight crates:
//! - Common error type
//! - Bootstrap configuration (TOML) and config file discovery
//! - Service address resolution
//! - Logging initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
