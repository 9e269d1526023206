//! # DJTL Common Library
//!
//! Shared code for the DJ tracklist identifier workspace:
//! - Common error type
//! - TOML configuration file model and resolution
//! - Tracklist timestamp formatting

pub mod config;
pub mod error;
pub mod human_time;

pub use error::{Error, Result};
