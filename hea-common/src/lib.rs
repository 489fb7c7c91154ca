//! Shared infrastructure for the Home Energy Audit backend
//!
//! Holds the pieces that are not specific to any one endpoint: the common
//! error type, configuration resolution, and database pool bootstrap.

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
