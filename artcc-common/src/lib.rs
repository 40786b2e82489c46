//! Shared library for the ARTCC web application
//!
//! Holds the pieces used by every binary: error types, configuration
//! loading, database initialization, and the row/payload models.

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
