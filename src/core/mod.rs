//! Core module - shared infrastructure for pentest-crew
//!
//! Foundational types, configuration, logging and error handling used
//! throughout the application.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::Config;
pub use error::{CrewError, Result};
pub use types::*;
