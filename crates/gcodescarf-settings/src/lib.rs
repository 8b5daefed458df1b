//! GCodeScarf Settings Crate
//!
//! Loads, validates and saves the scarfing parameters and output options
//! used by the command-line driver.

pub mod config;
pub mod error;

pub use config::{Config, LineEndingSetting, OutputSettings};
pub use error::{SettingsError, SettingsResult};
