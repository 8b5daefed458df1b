//! # GCodeScarf Core
//!
//! Core types and the error taxonomy shared by the GCodeScarf crates.
//! Provides the three-axis [`Point`] used by the machine-state interpreter
//! and the loop transform, and the fatal error types surfaced to callers.

pub mod error;
pub mod types;

pub use error::{Error, GcodeError, ParameterError, Result};
pub use types::{Axis, Point};
