//! Value types shared across the workspace.
//!
//! ## Modules
//!
//! - [`point`]: three-axis coordinates with the "unknown" sentinel.

pub mod point;

pub use point::{Axis, Point};
