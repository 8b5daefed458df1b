//! # GCodeScarf G-Code
//!
//! Command model, line parser and machine-state interpreter.
//!
//! This crate provides:
//! - Parsing of program lines into typed [`Command`]s and rendering them back
//! - An immutable [`MachineState`] that replays commands and tracks logical
//!   and physical position plus extrusion
//! - Program validation against instructions the scarfing pass cannot handle
//! - The safety floor: the lowest physical Z the program ever commands

pub mod command;
pub mod floor;
pub mod parser;
pub mod state;
pub mod validator;

pub use command::{Arguments, Code, Command, Instruction};
pub use floor::compute_safety_floor;
pub use parser::{parse_line, LineEnding, Program};
pub use state::{ExtrusionMode, MachineState, PositioningMode};
pub use validator::GcodeValidator;
