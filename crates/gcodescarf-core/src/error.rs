//! Error handling for GCodeScarf
//!
//! Provides the error types for every fatal condition the scarfing pass can
//! hit:
//! - G-Code errors (syntax, prohibited instructions, unknown machine state)
//! - Parameter errors (tuning values that cannot drive the transform)
//!
//! Recoverable conditions never show up here; they are reported as notices
//! by the transform itself.

use thiserror::Error;

/// G-Code error type
///
/// Represents a program that cannot be rewritten safely. Line numbers are
/// 1-based and refer to the input text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GcodeError {
    /// A recognized instruction carried an argument that is not `<letter><number>`
    #[error("Invalid syntax at line {line_number}: {reason}")]
    InvalidSyntax {
        /// The line number where the syntax error occurred.
        line_number: usize,
        /// The reason for the syntax error.
        reason: String,
    },

    /// Save/restore position instructions are never allowed
    #[error("Prohibited instruction {code} at line {line_number}")]
    ProhibitedCommand {
        /// The line number of the instruction.
        line_number: usize,
        /// The instruction code as written.
        code: String,
    },

    /// G92 declaring the Z coordinate
    #[error("Position reset of Z at line {line_number} is not supported")]
    PositionReset {
        /// The line number of the instruction.
        line_number: usize,
    },

    /// G28 with the `O` (home only if untrusted) argument
    #[error("Homing with trusted-axis semantics at line {line_number} is not supported")]
    TrustedHoming {
        /// The line number of the instruction, 0 when replaying synthetic code.
        line_number: usize,
    },

    /// Physical position requested while the logical position is unknown
    #[error("Physical position queried while the machine position is unknown")]
    UnknownPosition,

    /// The lowest commanded Z could not be established
    #[error("Safety floor could not be determined (computed {value})")]
    FloorUndetermined {
        /// The non-finite value that was computed.
        value: f64,
    },
}

/// Errors related to tuning parameter validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// A parameter value is outside its valid range.
    #[error("Parameter '{name}' out of range: {value} (must be greater than {min})")]
    OutOfRange {
        /// The parameter name.
        name: String,
        /// The rejected value.
        value: f64,
        /// The exclusive lower bound.
        min: f64,
    },

    /// A parameter value is not a usable number.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue {
        /// The parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Main error type for GCodeScarf
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// G-Code error
    #[error(transparent)]
    Gcode(#[from] GcodeError),

    /// Parameter error
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a G-Code error
    pub fn is_gcode_error(&self) -> bool {
        matches!(self, Error::Gcode(_))
    }

    /// Check if this is a parameter error
    pub fn is_parameter_error(&self) -> bool {
        matches!(self, Error::Parameter(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
