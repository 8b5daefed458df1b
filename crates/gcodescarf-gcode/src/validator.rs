//! Program validation
//!
//! Rejects programs the scarfing pass cannot rewrite safely. Runs before any
//! transform so a rejected program produces no output at all.

use gcodescarf_core::GcodeError;
use tracing::debug;

use super::{Code, Command};

/// Save/restore position. Restoring would jump back across a rewritten loop.
pub const PROHIBITED_CODES: [&str; 2] = ["G60", "G61"];

/// Checks a parsed program for unsupported constructs
#[derive(Debug, Default)]
pub struct GcodeValidator;

impl GcodeValidator {
    pub fn new() -> Self {
        Self
    }

    /// Fail on the first unsupported construct
    ///
    /// `commands[i]` is taken to come from line `i + 1`.
    pub fn validate(&self, commands: &[Command]) -> Result<(), GcodeError> {
        for (index, command) in commands.iter().enumerate() {
            self.validate_command(command, index + 1)?;
        }
        debug!(lines = commands.len(), "program validated");
        Ok(())
    }

    /// Check one command
    pub fn validate_command(&self, command: &Command, line_number: usize) -> Result<(), GcodeError> {
        if let Some(token) = command.passthrough_token() {
            if PROHIBITED_CODES.contains(&token.as_str()) {
                return Err(GcodeError::ProhibitedCommand {
                    line_number,
                    code: token,
                });
            }
            return Ok(());
        }

        match (command.code(), command.args()) {
            (Some(Code::SetPosition), Some(args)) if args.contains('Z') => {
                Err(GcodeError::PositionReset { line_number })
            }
            // Declares Z0 without writing it
            (Some(Code::ResetPosition), _) => Err(GcodeError::PositionReset { line_number }),
            (Some(Code::Home), Some(args)) if args.contains('O') => {
                Err(GcodeError::TrustedHoming { line_number })
            }
            _ => Ok(()),
        }
    }
}
