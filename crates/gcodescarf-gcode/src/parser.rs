//! G-Code line parser
//!
//! Splits program text into lines and each line into a [`Command`].
//! Line endings and the final newline are remembered so the rewritten
//! program comes back in the same shape it went in.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use gcodescarf_core::GcodeError;

use super::{Arguments, Code, Command, Instruction};

/// Line terminator used when rendering a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    /// CRLF if the text contains any, LF otherwise
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            Self::CrLf
        } else {
            Self::Lf
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// A parsed program: one command per input line
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Commands in source order; index `i` came from line `i + 1`
    pub commands: Vec<Command>,
    /// Terminator found in the source
    pub line_ending: LineEnding,
    /// Whether the source ended with a terminator
    pub trailing_newline: bool,
}

impl Program {
    /// Parse a whole program
    pub fn parse(text: &str) -> Result<Self, GcodeError> {
        let line_ending = LineEnding::detect(text);
        let trailing_newline = text.ends_with('\n');
        let body = if trailing_newline {
            &text[..text.len() - 1]
        } else {
            text
        };

        let commands = body
            .split('\n')
            .enumerate()
            .map(|(i, line)| {
                let line = line.strip_suffix('\r').unwrap_or(line);
                parse_line(line, i + 1)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            commands,
            line_ending,
            trailing_newline,
        })
    }

    /// Render a command list with this program's line shape
    pub fn render_commands(&self, commands: &[Command]) -> String {
        let separator = self.line_ending.as_str();
        let mut text = commands
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(separator);
        if self.trailing_newline {
            text.push_str(separator);
        }
        text
    }

    /// Render this program's own commands
    pub fn render(&self) -> String {
        self.render_commands(&self.commands)
    }
}

fn argument_regex() -> &'static Regex {
    static ARGUMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    ARGUMENT_REGEX.get_or_init(|| {
        Regex::new(r"^([A-Za-z])([-+]?(?:\d+(?:\.\d*)?|\.\d+))?$").expect("invalid regex pattern")
    })
}

/// Parse a single line
///
/// A leading `;` makes a full-line comment. Otherwise the first token is
/// looked up in the recognized code set; anything unrecognized (including
/// blank lines and vendor instructions) is passed through verbatim. A bare
/// argument letter such as `G28 X` is read as zero.
pub fn parse_line(line: &str, line_number: usize) -> Result<Command, GcodeError> {
    if let Some(text) = line.strip_prefix(';') {
        return Ok(Command::Comment(text.to_string()));
    }

    let (code_part, comment) = match line.split_once(';') {
        Some((code_part, comment)) => (code_part, Some(comment.to_string())),
        None => (line, None),
    };

    let mut tokens = code_part.split_whitespace();
    let Some(code) = tokens.next().and_then(Code::from_token) else {
        return Ok(Command::Passthrough(line.to_string()));
    };

    let mut args = Arguments::new();
    for token in tokens {
        let caps = argument_regex()
            .captures(token)
            .ok_or_else(|| GcodeError::InvalidSyntax {
                line_number,
                reason: format!("malformed argument '{}' for {}", token, code),
            })?;
        let letter = caps[1].chars().next().ok_or_else(|| GcodeError::InvalidSyntax {
            line_number,
            reason: format!("missing argument letter in '{}'", token),
        })?;
        let value = match caps.get(2) {
            Some(number) => {
                number
                    .as_str()
                    .parse::<f64>()
                    .map_err(|e| GcodeError::InvalidSyntax {
                        line_number,
                        reason: format!("bad number in '{}': {}", token, e),
                    })?
            }
            None => 0.0,
        };
        args.set(letter, value);
    }

    Ok(Command::Recognized(Instruction {
        code,
        args,
        comment,
    }))
}
