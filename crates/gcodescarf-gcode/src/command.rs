//! G-Code command types
//!
//! A program line is one of three things: an instruction from the fixed set
//! the interpreter understands, a full-line comment, or anything else, which
//! is carried through byte for byte. Vendor instructions are deliberately
//! left opaque so their argument grammars are never misread.

use std::fmt;

use gcodescarf_core::Axis;

/// Instruction codes the interpreter tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    /// G0 - rapid move
    RapidMove,
    /// G1 - linear move
    LinearMove,
    /// G2 - clockwise arc
    ArcClockwise,
    /// G3 - counter-clockwise arc
    ArcCounterClockwise,
    /// G28 - home axes
    Home,
    /// G90 - absolute positioning
    AbsolutePositioning,
    /// G91 - relative positioning
    RelativePositioning,
    /// G92 - declare the current position
    SetPosition,
    /// G92.1 - reset to native coordinates, declares X0 Y0 Z0
    ResetPosition,
    /// M82 - absolute extrusion
    AbsoluteExtrusion,
    /// M83 - relative extrusion
    RelativeExtrusion,
}

impl Code {
    /// Match an instruction token such as `G1`, `g01` or `G92.1`
    pub fn from_token(token: &str) -> Option<Self> {
        let mut chars = token.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let number = chars.as_str();
        let (major, minor) = match number.split_once('.') {
            Some((major, minor)) => (major, Some(minor)),
            None => (number, None),
        };
        if major.is_empty() || !major.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let major: u32 = major.parse().ok()?;
        let minor: Option<u32> = match minor {
            Some(m) if !m.is_empty() && m.bytes().all(|b| b.is_ascii_digit()) => {
                Some(m.parse().ok()?)
            }
            Some(_) => return None,
            None => None,
        };

        match (letter, major, minor) {
            ('G', 0, None) => Some(Self::RapidMove),
            ('G', 1, None) => Some(Self::LinearMove),
            ('G', 2, None) => Some(Self::ArcClockwise),
            ('G', 3, None) => Some(Self::ArcCounterClockwise),
            ('G', 28, None) => Some(Self::Home),
            ('G', 90, None) => Some(Self::AbsolutePositioning),
            ('G', 91, None) => Some(Self::RelativePositioning),
            ('G', 92, None) => Some(Self::SetPosition),
            ('G', 92, Some(1)) => Some(Self::ResetPosition),
            ('M', 82, None) => Some(Self::AbsoluteExtrusion),
            ('M', 83, None) => Some(Self::RelativeExtrusion),
            _ => None,
        }
    }

    /// Canonical text of the code
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RapidMove => "G0",
            Self::LinearMove => "G1",
            Self::ArcClockwise => "G2",
            Self::ArcCounterClockwise => "G3",
            Self::Home => "G28",
            Self::AbsolutePositioning => "G90",
            Self::RelativePositioning => "G91",
            Self::SetPosition => "G92",
            Self::ResetPosition => "G92.1",
            Self::AbsoluteExtrusion => "M82",
            Self::RelativeExtrusion => "M83",
        }
    }

    /// G0 or G1
    pub fn is_linear(self) -> bool {
        matches!(self, Self::RapidMove | Self::LinearMove)
    }

    /// G2 or G3
    pub fn is_arc(self) -> bool {
        matches!(self, Self::ArcClockwise | Self::ArcCounterClockwise)
    }

    /// Any instruction that moves the head
    pub fn is_motion(self) -> bool {
        self.is_linear() || self.is_arc()
    }

    /// Instructions that change how coordinates map onto the machine
    pub fn alters_coordinate_system(self) -> bool {
        matches!(
            self,
            Self::Home
                | Self::AbsolutePositioning
                | Self::RelativePositioning
                | Self::SetPosition
                | Self::ResetPosition
        )
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Letter-keyed numeric arguments, in the order they were first written.
/// Setting a letter that is already present replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Vec<(char, f64)>);

impl Arguments {
    /// Empty argument list
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, letter: char, value: f64) -> Self {
        self.set(letter, value);
        self
    }

    /// Insert or replace an argument
    pub fn set(&mut self, letter: char, value: f64) {
        let letter = letter.to_ascii_uppercase();
        match self.0.iter_mut().find(|(l, _)| *l == letter) {
            Some(slot) => slot.1 = value,
            None => self.0.push((letter, value)),
        }
    }

    /// Value of an argument
    pub fn get(&self, letter: char) -> Option<f64> {
        let letter = letter.to_ascii_uppercase();
        self.0.iter().find(|(l, _)| *l == letter).map(|(_, v)| *v)
    }

    /// Whether an argument is present
    pub fn contains(&self, letter: char) -> bool {
        self.get(letter).is_some()
    }

    /// Value for a main axis
    pub fn axis(&self, axis: Axis) -> Option<f64> {
        self.get(axis.letter())
    }

    /// True if any of X, Y or Z is present
    pub fn has_any_axis(&self) -> bool {
        Axis::ALL.iter().any(|a| self.contains(a.letter()))
    }

    /// Iterate in written order
    pub fn iter(&self) -> impl Iterator<Item = (char, f64)> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// A recognized instruction with its arguments and optional trailing comment
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Instruction code
    pub code: Code,
    /// Numeric arguments
    pub args: Arguments,
    /// Text after `;`, without the semicolon
    pub comment: Option<String>,
}

impl Instruction {
    /// Create an instruction without a comment
    pub fn new(code: Code, args: Arguments) -> Self {
        Self {
            code,
            args,
            comment: None,
        }
    }
}

/// One program line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// An instruction the interpreter tracks
    Recognized(Instruction),
    /// A full-line comment, text after the leading `;`
    Comment(String),
    /// Any other line, kept verbatim
    Passthrough(String),
}

impl Command {
    /// Shorthand for a recognized instruction
    pub fn instruction(code: Code, args: Arguments) -> Self {
        Self::Recognized(Instruction::new(code, args))
    }

    /// Shorthand for a full-line comment
    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment(text.into())
    }

    /// The instruction code, if recognized
    pub fn code(&self) -> Option<Code> {
        match self {
            Self::Recognized(instruction) => Some(instruction.code),
            _ => None,
        }
    }

    /// Arguments of a recognized instruction
    pub fn args(&self) -> Option<&Arguments> {
        match self {
            Self::Recognized(instruction) => Some(&instruction.args),
            _ => None,
        }
    }

    pub fn is_motion(&self) -> bool {
        self.code().is_some_and(Code::is_motion)
    }

    pub fn is_linear_move(&self) -> bool {
        self.code().is_some_and(Code::is_linear)
    }

    pub fn alters_coordinate_system(&self) -> bool {
        self.code().is_some_and(Code::alters_coordinate_system)
    }

    /// Leading instruction token of a passthrough line, upper-cased
    ///
    /// Used to spot instructions that are not tracked but still matter,
    /// such as save/restore position.
    pub fn passthrough_token(&self) -> Option<String> {
        match self {
            Self::Passthrough(text) => {
                let code = text.split(';').next().unwrap_or_default();
                code.split_whitespace().next().map(str::to_ascii_uppercase)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recognized(instruction) => {
                f.write_str(instruction.code.as_str())?;
                for (letter, value) in instruction.args.iter() {
                    write!(f, " {}{}", letter, format_argument(letter, value))?;
                }
                if let Some(comment) = &instruction.comment {
                    write!(f, " ;{}", comment)?;
                }
                Ok(())
            }
            Self::Comment(text) => write!(f, ";{}", text),
            Self::Passthrough(text) => f.write_str(text),
        }
    }
}

/// Decimal places used when rendering an argument
///
/// Matches controller resolution: three places for lengths (including arc
/// centre offsets and radius), five for extrusion, none for anything else.
pub fn argument_precision(letter: char) -> usize {
    match letter.to_ascii_uppercase() {
        'X' | 'Y' | 'Z' | 'I' | 'J' | 'K' | 'R' => 3,
        'E' => 5,
        _ => 0,
    }
}

fn format_argument(letter: char, value: f64) -> String {
    let precision = argument_precision(letter);
    let text = format!("{:.*}", precision, value);
    // "-0.000" reads as a sign error to anyone checking the output
    match text.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => text,
    }
}
