//! Machine state interpreter
//!
//! [`MachineState`] is a plain `Copy` value. [`MachineState::apply`] returns
//! the state after a command and never touches the receiver, so any number
//! of speculative continuations can branch off one snapshot.
//!
//! Two frames are tracked:
//! - the *logical* frame, what the controller itself reports
//! - the *physical* frame, logical shifted by the offset accumulated from
//!   G92/G28, i.e. where the head really is
//!
//! Unknown coordinates use the `f64::INFINITY` sentinel from
//! [`Point`]. Relative moves on an unknown axis keep it unknown, and
//! [`MachineState::physical_position`] refuses to answer until all three
//! axes are known.

use serde::{Deserialize, Serialize};

use gcodescarf_core::{Axis, GcodeError, Point};

use super::{Code, Command, Instruction};

/// Positioning mode for X/Y/Z (G90/G91)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositioningMode {
    /// G90
    #[default]
    Absolute,
    /// G91
    Relative,
}

/// Extrusion accounting mode (M82/M83), independent of positioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtrusionMode {
    /// M82
    Absolute,
    /// M83
    #[default]
    Relative,
}

/// Snapshot of the printer after some prefix of the program
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineState {
    positioning: PositioningMode,
    extrusion_mode: ExtrusionMode,
    /// Position in the controller's own frame
    position: Point,
    /// physical = logical + offset
    offset: Point,
    /// Cumulative extrusion in the controller's frame
    extrusion: f64,
    /// physical extrusion = logical + offset
    extrusion_offset: f64,
    feed_rate: Option<f64>,
    /// Whether the last motion command increased cumulative extrusion
    extruded: bool,
}

impl Default for MachineState {
    fn default() -> Self {
        Self {
            positioning: PositioningMode::Absolute,
            extrusion_mode: ExtrusionMode::Relative,
            position: Point::unknown(),
            offset: Point::zero(),
            extrusion: 0.0,
            extrusion_offset: 0.0,
            feed_rate: None,
            extruded: false,
        }
    }
}

impl MachineState {
    /// Controller at power-on: position unknown, no extrusion, G90, M83
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positioning(&self) -> PositioningMode {
        self.positioning
    }

    pub fn extrusion_mode(&self) -> ExtrusionMode {
        self.extrusion_mode
    }

    /// Logical position; axes may be unknown
    pub fn logical_position(&self) -> Point {
        self.position
    }

    /// Offset from the logical to the physical frame
    pub fn offset(&self) -> Point {
        self.offset
    }

    /// True once all three logical axes are known
    pub fn position_known(&self) -> bool {
        self.position.is_known()
    }

    /// True once the physical position is fully established
    ///
    /// A G92 on an axis that was never homed makes the logical coordinate
    /// known but leaves the offset unknown.
    pub fn physical_known(&self) -> bool {
        self.position.is_known() && (self.position + self.offset).is_known()
    }

    /// Physical position of the head
    ///
    /// Asking while any logical axis is unknown means the program structure
    /// is unsupported (no homing, or an arc never followed by an absolute
    /// move); that is reported as [`GcodeError::UnknownPosition`].
    pub fn physical_position(&self) -> Result<Point, GcodeError> {
        if !self.position.is_known() {
            return Err(GcodeError::UnknownPosition);
        }
        let physical = self.position + self.offset;
        if !physical.is_known() {
            return Err(GcodeError::UnknownPosition);
        }
        Ok(physical)
    }

    /// Logical coordinates that reach `physical` under the current offset
    pub fn to_logical(&self, physical: Point) -> Point {
        physical - self.offset
    }

    /// Cumulative extrusion in the controller's frame
    pub fn logical_extrusion(&self) -> f64 {
        self.extrusion
    }

    /// Cumulative extrusion including every G92 E reset
    pub fn physical_extrusion(&self) -> f64 {
        self.extrusion + self.extrusion_offset
    }

    /// Last commanded feed rate
    pub fn feed_rate(&self) -> Option<f64> {
        self.feed_rate
    }

    /// Whether the most recent motion command pushed filament
    pub fn extruded(&self) -> bool {
        self.extruded
    }

    /// Whether applying `command` would start or continue an extrusion run
    pub fn would_extrude(&self, command: &Command) -> Result<bool, GcodeError> {
        if !command.is_motion() {
            return Ok(false);
        }
        Ok(self.apply(command)?.extruded)
    }

    /// State after executing `command`
    ///
    /// Comments and passthrough lines leave the state untouched.
    pub fn apply(&self, command: &Command) -> Result<Self, GcodeError> {
        match command {
            Command::Recognized(instruction) => self.apply_instruction(instruction),
            Command::Comment(_) | Command::Passthrough(_) => Ok(*self),
        }
    }

    /// Fold a sequence of commands
    pub fn apply_all<'a>(
        &self,
        commands: impl IntoIterator<Item = &'a Command>,
    ) -> Result<Self, GcodeError> {
        commands
            .into_iter()
            .try_fold(*self, |state, command| state.apply(command))
    }

    fn apply_instruction(&self, instruction: &Instruction) -> Result<Self, GcodeError> {
        let mut next = *self;
        let args = &instruction.args;

        match instruction.code {
            Code::RapidMove | Code::LinearMove => {
                for axis in Axis::ALL {
                    next.position = next.moved(axis, args.axis(axis));
                }
                next.apply_motion_common(self, instruction);
            }
            Code::ArcClockwise | Code::ArcCounterClockwise => {
                // The arc endpoint needs the full arc geometry; give up on X/Y.
                // Arcs stay in the XY plane, so Z is not touched.
                next.position.x = Point::UNKNOWN;
                next.position.y = Point::UNKNOWN;
                next.apply_motion_common(self, instruction);
            }
            Code::Home => {
                if args.contains('O') {
                    return Err(GcodeError::TrustedHoming { line_number: 0 });
                }
                let home_all = !args.has_any_axis();
                for axis in Axis::ALL {
                    if home_all || args.axis(axis).is_some() {
                        next.position = next.position.with(axis, 0.0);
                        next.offset = next.offset.with(axis, 0.0);
                    }
                }
            }
            Code::AbsolutePositioning => next.positioning = PositioningMode::Absolute,
            Code::RelativePositioning => next.positioning = PositioningMode::Relative,
            Code::SetPosition => {
                for axis in Axis::ALL {
                    if let Some(declared) = args.axis(axis) {
                        next.declare_axis(axis, declared);
                    }
                }
                if let Some(declared) = args.get('E') {
                    next.extrusion_offset -= declared - next.extrusion;
                    next.extrusion = declared;
                }
            }
            Code::ResetPosition => {
                for axis in Axis::ALL {
                    next.declare_axis(axis, 0.0);
                }
            }
            Code::AbsoluteExtrusion => next.extrusion_mode = ExtrusionMode::Absolute,
            Code::RelativeExtrusion => next.extrusion_mode = ExtrusionMode::Relative,
        }

        Ok(next)
    }

    /// Logical position after moving `axis` by an optional argument
    fn moved(&self, axis: Axis, value: Option<f64>) -> Point {
        let current = self.position.get(axis);
        let target = match self.positioning {
            PositioningMode::Absolute => value.unwrap_or(current),
            PositioningMode::Relative => current + value.unwrap_or(0.0),
        };
        self.position.with(axis, target)
    }

    /// Extrusion, feed rate and the extruded flag, shared by every motion
    fn apply_motion_common(&mut self, before: &Self, instruction: &Instruction) {
        let e = instruction.args.get('E');
        self.extrusion = match self.extrusion_mode {
            ExtrusionMode::Absolute => e.unwrap_or(before.extrusion),
            ExtrusionMode::Relative => before.extrusion + e.unwrap_or(0.0),
        };
        if let Some(feed) = instruction.args.get('F') {
            self.feed_rate = Some(feed);
        }
        self.extruded = self.extrusion > before.extrusion;
    }

    /// Keep the physical position, make the logical coordinate `declared`
    fn declare_axis(&mut self, axis: Axis, declared: f64) {
        let logical = self.position.get(axis);
        let offset = self.offset.get(axis) - (declared - logical);
        self.offset = self.offset.with(axis, offset);
        self.position = self.position.with(axis, declared);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_line;

    fn run(lines: &[&str]) -> MachineState {
        lines.iter().enumerate().fold(MachineState::new(), |state, (i, line)| {
            state.apply(&parse_line(line, i + 1).unwrap()).unwrap()
        })
    }

    #[test]
    fn power_on_defaults() {
        let state = MachineState::new();
        assert!(!state.position_known());
        assert_eq!(state.positioning(), PositioningMode::Absolute);
        assert_eq!(state.extrusion_mode(), ExtrusionMode::Relative);
        assert_eq!(state.physical_position(), Err(GcodeError::UnknownPosition));
    }

    #[test]
    fn partial_home_only_touches_named_axes() {
        let state = run(&["G28 X"]);
        let p = state.logical_position();
        assert_eq!(p.x, 0.0);
        assert!(!p.y.is_finite());
        assert!(!p.z.is_finite());
    }

    #[test]
    fn arc_forgets_xy_but_keeps_z() {
        let state = run(&["G28", "G1 X5 Y5 Z1", "G2 X6 Y6 Z3 I1 J0"]);
        let p = state.logical_position();
        assert!(!p.x.is_finite());
        assert!(!p.y.is_finite());
        assert_eq!(p.z, 1.0);
    }

    #[test]
    fn absolute_move_recovers_after_arc() {
        let state = run(&["G28", "G2 X6 Y6 I1 J0", "G1 X1 Y2"]);
        assert_eq!(state.physical_position().unwrap(), Point::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn relative_positioning_adds() {
        let state = run(&["G28", "G91", "G1 X2 Y-1", "G1 X2"]);
        assert_eq!(state.logical_position(), Point::new(4.0, -1.0, 0.0));
    }

    #[test]
    fn extrusion_modes_are_independent() {
        let state = run(&["G28", "G91", "M82", "G1 X1 E5", "G1 X1 E7"]);
        assert_eq!(state.logical_extrusion(), 7.0);
        assert!(state.extruded());
        let state = state.apply(&parse_line("G1 X1 E6", 1).unwrap()).unwrap();
        assert!(!state.extruded());
    }

    #[test]
    fn non_motion_keeps_extruded_flag() {
        let state = run(&["G28", "G1 X1 E1", "; note", "M106 S255"]);
        assert!(state.extruded());
    }

    #[test]
    fn home_with_o_is_rejected() {
        let state = MachineState::new();
        let cmd = parse_line("G28 O", 1).unwrap();
        assert!(matches!(
            state.apply(&cmd),
            Err(GcodeError::TrustedHoming { .. })
        ));
    }

    #[test]
    fn reset_to_native_declares_zero() {
        let state = run(&["G28", "G1 X3 Y4 Z5", "G92.1"]);
        assert_eq!(state.logical_position(), Point::zero());
        assert_eq!(state.physical_position().unwrap(), Point::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn declare_before_homing_leaves_physical_unknown() {
        let state = run(&["G92 X0 Y0", "G1 Z0.2"]);
        assert!(state.position_known());
        assert!(!state.physical_known());
        assert_eq!(state.physical_position(), Err(GcodeError::UnknownPosition));
    }

    #[test]
    fn apply_does_not_mutate_receiver() {
        let base = run(&["G28"]);
        let copy = base;
        let _ = base.apply(&parse_line("G1 X10 E1", 1).unwrap()).unwrap();
        assert_eq!(base, copy);
    }
}
