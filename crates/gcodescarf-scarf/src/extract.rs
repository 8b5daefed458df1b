//! Extrusion run extraction and the closure test

use gcodescarf_core::GcodeError;
use gcodescarf_gcode::{Command, MachineState};

/// A maximal run of continuous extrusion
///
/// Starts at a command that increases cumulative extrusion and keeps every
/// following command while the machine is still extruding. Comments and
/// passthrough lines inside the run stay where they were.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrusionRun {
    /// State before the first command of the run
    pub start: MachineState,
    /// State after the last command of the run
    pub end: MachineState,
    /// The run's commands, in source order
    pub commands: Vec<Command>,
}

impl ExtrusionRun {
    /// Grow a run from the front of `commands`
    ///
    /// The first command that would stop extrusion is left unconsumed.
    pub fn extract(start: &MachineState, commands: &[Command]) -> Result<Self, GcodeError> {
        let mut state = *start;
        let mut taken = Vec::new();

        for command in commands {
            let next = state.apply(command)?;
            if !next.extruded() {
                break;
            }
            taken.push(command.clone());
            state = next;
        }

        Ok(Self {
            start: *start,
            end: state,
            commands: taken,
        })
    }

    /// Number of source commands consumed
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Whether the run ends within `tolerance` of where it started
    ///
    /// A run that starts or ends with the physical position unknown is
    /// never a loop.
    pub fn is_closed_loop(&self, tolerance: f64) -> Result<bool, GcodeError> {
        if !self.start.physical_known() {
            return Ok(false);
        }
        let end = self.start.apply_all(&self.commands)?;
        if !end.physical_known() {
            return Ok(false);
        }
        let gap = self
            .start
            .physical_position()?
            .distance_to(&end.physical_position()?);
        Ok(gap < tolerance)
    }
}
