//! Safety floor analysis
//!
//! One dry run over the whole program, recording the lowest physical Z the
//! program reaches while the position is known and moves are absolute.
//! The floor starts at zero and only ever goes down, so a program that stays
//! above the bed is floored at the bed. Synthesized Z values are clamped to
//! this floor.

use gcodescarf_core::GcodeError;
use tracing::debug;

use super::{Command, MachineState, PositioningMode};

/// Lowest Z the rewritten program may command
pub fn compute_safety_floor(commands: &[Command]) -> Result<f64, GcodeError> {
    let mut state = MachineState::new();
    let mut floor = 0.0_f64;

    for command in commands {
        state = state.apply(command)?;
        if state.positioning() != PositioningMode::Absolute || !state.position_known() {
            continue;
        }
        let z = state.logical_position().z + state.offset().z;
        if !z.is_finite() {
            return Err(GcodeError::FloorUndetermined { value: z });
        }
        if z < floor {
            floor = z;
        }
    }

    debug!(floor, "safety floor computed");
    Ok(floor)
}
