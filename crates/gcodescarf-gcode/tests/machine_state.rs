use gcodescarf_core::{GcodeError, Point};
use gcodescarf_gcode::{parse_line, MachineState};
use proptest::prelude::*;

fn apply(state: MachineState, line: &str) -> MachineState {
    state.apply(&parse_line(line, 1).unwrap()).unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_position_reset_after_move() {
    let state = apply(MachineState::new(), "G28");
    let state = apply(state, "G0 X10 Y10 Z10");
    let before = state.physical_position().unwrap();

    let state = apply(state, "G92 X11 Y5");

    assert_eq!(state.logical_position(), Point::new(11.0, 5.0, 10.0));
    assert_eq!(state.physical_position().unwrap(), before);
}

#[test]
fn test_to_logical_inverts_offset() {
    let state = apply(MachineState::new(), "G28");
    let state = apply(state, "G0 X10 Y10 Z10");
    let state = apply(state, "G92 X0 Y0");
    let target = Point::new(12.0, 13.0, 10.0);
    assert_eq!(state.to_logical(target), Point::new(2.0, 3.0, 10.0));
}

#[test]
fn test_home_clears_offset() {
    let state = apply(MachineState::new(), "G28");
    let state = apply(state, "G0 X10 Y10");
    let state = apply(state, "G92 X0 Y0");
    let state = apply(state, "G28 X");
    assert_eq!(state.offset().x, 0.0);
    assert_eq!(state.offset().y, 10.0);
}

#[test]
fn test_unknown_until_homed() {
    let state = apply(MachineState::new(), "G1 X1 Y1");
    assert_eq!(state.physical_position(), Err(GcodeError::UnknownPosition));
}

#[test]
fn test_extrusion_reset_keeps_physical_extrusion() {
    let state = apply(MachineState::new(), "M82");
    let state = apply(state, "G28");
    let state = apply(state, "G1 X5 E3.5");
    let state = apply(state, "G92 E0");
    assert_eq!(state.logical_extrusion(), 0.0);
    assert!(close(state.physical_extrusion(), 3.5));

    let state = apply(state, "G1 X6 E1");
    assert!(close(state.physical_extrusion(), 4.5));
}

proptest! {
    #[test]
    fn prop_position_reset_algebra(
        x in -200.0..200.0f64,
        y in -200.0..200.0f64,
        z in 0.0..200.0f64,
        nx in -200.0..200.0f64,
        ny in -200.0..200.0f64,
    ) {
        let state = apply(MachineState::new(), "G28");
        let state = apply(state, &format!("G1 X{x:.4} Y{y:.4} Z{z:.4}"));
        let before = state.physical_position().unwrap();
        let state = apply(state, &format!("G92 X{nx:.4} Y{ny:.4}"));
        let after = state.physical_position().unwrap();
        let logical = state.logical_position();

        prop_assert!(close(after.x, before.x));
        prop_assert!(close(after.y, before.y));
        prop_assert!(close(after.z, before.z));
        prop_assert_eq!(logical.x, format!("{nx:.4}").parse::<f64>().unwrap());
        prop_assert_eq!(logical.y, format!("{ny:.4}").parse::<f64>().unwrap());
    }

    #[test]
    fn prop_extrusion_reset_algebra(
        moves in proptest::collection::vec(0.0..5.0f64, 1..8),
        declared in -10.0..10.0f64,
    ) {
        let mut state = apply(MachineState::new(), "G28");
        for (i, e) in moves.iter().enumerate() {
            state = apply(state, &format!("G1 X{} E{e:.5}", i + 1));
        }
        let before = state.physical_extrusion();
        let state = apply(state, &format!("G92 E{declared:.5}"));
        prop_assert!(close(state.physical_extrusion(), before));
        prop_assert_eq!(
            state.logical_extrusion(),
            format!("{declared:.5}").parse::<f64>().unwrap()
        );
    }
}
