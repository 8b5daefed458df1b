use gcodescarf_core::GcodeError;
use gcodescarf_gcode::{compute_safety_floor, GcodeValidator, Program};

fn program(text: &str) -> Program {
    Program::parse(text).unwrap()
}

#[test]
fn test_save_restore_position_is_prohibited() {
    let p = program("G28\nG60 S0\nG1 X1");
    let err = GcodeValidator::new().validate(&p.commands).unwrap_err();
    assert_eq!(
        err,
        GcodeError::ProhibitedCommand {
            line_number: 2,
            code: "G60".to_string()
        }
    );

    let p = program("G28\ng61 ; back");
    assert!(matches!(
        GcodeValidator::new().validate(&p.commands),
        Err(GcodeError::ProhibitedCommand { line_number: 2, .. })
    ));
}

#[test]
fn test_z_position_reset_is_prohibited() {
    let p = program("G28\nG92 X0 Z0.2");
    assert_eq!(
        GcodeValidator::new().validate(&p.commands),
        Err(GcodeError::PositionReset { line_number: 2 })
    );
}

#[test]
fn test_reset_to_native_is_prohibited() {
    let p = program("G28\nG1 Z5\nG92.1\nG1 X10 Y0 E0.5");
    assert_eq!(
        GcodeValidator::new().validate(&p.commands),
        Err(GcodeError::PositionReset { line_number: 3 })
    );
}

#[test]
fn test_trusted_homing_is_prohibited() {
    let p = program("M83\nG28 O");
    assert_eq!(
        GcodeValidator::new().validate(&p.commands),
        Err(GcodeError::TrustedHoming { line_number: 2 })
    );
}

#[test]
fn test_ordinary_program_validates() {
    let p = program("G28\nG92 E0\nG1 X1 Y1 E1\nM104 S200\n");
    assert!(GcodeValidator::new().validate(&p.commands).is_ok());
}

#[test]
fn test_floor_is_zero_above_bed() {
    let p = program("G28\nG1 Z0.3\nG1 X10 Y10 Z5");
    assert_eq!(compute_safety_floor(&p.commands).unwrap(), 0.0);
}

#[test]
fn test_floor_follows_negative_z() {
    let p = program("G28\nG1 Z-0.4\nG1 Z1");
    assert_eq!(compute_safety_floor(&p.commands).unwrap(), -0.4);
}

#[test]
fn test_floor_ignores_relative_and_unknown_positions() {
    // Before homing, and while in G91, nothing is recorded
    let p = program("G1 Z-5\nG28\nG1 Z5\nG91\nG1 Z-6\nG1 Z6\nG90\nG1 Z1");
    assert_eq!(compute_safety_floor(&p.commands).unwrap(), 0.0);
}

#[test]
fn test_floor_uses_physical_frame() {
    let p = program("G28\nG1 X5 Y5 Z2\nG92 X0 Y0\nG1 Z-0.5");
    assert_eq!(compute_safety_floor(&p.commands).unwrap(), -0.5);
}

#[test]
fn test_floor_undetermined_when_offset_unknown() {
    // G92.1 on an unhomed machine moves the unknown into the offset.
    // Validation rejects the program first; the floor pass alone cannot
    // produce a finite value for it.
    let p = program("G92.1\nG1 X1 Y1 Z1");
    assert_eq!(
        GcodeValidator::new().validate(&p.commands),
        Err(GcodeError::PositionReset { line_number: 1 })
    );
    assert!(matches!(
        compute_safety_floor(&p.commands),
        Err(GcodeError::FloorUndetermined { .. })
    ));
}
