use gcodescarf_gcode::{Command, MachineState, Program};
use gcodescarf_scarf::{
    effective_overlap, loop_segments, path_length, scarf_gcode, split_at_length, ScarfParameters,
};
use proptest::prelude::*;

/// Homed square loop printed at `z`, relative extrusion
fn square(side: f64, z: f64) -> String {
    format!(
        "G28\nM83\nG1 Z{z} F3000\nG1 X0 Y0\n\
         G1 X{side} Y0 E0.5 F1200\nG1 X{side} Y{side} E0.5\n\
         G1 X0 Y{side} E0.5\nG1 X0 Y0 E0.5\nG1 Z{lift}\n",
        side = side,
        z = z,
        lift = z + 1.0
    )
}

proptest! {
    #[test]
    fn overlap_never_exceeds_a_third(requested in 0.01f64..100.0, length in 0.01f64..1000.0) {
        let overlap = effective_overlap(requested, length);
        prop_assert!(overlap <= requested);
        prop_assert!(overlap <= length / 3.0 + 1e-12);
    }

    #[test]
    fn taper_section_has_the_effective_overlap(side in 0.5f64..50.0, requested in 0.1f64..20.0) {
        let text = square(side, 0.2);
        let commands = Program::parse(&text).unwrap().commands;
        let start = MachineState::new().apply_all(&commands[..4]).unwrap();

        let segments = loop_segments(&start, &commands[4..8]).unwrap().unwrap();
        let length = path_length(&segments);
        prop_assert!((length - 4.0 * side).abs() < 1e-9);

        let overlap = effective_overlap(requested, length);
        let split = split_at_length(&segments, overlap);
        prop_assert!((path_length(&split.taper) - overlap).abs() < 1e-9);
    }

    #[test]
    fn synthesized_z_never_goes_below_the_floor(
        side in 2.0f64..30.0,
        z in 0.05f64..0.6,
        layer_height in 0.05f64..1.5,
        overlap in 0.5f64..10.0,
    ) {
        let params = ScarfParameters {
            layer_height,
            overlap,
            loop_tolerance: 0.1,
            taper_resolution: 0.4,
        };
        let output = scarf_gcode(&square(side, z), &params).unwrap();
        prop_assert_eq!(output.report.scarfed_loops, 1);

        let floor = output.report.safety_floor;
        for command in Program::parse(&output.gcode).unwrap().commands {
            if let Some(value) = command.args().and_then(|a| a.get('Z')) {
                prop_assert!(value >= floor, "{} below floor {}", command, floor);
            }
        }
    }

    #[test]
    fn unrelated_lines_pass_through(text in "[A-Z]?[a-z ]{0,12}") {
        let commands = Program::parse(&text).unwrap().commands;
        prop_assume!(commands.iter().all(|c| matches!(c, Command::Passthrough(_))));
        let output = scarf_gcode(&text, &ScarfParameters::default()).unwrap();
        prop_assert_eq!(output.gcode, text);
    }
}
