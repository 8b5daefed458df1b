//! Whole-program scarfing pass
//!
//! Validates the program, computes the safety floor, then walks the
//! commands once. Extrusion runs go through loop detection and the taper;
//! everything else is emitted unchanged.

use serde::Serialize;
use tracing::{debug, info, warn};

use gcodescarf_core::Result;
use gcodescarf_gcode::{compute_safety_floor, Command, GcodeValidator, MachineState, Program};

use crate::taper::{loop_segments, path_length, LoopTaper, TaperOutcome};
use crate::{ExtrusionRun, ScarfParameters};

/// A loop that was left alone for a reason worth telling the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScarfNotice {
    /// Source line where the loop starts
    pub line_number: usize,
    /// What happened
    pub message: String,
}

/// Summary of one scarfing pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScarfReport {
    /// Lowest physical Z any synthesized move may reach
    pub safety_floor: f64,
    /// Extrusion runs found
    pub extrusion_runs: usize,
    /// Runs that close on themselves
    pub closed_loops: usize,
    /// Loops rewritten with a taper
    pub scarfed_loops: usize,
    /// Loops left as they were because they were too short or not rewritable
    pub skipped_loops: usize,
    /// Loops that fell back to the original commands mid-taper
    pub notices: Vec<ScarfNotice>,
}

/// Rewritten program text plus what was done to it
#[derive(Debug, Clone, PartialEq)]
pub struct ScarfOutput {
    pub gcode: String,
    pub report: ScarfReport,
}

/// Drives the scarfing pass over a program
#[derive(Debug, Clone)]
pub struct LoopScarfer {
    params: ScarfParameters,
    emit_markers: bool,
}

impl LoopScarfer {
    /// Create a scarfer with the given parameters
    pub fn new(params: ScarfParameters) -> Self {
        Self {
            params,
            emit_markers: true,
        }
    }

    /// Whether scarfed loops are bracketed by marker comments
    pub fn with_markers(mut self, emit_markers: bool) -> Self {
        self.emit_markers = emit_markers;
        self
    }

    pub fn params(&self) -> &ScarfParameters {
        &self.params
    }

    /// Rewrite program text
    pub fn process(&self, text: &str) -> Result<ScarfOutput> {
        let program = Program::parse(text)?;
        let (commands, report) = self.process_program(&program)?;
        Ok(ScarfOutput {
            gcode: program.render_commands(&commands),
            report,
        })
    }

    /// Rewrite a parsed program
    ///
    /// Fails without producing anything if the parameters are invalid, the
    /// program contains a prohibited construct, or the safety floor cannot
    /// be established.
    pub fn process_program(&self, program: &Program) -> Result<(Vec<Command>, ScarfReport)> {
        self.params.validate()?;
        let commands = &program.commands;
        GcodeValidator::new().validate(commands)?;
        let floor = compute_safety_floor(commands)?;

        let mut report = ScarfReport {
            safety_floor: floor,
            ..Default::default()
        };
        let mut output = Vec::with_capacity(commands.len());
        let mut state = MachineState::new();
        let mut index = 0;

        while index < commands.len() {
            let command = &commands[index];
            if state.would_extrude(command)? {
                let run = ExtrusionRun::extract(&state, &commands[index..])?;
                report.extrusion_runs += 1;
                let emitted = self.process_run(&run, floor, index + 1, &mut report)?;
                state = state.apply_all(&emitted)?;
                output.extend(emitted);
                index += run.len();
            } else {
                state = state.apply(command)?;
                output.push(command.clone());
                index += 1;
            }
        }

        info!(
            runs = report.extrusion_runs,
            loops = report.closed_loops,
            scarfed = report.scarfed_loops,
            skipped = report.skipped_loops,
            fallbacks = report.notices.len(),
            floor,
            "scarfing pass complete"
        );
        Ok((output, report))
    }

    /// Commands to emit in place of one extrusion run
    fn process_run(
        &self,
        run: &ExtrusionRun,
        floor: f64,
        line_number: usize,
        report: &mut ScarfReport,
    ) -> Result<Vec<Command>> {
        if !run.is_closed_loop(self.params.loop_tolerance)? {
            return Ok(run.commands.clone());
        }
        report.closed_loops += 1;

        let Some(segments) = loop_segments(&run.start, &run.commands)? else {
            debug!(line_number, "loop is not rewritable, left unchanged");
            report.skipped_loops += 1;
            return Ok(run.commands.clone());
        };

        let length = path_length(&segments);
        if length < self.params.taper_resolution {
            debug!(line_number, length, "loop too short to taper");
            report.skipped_loops += 1;
            return Ok(run.commands.clone());
        }

        let taper = LoopTaper::new(&self.params, floor).with_markers(self.emit_markers);
        match taper.apply(run, &segments)? {
            TaperOutcome::Tapered(commands) => {
                debug!(line_number, length, "loop scarfed");
                report.scarfed_loops += 1;
                Ok(commands)
            }
            TaperOutcome::FallbackToOriginal { reason } => {
                warn!(line_number, %reason, "loop left unscarfed");
                report.notices.push(ScarfNotice {
                    line_number,
                    message: reason,
                });
                Ok(run.commands.clone())
            }
        }
    }
}

/// Rewrite program text with the given parameters
pub fn scarf_gcode(text: &str, params: &ScarfParameters) -> Result<ScarfOutput> {
    LoopScarfer::new(params.clone()).process(text)
}
