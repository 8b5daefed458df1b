//! Overlap and taper transform
//!
//! A confirmed loop is rewritten as:
//!
//! ```text
//! ;SCARF_LOOP_START
//! <starting taper>   extrusion 0 -> 1, Z raised from one layer down
//! <remainder>        untouched, apart from the split boundary move
//! <ending taper>     same path again, extrusion 1 -> 0, Z unchanged
//! ;SCARF_LOOP_END
//! ```
//!
//! Geometry is done in the physical frame; every synthesized move is mapped
//! back to the logical frame of the machine state it is emitted against.
//! Extrusion per move is handled as a relative amount throughout and only
//! turned into an absolute E value at emission time.

use gcodescarf_core::{GcodeError, Point};
use gcodescarf_gcode::{
    Arguments, Code, Command, ExtrusionMode, MachineState, PositioningMode,
};

use crate::{ExtrusionRun, ScarfParameters};

/// Marker comment opening a scarfed loop
pub const LOOP_START_MARKER: &str = "SCARF_LOOP_START";
/// Marker comment closing a scarfed loop
pub const LOOP_END_MARKER: &str = "SCARF_LOOP_END";

/// Moves shorter than this are treated as stationary
const MIN_SEGMENT_LENGTH: f64 = 1e-9;
/// Extrusion differences below this do not need a resync
const EXTRUSION_EPSILON: f64 = 1e-9;
/// Largest Z difference still treated as the same layer
const PLANAR_TOLERANCE: f64 = 1e-6;

/// One step of a loop in the physical frame
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// A linear move
    Move {
        /// Physical start point
        from: Point,
        /// Physical end point
        to: Point,
        /// Filament pushed along the move
        extrusion: f64,
        /// Feed rate in effect for the move
        feed_rate: Option<f64>,
    },
    /// Any non-move command, replayed as written
    Other(Command),
}

impl Segment {
    /// Path length, zero for non-moves
    pub fn length(&self) -> f64 {
        match self {
            Self::Move { from, to, .. } => from.distance_to(to),
            Self::Other(_) => 0.0,
        }
    }
}

/// Express a loop as physical segments, one per command
///
/// Returns `None` when the loop cannot be rewritten: an arc or homing
/// inside it, relative positioning anywhere in it, any step whose physical
/// position is unknown, or a change of Z along the way.
pub fn loop_segments(
    start: &MachineState,
    commands: &[Command],
) -> Result<Option<Vec<Segment>>, GcodeError> {
    if !start.physical_known() {
        return Ok(None);
    }
    let layer_z = start.physical_position()?.z;
    let mut state = *start;
    let mut segments = Vec::with_capacity(commands.len());

    for command in commands {
        let next = state.apply(command)?;
        if next.positioning() != PositioningMode::Absolute || !next.physical_known() {
            return Ok(None);
        }
        match command.code() {
            Some(code) if code.is_arc() || code == Code::Home => return Ok(None),
            Some(code) if code.is_linear() => {
                let to = next.physical_position()?;
                if (to.z - layer_z).abs() > PLANAR_TOLERANCE {
                    return Ok(None);
                }
                segments.push(Segment::Move {
                    from: state.physical_position()?,
                    to,
                    extrusion: next.logical_extrusion() - state.logical_extrusion(),
                    feed_rate: next.feed_rate(),
                });
            }
            _ => segments.push(Segment::Other(command.clone())),
        }
        state = next;
    }

    Ok(Some(segments))
}

/// Total path length of a segment list
pub fn path_length(segments: &[Segment]) -> f64 {
    segments.iter().map(Segment::length).sum()
}

/// Overlap actually applied to a loop of length `loop_length`
///
/// A loop is never asked to overlap more than a third of itself.
pub fn effective_overlap(requested: f64, loop_length: f64) -> f64 {
    requested.min(loop_length / 3.0)
}

/// A loop divided at the end of its taper section
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// Segments up to the overlap length, boundary move cut at the crossing
    pub taper: Vec<Segment>,
    /// Rest of the boundary move after the crossing point
    pub tail: Option<Segment>,
    /// Index of the first source command left untouched
    pub remainder: usize,
}

/// Cut `segments` where the accumulated path length reaches `length`
///
/// Extrusion of the boundary move is shared out in proportion to the two
/// sub-lengths. Non-moves before the boundary stay in the taper section.
pub fn split_at_length(segments: &[Segment], length: f64) -> Split {
    let mut taper = Vec::new();
    let mut travelled = 0.0;

    for (index, segment) in segments.iter().enumerate() {
        let Segment::Move {
            from,
            to,
            extrusion,
            feed_rate,
        } = segment
        else {
            taper.push(segment.clone());
            continue;
        };

        let d = segment.length();
        if d > MIN_SEGMENT_LENGTH && travelled + d >= length {
            let fraction = ((length - travelled) / d).clamp(0.0, 1.0);
            let crossing = from.lerp(to, fraction);
            taper.push(Segment::Move {
                from: *from,
                to: crossing,
                extrusion: extrusion * fraction,
                feed_rate: *feed_rate,
            });
            let tail = (fraction < 1.0).then(|| Segment::Move {
                from: crossing,
                to: *to,
                extrusion: extrusion * (1.0 - fraction),
                feed_rate: *feed_rate,
            });
            return Split {
                taper,
                tail,
                remainder: index + 1,
            };
        }

        taper.push(segment.clone());
        travelled += d;
    }

    Split {
        taper,
        tail: None,
        remainder: segments.len(),
    }
}

/// Subdivide every move longer than `resolution`
///
/// A move of length `d` becomes `ceil(d / resolution)` equal steps, each
/// carrying an equal share of the move's extrusion.
pub fn resample(segments: &[Segment], resolution: f64) -> Vec<Segment> {
    let mut resampled = Vec::with_capacity(segments.len());

    for segment in segments {
        let d = segment.length();
        match segment {
            Segment::Move {
                from,
                to,
                extrusion,
                feed_rate,
            } if d > resolution => {
                let steps = (d / resolution).ceil() as usize;
                let share = extrusion / steps as f64;
                for i in 0..steps {
                    let t0 = i as f64 / steps as f64;
                    let t1 = (i + 1) as f64 / steps as f64;
                    resampled.push(Segment::Move {
                        from: from.lerp(to, t0),
                        to: from.lerp(to, t1),
                        extrusion: share,
                        feed_rate: *feed_rate,
                    });
                }
            }
            _ => resampled.push(segment.clone()),
        }
    }

    resampled
}

/// Result of building the tapered form of one loop
#[derive(Debug, Clone, PartialEq)]
pub enum TaperOutcome {
    /// Replacement commands for the loop, markers included
    Tapered(Vec<Command>),
    /// The loop must be emitted as it was
    FallbackToOriginal {
        /// Why the taper was abandoned
        reason: String,
    },
}

/// Position along the taper section, from 0 at the first step to 1 at the last
///
/// Each step is sampled at its end point, offset by the length of the first
/// step, so the first emitted step carries no extrusion and the last one
/// carries all of it. A section of a single step has no room to ramp and
/// sits at 1.
#[derive(Debug, Clone, Copy)]
struct Ramp {
    first_step: f64,
    span: f64,
}

impl Ramp {
    fn new(section: &[Segment], overlap: f64) -> Self {
        let first_step = section
            .iter()
            .map(Segment::length)
            .find(|d| *d > MIN_SEGMENT_LENGTH)
            .unwrap_or(0.0);
        Self {
            first_step,
            span: overlap - first_step,
        }
    }

    /// `travelled` is the path length up to the end of the current step
    fn at(&self, travelled: f64) -> f64 {
        if self.span <= MIN_SEGMENT_LENGTH {
            return 1.0;
        }
        ((travelled - self.first_step) / self.span).clamp(0.0, 1.0)
    }
}

/// Emits synthesized commands while tracking the state they produce
struct Emitter {
    state: MachineState,
    output: Vec<Command>,
}

impl Emitter {
    fn new(state: MachineState) -> Self {
        Self {
            state,
            output: Vec::new(),
        }
    }

    fn push(&mut self, command: Command) -> Result<(), GcodeError> {
        self.state = self.state.apply(&command)?;
        self.output.push(command);
        Ok(())
    }

    fn current_physical(&self) -> Result<Point, GcodeError> {
        self.state.physical_position()
    }

    /// Linear move to a physical target; Z is only written when `with_z`
    fn move_to(
        &mut self,
        target: Point,
        extrusion: f64,
        feed_rate: Option<f64>,
        with_z: bool,
    ) -> Result<(), GcodeError> {
        let logical = self.state.to_logical(target);
        let mut args = Arguments::new().with('X', logical.x).with('Y', logical.y);
        if with_z {
            args.set('Z', logical.z);
        }
        let e = match self.state.extrusion_mode() {
            ExtrusionMode::Relative => extrusion,
            ExtrusionMode::Absolute => self.state.logical_extrusion() + extrusion,
        };
        args.set('E', e);
        if let Some(feed) = feed_rate {
            if self.state.feed_rate() != Some(feed) {
                args.set('F', feed);
            }
        }
        self.push(Command::instruction(Code::LinearMove, args))
    }

    /// Declare the logical extrusion the original program expects next
    ///
    /// Only absolute extrusion needs this: a taper pushes less (or more)
    /// filament than the commands it replaces.
    fn sync_extrusion(&mut self, expected: f64) -> Result<(), GcodeError> {
        if self.state.extrusion_mode() != ExtrusionMode::Absolute
            || (self.state.logical_extrusion() - expected).abs() < EXTRUSION_EPSILON
        {
            return Ok(());
        }
        self.push(Command::instruction(
            Code::SetPosition,
            Arguments::new().with('E', expected),
        ))
    }
}

/// Builds the scarfed form of closed loops
#[derive(Debug, Clone)]
pub struct LoopTaper<'a> {
    params: &'a ScarfParameters,
    floor: f64,
    emit_markers: bool,
}

impl<'a> LoopTaper<'a> {
    /// `floor` is the lowest physical Z any synthesized move may reach
    pub fn new(params: &'a ScarfParameters, floor: f64) -> Self {
        Self {
            params,
            floor,
            emit_markers: true,
        }
    }

    /// Whether to bracket the loop with marker comments
    pub fn with_markers(mut self, emit_markers: bool) -> Self {
        self.emit_markers = emit_markers;
        self
    }

    /// Rewrite a closed loop whose physical segments are `segments`
    ///
    /// `segments` must come from [`loop_segments`] over `run.commands`.
    pub fn apply(
        &self,
        run: &ExtrusionRun,
        segments: &[Segment],
    ) -> Result<TaperOutcome, GcodeError> {
        let overlap = effective_overlap(self.params.overlap, path_length(segments));
        let split = split_at_length(segments, overlap);
        let section = resample(&split.taper, self.params.taper_resolution);

        let mut emitter = Emitter::new(run.start);
        if self.emit_markers {
            emitter.push(Command::comment(LOOP_START_MARKER))?;
        }

        self.starting_taper(&mut emitter, &section, overlap)?;

        // Where the original program stands after the boundary move
        let boundary = run.start.apply_all(&run.commands[..split.remainder])?;
        match &split.tail {
            Some(Segment::Move {
                to,
                extrusion,
                feed_rate,
                ..
            }) => {
                emitter.sync_extrusion(boundary.logical_extrusion() - extrusion)?;
                let target = Point::new(to.x, to.y, to.z.max(self.floor));
                emitter.move_to(target, *extrusion, *feed_rate, true)?;
            }
            _ => emitter.sync_extrusion(boundary.logical_extrusion())?,
        }
        for command in &run.commands[split.remainder..] {
            emitter.push(command.clone())?;
        }

        if let Some(reason) = self.ending_taper(&mut emitter, &section, overlap)? {
            return Ok(TaperOutcome::FallbackToOriginal { reason });
        }
        emitter.sync_extrusion(run.end.logical_extrusion())?;

        if self.emit_markers {
            emitter.push(Command::comment(LOOP_END_MARKER))?;
        }
        Ok(TaperOutcome::Tapered(emitter.output))
    }

    /// Ramp extrusion up and Z from one layer down back to the loop height
    fn starting_taper(
        &self,
        emitter: &mut Emitter,
        section: &[Segment],
        overlap: f64,
    ) -> Result<(), GcodeError> {
        let ramp = Ramp::new(section, overlap);
        let mut travelled = 0.0;

        for segment in section {
            let d = segment.length();
            match segment {
                Segment::Other(command) => emitter.push(command.clone())?,
                // Stationary prime moves keep their full extrusion
                Segment::Move {
                    to,
                    extrusion,
                    feed_rate,
                    ..
                } if d <= MIN_SEGMENT_LENGTH => {
                    emitter.move_to(*to, *extrusion, *feed_rate, true)?;
                }
                Segment::Move {
                    to,
                    extrusion,
                    feed_rate,
                    ..
                } => {
                    travelled += d;
                    let t = ramp.at(travelled);
                    let z = (to.z - (1.0 - t) * self.params.layer_height).max(self.floor);
                    emitter.move_to(Point::new(to.x, to.y, z), extrusion * t, *feed_rate, true)?;
                }
            }
        }

        Ok(())
    }

    /// Retrace the taper section with extrusion ramping down
    ///
    /// Returns the reason for giving up if the section changes the
    /// coordinate system, since replaying it at the loop's end would move
    /// the frame a second time.
    fn ending_taper(
        &self,
        emitter: &mut Emitter,
        section: &[Segment],
        overlap: f64,
    ) -> Result<Option<String>, GcodeError> {
        let ramp = Ramp::new(section, overlap);
        let mut travelled = 0.0;

        for segment in section {
            let d = segment.length();
            match segment {
                Segment::Other(command) if command.alters_coordinate_system() => {
                    return Ok(Some(format!(
                        "coordinate system changed by '{}' inside the overlap",
                        command
                    )));
                }
                Segment::Other(command) => emitter.push(command.clone())?,
                Segment::Move { .. } if d <= MIN_SEGMENT_LENGTH => {}
                Segment::Move {
                    to,
                    extrusion,
                    feed_rate,
                    ..
                } => {
                    travelled += d;
                    let t = ramp.at(travelled);
                    let current = emitter.current_physical()?;
                    let target = Point::new(to.x, to.y, current.z);
                    emitter.move_to(target, extrusion * (1.0 - t), *feed_rate, false)?;
                }
            }
        }

        Ok(None)
    }
}
