//! # GCodeScarf Loop Scarfing
//!
//! Rewrites closed extrusion loops so the seam where an outline closes on
//! itself is blended instead of stepped.
//!
//! ## Pipeline
//!
//! - **Extraction**: maximal runs of continuous extrusion and the closure test
//! - **Taper**: overlap split by arc length, resampling, and the two tapers
//! - **Processor**: the pass over the whole program, with validation and the
//!   safety floor up front
//!
//! ```ignore
//! use gcodescarf_scarf::{scarf_gcode, ScarfParameters};
//!
//! let output = scarf_gcode(&text, &ScarfParameters::default())?;
//! println!("{} loops scarfed", output.report.scarfed_loops);
//! ```

pub mod extract;
pub mod params;
pub mod processor;
pub mod taper;

pub use extract::ExtrusionRun;
pub use params::ScarfParameters;
pub use processor::{scarf_gcode, LoopScarfer, ScarfNotice, ScarfOutput, ScarfReport};
pub use taper::{
    effective_overlap, loop_segments, path_length, resample, split_at_length, LoopTaper, Segment,
    Split, TaperOutcome, LOOP_END_MARKER, LOOP_START_MARKER,
};
