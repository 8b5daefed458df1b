//! # GCodeScarf
//!
//! Hides the Z seam of FDM prints by rewriting every closed extrusion loop
//! so that its start ramps up from one layer down and its end retraces the
//! start while the extrusion fades out.
//!
//! ## Architecture
//!
//! GCodeScarf is organized as a workspace with multiple crates:
//!
//! 1. **gcodescarf-core** - Point type and error taxonomy
//! 2. **gcodescarf-gcode** - Line parser, machine state, validation, safety floor
//! 3. **gcodescarf-scarf** - Loop extraction, taper transform, orchestrator
//! 4. **gcodescarf-settings** - JSON/TOML settings files
//! 5. **gcodescarf** - Command-line driver

pub mod cli;

use anyhow::Context;
use std::io::Write;
use tracing::info;

pub use cli::Cli;
pub use gcodescarf_core::{Error, GcodeError, ParameterError};
pub use gcodescarf_gcode::{LineEnding, Program};
pub use gcodescarf_scarf::{scarf_gcode, LoopScarfer, ScarfOutput, ScarfParameters, ScarfReport};
pub use gcodescarf_settings::{Config, LineEndingSetting, OutputSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Log output goes to stderr so the rewritten program can be piped from
/// stdout. `RUST_LOG` is honoured.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Settings for a run: the given or default config file, then CLI overrides
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_default().context("Failed to load default config")?,
    };
    Ok(cli.apply_overrides(config))
}

/// Rewrite program text according to `config`
pub fn scarf_text(text: &str, config: &Config) -> anyhow::Result<ScarfOutput> {
    let mut program = Program::parse(text).map_err(Error::from)?;
    program.line_ending = config.output.line_ending.resolve(program.line_ending);

    let scarfer = LoopScarfer::new(config.scarf.clone()).with_markers(config.output.emit_markers);
    let (commands, report) = scarfer.process_program(&program)?;
    Ok(ScarfOutput {
        gcode: program.render_commands(&commands),
        report,
    })
}

/// Run the command-line driver
pub fn run(cli: &Cli) -> anyhow::Result<ScarfReport> {
    let config = load_config(cli)?;
    let text = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;

    let output = scarf_text(&text, &config)
        .with_context(|| format!("Failed to scarf {}", cli.input.display()))?;

    match &cli.output {
        Some(path) => std::fs::write(path, &output.gcode)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(output.gcode.as_bytes())?;
            stdout.flush()?;
        }
    }

    info!(
        input = %cli.input.display(),
        scarfed = output.report.scarfed_loops,
        notices = output.report.notices.len(),
        "done"
    );
    Ok(output.report)
}
