use clap::Parser;
use gcodescarf_settings::{Config, LineEndingSetting};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Input G-code file
    pub input: PathBuf,
    /// Output file; the rewritten program goes to stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Settings file (.json or .toml); the platform default is used when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Height the starting taper ramps down from (mm)
    #[arg(long)]
    pub layer_height: Option<f64>,
    /// Length of the tapered overlap (mm)
    #[arg(long)]
    pub overlap: Option<f64>,
    /// Largest end-to-start gap still treated as a closed loop (mm)
    #[arg(long)]
    pub loop_tolerance: Option<f64>,
    /// Longest step inside a taper (mm)
    #[arg(long)]
    pub taper_resolution: Option<f64>,
    /// Do not bracket scarfed loops with marker comments
    #[arg(long)]
    pub no_markers: bool,
    /// Line ending of the output: auto, lf or crlf
    #[arg(long)]
    pub line_ending: Option<LineEndingSetting>,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded config
    pub fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(value) = self.layer_height {
            config.scarf.layer_height = value;
        }
        if let Some(value) = self.overlap {
            config.scarf.overlap = value;
        }
        if let Some(value) = self.loop_tolerance {
            config.scarf.loop_tolerance = value;
        }
        if let Some(value) = self.taper_resolution {
            config.scarf.taper_resolution = value;
        }
        if self.no_markers {
            config.output.emit_markers = false;
        }
        if let Some(line_ending) = self.line_ending {
            config.output.line_ending = line_ending;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_only_given_values() {
        let cli = Cli::parse_from([
            "gcodescarf",
            "in.gcode",
            "--overlap",
            "3",
            "--no-markers",
            "--line-ending",
            "crlf",
        ]);
        let config = cli.apply_overrides(Config::default());
        assert_eq!(config.scarf.overlap, 3.0);
        assert_eq!(config.scarf.layer_height, 0.2);
        assert!(!config.output.emit_markers);
        assert_eq!(config.output.line_ending, LineEndingSetting::CrLf);
    }

    #[test]
    fn test_rejects_unknown_line_ending() {
        assert!(Cli::try_parse_from(["gcodescarf", "in.gcode", "--line-ending", "cr"]).is_err());
    }
}
