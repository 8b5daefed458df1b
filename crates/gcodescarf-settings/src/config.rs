//! Configuration file handling for GCodeScarf
//!
//! A config file carries the four scarfing parameters and the output
//! options. Both JSON and TOML are accepted; the format is chosen by file
//! extension. Every section and field is optional and falls back to its
//! default, so a file only needs to name what it changes:
//!
//! ```toml
//! [scarf]
//! overlap = 3.0
//!
//! [output]
//! line_ending = "crlf"
//! ```

use gcodescarf_gcode::LineEnding;
use gcodescarf_scarf::ScarfParameters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{SettingsError, SettingsResult};

/// Line terminator choice for the rewritten program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEndingSetting {
    /// Same as the input
    #[default]
    Auto,
    /// Always `\n`
    Lf,
    /// Always `\r\n`
    CrLf,
}

impl LineEndingSetting {
    /// Terminator to write, given the one detected in the input
    pub fn resolve(self, detected: LineEnding) -> LineEnding {
        match self {
            Self::Auto => detected,
            Self::Lf => LineEnding::Lf,
            Self::CrLf => LineEnding::CrLf,
        }
    }
}

impl std::fmt::Display for LineEndingSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Lf => write!(f, "lf"),
            Self::CrLf => write!(f, "crlf"),
        }
    }
}

impl std::str::FromStr for LineEndingSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "lf" => Ok(Self::Lf),
            "crlf" => Ok(Self::CrLf),
            other => Err(format!(
                "unknown line ending '{}' (expected auto, lf or crlf)",
                other
            )),
        }
    }
}

/// How the rewritten program is written out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Line terminator
    pub line_ending: LineEndingSetting,
    /// Bracket scarfed loops with marker comments
    pub emit_markers: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            line_ending: LineEndingSetting::Auto,
            emit_markers: true,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Scarfing parameters
    pub scarf: ScarfParameters,
    /// Output options
    pub output: OutputSettings,
}

/// Serialization format, picked from a file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn from_path(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(SettingsError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::from_path(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::from_path(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        self.scarf.validate()?;
        Ok(())
    }

    /// Platform location of the default config file
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("gcodescarf").join("config.toml"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no config directory on this platform".to_string())
            })
    }

    /// Load the default config file if it exists, defaults otherwise
    pub fn load_default() -> SettingsResult<Self> {
        let path = match Self::default_path() {
            Ok(path) => path,
            Err(_) => return Ok(Self::default()),
        };
        if path.is_file() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a.json")).unwrap(), Format::Json);
        assert_eq!(Format::from_path(Path::new("a.toml")).unwrap(), Format::Toml);
        assert!(matches!(
            Format::from_path(Path::new("a.yaml")),
            Err(SettingsError::UnsupportedFormat(ext)) if ext == "yaml"
        ));
        assert!(Format::from_path(Path::new("config")).is_err());
    }

    #[test]
    fn test_line_ending_resolution() {
        assert_eq!(LineEndingSetting::Auto.resolve(LineEnding::CrLf), LineEnding::CrLf);
        assert_eq!(LineEndingSetting::Lf.resolve(LineEnding::CrLf), LineEnding::Lf);
        assert_eq!(LineEndingSetting::CrLf.resolve(LineEnding::Lf), LineEnding::CrLf);
    }

    #[test]
    fn test_line_ending_parse() {
        assert_eq!("CRLF".parse::<LineEndingSetting>(), Ok(LineEndingSetting::CrLf));
        assert_eq!("auto".parse::<LineEndingSetting>(), Ok(LineEndingSetting::Auto));
        assert!("cr".parse::<LineEndingSetting>().is_err());
        assert_eq!(LineEndingSetting::Lf.to_string(), "lf");
    }

    #[test]
    fn test_default_path_is_under_app_dir() {
        if let Ok(path) = Config::default_path() {
            assert!(path.ends_with("gcodescarf/config.toml"));
        }
    }
}
