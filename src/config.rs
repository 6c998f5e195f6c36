//! Generation request: the one input contract every front end fills in.
//!
//! Defaults mirror the desktop front end. `validate()` enforces the documented
//! ranges for front ends that accept free-form input; the pipeline itself
//! trusts whatever it is given.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

pub const MAX_TEXT_CHARS: usize = 20;
pub const FONT_SIZE_RANGE: (f64, f64) = (50.0, 200.0);
pub const STEP_RANGE: (u32, u32) = (0, 200);
pub const DEPTH_RANGE: (f64, f64) = (100.0, 1000.0);

/// Parameters of one generation run (everything except the font).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationRequest {
    pub text: String,
    /// Em size in output units.
    pub font_size: f64,
    /// Horizontal advance per character index.
    pub step_x: u32,
    /// Vertical drop per character index.
    pub step_y: u32,
    pub min_depth: f64,
    pub max_depth: f64,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            text: "RANYEJUN".to_string(),
            font_size: 80.0,
            step_x: 50,
            step_y: 80,
            min_depth: 300.0,
            max_depth: 500.0,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("text is empty")]
    EmptyText,

    #[error("text has {0} characters, at most {max} are allowed", max = MAX_TEXT_CHARS)]
    TextTooLong(usize),

    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("min_depth ({min}) is greater than max_depth ({max})")]
    DepthOrder { min: f64, max: f64 },
}

impl GenerationRequest {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check the documented input ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let chars = self.text.chars().count();
        if chars == 0 {
            return Err(ConfigError::EmptyText);
        }
        if chars > MAX_TEXT_CHARS {
            return Err(ConfigError::TextTooLong(chars));
        }

        check_range("font_size", self.font_size, FONT_SIZE_RANGE)?;
        let steps = (STEP_RANGE.0 as f64, STEP_RANGE.1 as f64);
        check_range("step_x", self.step_x as f64, steps)?;
        check_range("step_y", self.step_y as f64, steps)?;
        check_range("min_depth", self.min_depth, DEPTH_RANGE)?;
        check_range("max_depth", self.max_depth, DEPTH_RANGE)?;

        if self.min_depth > self.max_depth {
            return Err(ConfigError::DepthOrder {
                min: self.min_depth,
                max: self.max_depth,
            });
        }
        Ok(())
    }
}

fn check_range(field: &'static str, value: f64, (min, max): (f64, f64)) -> Result<(), ConfigError> {
    // NaN fails both comparisons, so test containment rather than exclusion.
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
