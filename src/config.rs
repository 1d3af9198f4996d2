use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be at least 1")]
    ZeroWindow { field: &'static str },
    #[error("{min_field} ({min}) exceeds {window_field} ({window})")]
    MinAboveWindow {
        min_field: &'static str,
        min: usize,
        window_field: &'static str,
        window: usize,
    },
    #[error("{field} must be finite and non-negative, got {value}")]
    InvalidNumber { field: &'static str, value: f64 },
    #[error("{field} must not be negative, got {value}")]
    NegativeDays { field: &'static str, value: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingConfig {
    #[serde(default = "default_baseline")]
    pub baseline: f64,
    #[serde(default = "default_k")]
    pub k: f64,
    #[serde(default = "default_surface_k")]
    pub surface_k: f64,
    // Applied once per elapsed calendar year.
    #[serde(default = "default_decay")]
    pub decay: f64,
}

fn default_baseline() -> f64 {
    1500.0
}

fn default_k() -> f64 {
    32.0
}

fn default_surface_k() -> f64 {
    24.0
}

fn default_decay() -> f64 {
    0.01
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            baseline: default_baseline(),
            k: default_k(),
            surface_k: default_surface_k(),
            decay: default_decay(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_matches")]
    pub matches: usize,
    #[serde(default = "default_min_matches")]
    pub min_matches: usize,
    #[serde(default = "default_surface_matches")]
    pub surface_matches: usize,
    #[serde(default = "default_surface_min_matches")]
    pub surface_min_matches: usize,
    #[serde(default = "default_rest_days")]
    pub rest_default_days: i64,
    #[serde(default = "default_rest_cap")]
    pub rest_cap_days: i64,
}

fn default_matches() -> usize {
    10
}

fn default_min_matches() -> usize {
    3
}

fn default_surface_matches() -> usize {
    6
}

fn default_surface_min_matches() -> usize {
    2
}

fn default_rest_days() -> i64 {
    30
}

fn default_rest_cap() -> i64 {
    60
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            matches: default_matches(),
            min_matches: default_min_matches(),
            surface_matches: default_surface_matches(),
            surface_min_matches: default_surface_min_matches(),
            rest_default_days: default_rest_days(),
            rest_cap_days: default_rest_cap(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_min_year")]
    pub min_year: i32,
    #[serde(default)]
    pub rating: RatingConfig,
    #[serde(default)]
    pub window: WindowConfig,
}

fn default_min_year() -> i32 {
    2010
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_year: default_min_year(),
            rating: RatingConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str::<Self>(&raw)
            .with_context(|| format!("invalid config json {}", path.display()))
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let w = &self.window;
        if w.matches == 0 {
            return Err(ConfigError::ZeroWindow { field: "matches" });
        }
        if w.surface_matches == 0 {
            return Err(ConfigError::ZeroWindow {
                field: "surface_matches",
            });
        }
        if w.min_matches == 0 {
            return Err(ConfigError::ZeroWindow {
                field: "min_matches",
            });
        }
        if w.surface_min_matches == 0 {
            return Err(ConfigError::ZeroWindow {
                field: "surface_min_matches",
            });
        }
        if w.min_matches > w.matches {
            return Err(ConfigError::MinAboveWindow {
                min_field: "min_matches",
                min: w.min_matches,
                window_field: "matches",
                window: w.matches,
            });
        }
        if w.surface_min_matches > w.surface_matches {
            return Err(ConfigError::MinAboveWindow {
                min_field: "surface_min_matches",
                min: w.surface_min_matches,
                window_field: "surface_matches",
                window: w.surface_matches,
            });
        }

        for (field, value) in [
            ("rest_default_days", w.rest_default_days),
            ("rest_cap_days", w.rest_cap_days),
        ] {
            if value < 0 {
                return Err(ConfigError::NegativeDays { field, value });
            }
        }

        let r = &self.rating;
        for (field, value) in [
            ("k", r.k),
            ("surface_k", r.surface_k),
            ("decay", r.decay),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidNumber { field, value });
            }
        }
        if !r.baseline.is_finite() {
            return Err(ConfigError::InvalidNumber {
                field: "baseline",
                value: r.baseline,
            });
        }
        Ok(())
    }
}
