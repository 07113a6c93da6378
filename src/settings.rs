//! Session tuning
//!
//! Defaults reproduce the stock game balance. Hosts may override any field
//! from JSON; missing fields keep their defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::bounds::Bounds;
use crate::sim::difficulty::DifficultyTuning;

/// Errors raised when settings are unusable
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings are not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be at least {min} (got {value})")]
    TooSmall {
        field: &'static str,
        min: f64,
        value: f64,
    },
}

/// Tunable session parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// RNG seed for template and position selection
    pub seed: u64,

    // === Generator ===
    pub spawn_interval_ms: f64,
    pub max_active_challenges: usize,
    /// Inset from the surface edge for spawns and movement
    pub spawn_margin: f32,

    // === Difficulty ===
    pub adjustment_cooldown_ms: f64,
    pub streak_threshold: u32,

    // === Surface (until the renderer reports its own) ===
    pub surface_width: f32,
    pub surface_height: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0,

            spawn_interval_ms: SPAWN_INTERVAL_MS,
            max_active_challenges: MAX_ACTIVE_CHALLENGES,
            spawn_margin: SPAWN_MARGIN,

            adjustment_cooldown_ms: ADJUSTMENT_COOLDOWN_MS,
            streak_threshold: STREAK_THRESHOLD,

            surface_width: DEFAULT_SURFACE_WIDTH,
            surface_height: DEFAULT_SURFACE_HEIGHT,
        }
    }
}

impl Settings {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parse from JSON and validate
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = |field: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SettingsError::NotPositive { field, value })
            }
        };
        positive("spawn_interval_ms", self.spawn_interval_ms)?;
        positive("max_active_challenges", self.max_active_challenges as f64)?;
        positive("streak_threshold", self.streak_threshold as f64)?;
        positive("surface_width", self.surface_width as f64)?;
        positive("surface_height", self.surface_height as f64)?;

        if !self.adjustment_cooldown_ms.is_finite() || self.adjustment_cooldown_ms < 0.0 {
            return Err(SettingsError::TooSmall {
                field: "adjustment_cooldown_ms",
                min: 0.0,
                value: self.adjustment_cooldown_ms,
            });
        }
        if !self.spawn_margin.is_finite() || self.spawn_margin < 0.0 {
            return Err(SettingsError::TooSmall {
                field: "spawn_margin",
                min: 0.0,
                value: self.spawn_margin as f64,
            });
        }
        Ok(())
    }

    pub fn surface(&self) -> Bounds {
        Bounds::from_size(self.surface_width, self.surface_height)
    }

    pub fn difficulty_tuning(&self) -> DifficultyTuning {
        DifficultyTuning {
            streak_threshold: self.streak_threshold,
            cooldown_ms: self.adjustment_cooldown_ms,
        }
    }
}
