#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! Every field defaults to the behaviour the overlay ships with, so
//! `EngineConfig::default()` is what the web entry point uses. The JSON
//! loader exists for embedders and tests; the page itself is never asked
//! for configuration.
//!
//! ```
//! use ssvep_core::config::{EngineConfig, RotationPolicy};
//!
//! let config = EngineConfig::from_json_str(r#"{ "rotation": "decorate_candidates" }"#).unwrap();
//! assert_eq!(config.rotation, RotationPolicy::DecorateCandidates);
//! assert_eq!(config.max_stimuli, 5);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::palette::Palette;

/// What a rotation step decorates once it has found candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    /// Run the ordinary refresh path: re-scan with no exclusion and decorate
    /// the first elements in document order. The rotation candidates only
    /// decide whether anything happens at all.
    #[default]
    RescanUnfiltered,
    /// Decorate the rotation candidates themselves.
    DecorateCandidates,
}

/// How a reduced-motion preference observed at load is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReducedMotionPolicy {
    /// Never decorate. Existing engine marks are stripped at load and every
    /// later refresh only cleanses.
    #[default]
    Inert,
    /// Decorate at load, strip once, and let later events decorate again.
    StripOnce,
}

/// Tunable parameters of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on the active set (K).
    pub max_stimuli: usize,
    /// Periods stimuli are drawn from.
    pub palette: Palette,
    /// Quiet time after the last input event before refreshing.
    pub interaction_debounce_ms: u64,
    /// Quiet time after the last DOM mutation before refreshing.
    pub mutation_debounce_ms: u64,
    /// Time without input before one rotation step.
    pub inactivity_ms: u64,
    /// Rotation behaviour.
    pub rotation: RotationPolicy,
    /// Reduced-motion behaviour.
    pub reduced_motion: ReducedMotionPolicy,
    /// Drop mutation pings that only touch engine-owned overlay nodes.
    pub ignore_own_mutations: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_stimuli: 5,
            palette: Palette::default(),
            interaction_debounce_ms: 200,
            mutation_debounce_ms: 5000,
            inactivity_ms: 5000,
            rotation: RotationPolicy::default(),
            reduced_motion: ReducedMotionPolicy::default(),
            ignore_own_mutations: true,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON string and validate.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.into_validated()
    }

    /// Return `self` if it validates, otherwise the collected errors.
    pub fn into_validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Validate all fields. Returns a list of human-readable problems.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.max_stimuli == 0 {
            errors.push("max_stimuli must be at least 1".to_string());
        }
        if self.palette.is_empty() {
            errors.push("palette must contain at least one period".to_string());
        }
        for period in self.palette.periods() {
            if !period.is_valid() {
                errors.push(format!(
                    "palette period {} must be positive and finite",
                    period.as_secs()
                ));
            }
        }
        if self.interaction_debounce_ms == 0 {
            errors.push("interaction_debounce_ms must be > 0".to_string());
        }
        if self.mutation_debounce_ms == 0 {
            errors.push("mutation_debounce_ms must be > 0".to_string());
        }
        if self.inactivity_ms == 0 {
            errors.push("inactivity_ms must be > 0".to_string());
        }
        errors
    }

    #[must_use]
    pub fn interaction_debounce(&self) -> Duration {
        Duration::from_millis(self.interaction_debounce_ms)
    }

    #[must_use]
    pub fn mutation_debounce(&self) -> Duration {
        Duration::from_millis(self.mutation_debounce_ms)
    }

    #[must_use]
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_millis(self.inactivity_ms)
    }
}
