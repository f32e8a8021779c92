//! Engine configuration contracts that can be shared across crates.
//!
//! Thresholds are fixed at engine construction; an invalid value is a
//! construction-time error, never a runtime one.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::ContractError;

const KMH_PER_MPS: f32 = 3.6;

/// Full engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EngineConfig {
    /// Motion rule thresholds
    #[validate(nested)]
    pub motion: MotionThresholds,

    /// Speed limits for location rules
    #[validate(nested)]
    pub location: SpeedLimits,

    /// Score deduction policy
    #[validate(nested)]
    pub scoring: ScoringPolicy,
}

/// Motion detector thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MotionThresholds {
    /// Longitudinal deceleration that counts as hard braking (m/s²)
    #[validate(range(min = 0.0, message = "must be >= 0"))]
    pub brake_threshold: f32,

    /// Deviation of net acceleration from 1 g that counts as rash driving (m/s²)
    #[validate(range(min = 0.0, message = "must be >= 0"))]
    pub rash_threshold: f32,

    /// Yaw rate that counts as zig-zag steering (rad/s)
    #[validate(range(min = 0.0, message = "must be >= 0"))]
    pub zigzag_threshold: f32,

    /// Gravity baseline (m/s²)
    #[validate(range(exclusive_min = 0.0, message = "must be > 0"))]
    pub gravity: f32,
}

impl Default for MotionThresholds {
    fn default() -> Self {
        Self {
            brake_threshold: 12.0,
            rash_threshold: 10.0,
            zigzag_threshold: 2.0,
            gravity: 9.8,
        }
    }
}

/// Location detector speed limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SpeedLimits {
    /// Limit on narrow lanes (km/h)
    #[validate(range(exclusive_min = 0.0, message = "must be > 0"))]
    pub narrow_limit_kmh: f32,

    /// Default highway limit when the road has no legal speed (km/h)
    #[validate(range(exclusive_min = 0.0, message = "must be > 0"))]
    pub highway_limit_kmh: f32,

    /// Position samples retained for heading-based rules
    #[validate(range(min = 1, message = "must be >= 1"))]
    pub heading_history_len: usize,
}

impl SpeedLimits {
    pub fn narrow_limit_mps(&self) -> f32 {
        self.narrow_limit_kmh / KMH_PER_MPS
    }

    pub fn highway_limit_mps(&self) -> f32 {
        self.highway_limit_kmh / KMH_PER_MPS
    }
}

impl Default for SpeedLimits {
    fn default() -> Self {
        Self {
            narrow_limit_kmh: 40.0,
            highway_limit_kmh: 80.0,
            heading_history_len: 8,
        }
    }
}

/// Score deduction policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Points deducted per event, uniform across kinds
    #[validate(range(min = 1, max = 100, message = "must be in 1..=100"))]
    pub penalty: u8,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self { penalty: 5 }
    }
}

impl EngineConfig {
    /// Validate every threshold, mapping the first violation to a `ContractError`
    ///
    /// Range checks do not catch NaN, so finiteness is checked first.
    pub fn check(&self) -> Result<(), ContractError> {
        self.check_finite()?;
        self.validate()
            .map_err(|errors| violation_to_error(&errors, "engine"))
    }

    fn check_finite(&self) -> Result<(), ContractError> {
        let fields = [
            ("engine.motion.brake_threshold", self.motion.brake_threshold),
            ("engine.motion.rash_threshold", self.motion.rash_threshold),
            ("engine.motion.zigzag_threshold", self.motion.zigzag_threshold),
            ("engine.motion.gravity", self.motion.gravity),
            ("engine.location.narrow_limit_kmh", self.location.narrow_limit_kmh),
            ("engine.location.highway_limit_kmh", self.location.highway_limit_kmh),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ContractError::config_validation(
                    field,
                    format!("must be finite, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// Convert `validator` output into the first violation found (sorted by field path)
pub fn violation_to_error(errors: &ValidationErrors, prefix: &str) -> ContractError {
    match first_violation(errors, prefix) {
        Some((field, message)) => ContractError::config_validation(field, message),
        None => ContractError::config_validation(prefix, errors.to_string()),
    }
}

fn first_violation(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (key, kind) in entries {
        let path = format!("{prefix}.{key}");
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                if let Some(error) = field_errors.first() {
                    let message = error
                        .message
                        .clone()
                        .unwrap_or_else(|| Cow::Owned(error.code.to_string()));
                    return Some((path, message.into_owned()));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(found) = first_violation(inner, &path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    if let Some(found) = first_violation(inner, &format!("{path}[{idx}]")) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}
