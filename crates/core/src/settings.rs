//! Study settings: distribution policy and annotation-axis configuration.
//!
//! Settings are attached to a project (or to a preset used as a template for
//! new projects). Coupling and ordering drive the assignment engine; the
//! remaining fields configure the participant's slider.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/* --------------------------------------------------------------------------
   Defaults
   -------------------------------------------------------------------------- */

pub const DEFAULT_METHOD: &str = "CORAE";
pub const DEFAULT_CAPACITY: i32 = 2;
pub const DEFAULT_GRANULARITY: i32 = 14;
pub const DEFAULT_AXIS: &str = "Social Distance";
pub const DEFAULT_CEILING: &str = "Approach";
pub const DEFAULT_FLOOR: &str = "Withdrawal";

/// Maximum length of any free-text settings label.
pub const MAX_LABEL_LEN: usize = 100;

/* --------------------------------------------------------------------------
   Policy enums
   -------------------------------------------------------------------------- */

/// How videos relate to participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coupling {
    /// Each participant contributes exactly one video of their own.
    Coupled,
    /// Videos form one shared pool.
    Decoupled,
}

impl Coupling {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Coupled => "coupled",
            Self::Decoupled => "decoupled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "coupled" => Ok(Self::Coupled),
            "decoupled" => Ok(Self::Decoupled),
            _ => Err(CoreError::Validation(format!(
                "Invalid coupling '{s}'. Must be one of: coupled, decoupled"
            ))),
        }
    }
}

/// How each participant's viewing queue is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ordering {
    /// Independent uniform shuffle per participant.
    Random,
    /// Pool iteration order.
    Ordered,
}

impl Ordering {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Ordered => "ordered",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "random" => Ok(Self::Random),
            "ordered" => Ok(Self::Ordered),
            _ => Err(CoreError::Validation(format!(
                "Invalid ordering '{s}'. Must be one of: random, ordered"
            ))),
        }
    }
}

/// Whether the slider is clamped to its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bounding {
    Bounded,
    Unbounded,
}

impl Bounding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bounded => "bounded",
            Self::Unbounded => "unbounded",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "bounded" => Ok(Self::Bounded),
            "unbounded" => Ok(Self::Unbounded),
            _ => Err(CoreError::Validation(format!(
                "Invalid bounding '{s}'. Must be one of: bounded, unbounded"
            ))),
        }
    }
}

/* --------------------------------------------------------------------------
   Settings values
   -------------------------------------------------------------------------- */

/// Fully-resolved settings for a project or preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySettings {
    pub method: String,
    pub capacity: i32,
    pub coupling: Coupling,
    pub ordering: Ordering,
    pub bounding: Bounding,
    pub granularity: i32,
    pub axis: String,
    pub ceiling: String,
    pub floor: String,
}

impl Default for StudySettings {
    fn default() -> Self {
        Self {
            method: DEFAULT_METHOD.to_string(),
            capacity: DEFAULT_CAPACITY,
            coupling: Coupling::Coupled,
            ordering: Ordering::Random,
            bounding: Bounding::Bounded,
            granularity: DEFAULT_GRANULARITY,
            axis: DEFAULT_AXIS.to_string(),
            ceiling: DEFAULT_CEILING.to_string(),
            floor: DEFAULT_FLOOR.to_string(),
        }
    }
}

/// Partial settings supplied by a researcher; `None` keeps the base value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsOverrides {
    pub method: Option<String>,
    pub capacity: Option<i32>,
    pub coupling: Option<Coupling>,
    pub ordering: Option<Ordering>,
    pub bounding: Option<Bounding>,
    pub granularity: Option<i32>,
    pub axis: Option<String>,
    pub ceiling: Option<String>,
    pub floor: Option<String>,
}

impl StudySettings {
    /// Copy these settings with every supplied override applied.
    pub fn with_overrides(&self, overrides: &SettingsOverrides) -> Self {
        Self {
            method: overrides.method.clone().unwrap_or_else(|| self.method.clone()),
            capacity: overrides.capacity.unwrap_or(self.capacity),
            coupling: overrides.coupling.unwrap_or(self.coupling),
            ordering: overrides.ordering.unwrap_or(self.ordering),
            bounding: overrides.bounding.unwrap_or(self.bounding),
            granularity: overrides.granularity.unwrap_or(self.granularity),
            axis: overrides.axis.clone().unwrap_or_else(|| self.axis.clone()),
            ceiling: overrides.ceiling.clone().unwrap_or_else(|| self.ceiling.clone()),
            floor: overrides.floor.clone().unwrap_or_else(|| self.floor.clone()),
        }
    }

    /// Validate numeric ranges and label lengths.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.capacity < 1 {
            return Err(CoreError::Validation(format!(
                "capacity must be at least 1, got {}",
                self.capacity
            )));
        }
        if self.granularity < 1 {
            return Err(CoreError::Validation(format!(
                "granularity must be at least 1, got {}",
                self.granularity
            )));
        }
        for (field, value) in [
            ("method", &self.method),
            ("axis", &self.axis),
            ("ceiling", &self.ceiling),
            ("floor", &self.floor),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!("{field} must not be empty")));
            }
            if value.len() > MAX_LABEL_LEN {
                return Err(CoreError::Validation(format!(
                    "{field} too long: {} chars (max {MAX_LABEL_LEN})",
                    value.len()
                )));
            }
        }
        Ok(())
    }

    /// Slider range centred on zero: `(-granularity / 2, granularity / 2)`.
    pub fn slider_range(&self) -> (f64, f64) {
        let half = f64::from(self.granularity) / 2.0;
        (-half, half)
    }
}
