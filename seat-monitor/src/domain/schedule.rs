//! Schedule types and fare classes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown schedule type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown schedule type: {0} (expected express or inter_county)")]
pub struct InvalidScheduleType(String);

/// Error returned when parsing an unknown fare class.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown fare class: {0} (expected first or economy)")]
pub struct InvalidFareClass(String);

/// The portal's train category axis.
///
/// The portal sends and accepts these as `express` and `inter_county`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    /// Express trains, which run at several departure times per day.
    Express,
    /// Inter-county trains, queried at a single fixed time.
    InterCounty,
}

impl ScheduleType {
    /// The form value expected by the portal.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::Express => "express",
            ScheduleType::InterCounty => "inter_county",
        }
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleType {
    type Err = InvalidScheduleType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "express" => Ok(ScheduleType::Express),
            "inter_county" | "inter-county" => Ok(ScheduleType::InterCounty),
            _ => Err(InvalidScheduleType(s.to_string())),
        }
    }
}

/// Seating tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FareClass {
    First,
    /// Economy, shown as "SECOND CLASS" on some pages.
    Economy,
}

impl FareClass {
    /// Human-readable label used in alerts.
    pub fn label(&self) -> &'static str {
        match self {
            FareClass::First => "First Class",
            FareClass::Economy => "Economy",
        }
    }

    /// Classify a class heading or button label.
    ///
    /// Matching is case-insensitive. Returns `None` for labels that name
    /// neither class.
    pub fn from_title(title: &str) -> Option<Self> {
        let upper = title.to_uppercase();
        if upper.contains("FIRST CLASS") {
            Some(FareClass::First)
        } else if upper.contains("ECONOMY") || upper.contains("SECOND CLASS") {
            Some(FareClass::Economy)
        } else {
            None
        }
    }
}

impl fmt::Display for FareClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FareClass {
    type Err = InvalidFareClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(FareClass::First),
            "economy" | "second" => Ok(FareClass::Economy),
            _ => Err(InvalidFareClass(s.to_string())),
        }
    }
}
