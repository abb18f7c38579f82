//! Named time-series transformations and their column-naming rules.
//!
//! The arithmetic lives in [`crate::transform`]; this module only defines
//! the tag vocabulary shared by tool inputs, dataset metadata sidecars, and
//! column names.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Unknown transformation tag: {0}")]
pub struct UnknownTransformation(pub String);

/// The transformation vocabulary.
///
/// Serde spellings are part of the wire and on-disk format: `YoY`, `QoQ`
/// and `MoM` keep their mixed case, everything else is lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Transformation {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "YoY")]
    YoY,
    #[serde(rename = "QoQ")]
    QoQ,
    #[serde(rename = "MoM")]
    MoM,
    #[serde(rename = "diff")]
    Diff,
    #[serde(rename = "pct_change")]
    PctChange,
    #[serde(rename = "log")]
    Log,
    #[serde(rename = "log_diff")]
    LogDiff,
}

impl Transformation {
    /// Number of leading observations consumed before the first defined
    /// output. Counted in observations, not calendar units.
    pub fn lookback(self) -> usize {
        match self {
            Transformation::None | Transformation::Log => 0,
            Transformation::Diff
            | Transformation::PctChange
            | Transformation::MoM
            | Transformation::LogDiff => 1,
            Transformation::QoQ => 3,
            Transformation::YoY => 12,
        }
    }

    /// The tag as it appears in column suffixes and metadata sidecars.
    pub fn tag(self) -> &'static str {
        match self {
            Transformation::None => "none",
            Transformation::YoY => "YoY",
            Transformation::QoQ => "QoQ",
            Transformation::MoM => "MoM",
            Transformation::Diff => "diff",
            Transformation::PctChange => "pct_change",
            Transformation::Log => "log",
            Transformation::LogDiff => "log_diff",
        }
    }

    /// Parses a tag string, accepting exactly the serde spellings.
    pub fn parse(raw: &str) -> Result<Self, UnknownTransformation> {
        match raw {
            "none" => Ok(Transformation::None),
            "YoY" => Ok(Transformation::YoY),
            "QoQ" => Ok(Transformation::QoQ),
            "MoM" => Ok(Transformation::MoM),
            "diff" => Ok(Transformation::Diff),
            "pct_change" => Ok(Transformation::PctChange),
            "log" => Ok(Transformation::Log),
            "log_diff" => Ok(Transformation::LogDiff),
            other => Err(UnknownTransformation(other.to_string())),
        }
    }

    /// Column name for a series under this transformation:
    /// the bare id for `none`, `{id}_{tag}` otherwise.
    pub fn column_name(self, series_id: &str) -> String {
        match self {
            Transformation::None => series_id.to_string(),
            tag => format!("{}_{}", series_id, tag.tag()),
        }
    }
}
