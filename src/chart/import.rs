// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Plain chart data for bulk import and export.
//!
//! ```json
//! {
//!   "title": "Autumn Leaves",
//!   "timeSignature": [4, 4],
//!   "key": "Gm",
//!   "chords": [["Cm7"], ["F7"], null, ["BbΔ7", null, "EbΔ7"]]
//! }
//! ```
//!
//! Each `chords` entry is a measure (a list of chord texts or nulls) or a
//! newline (null or an empty list).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::TimeSignature;

/// One chart entry: chord texts for a measure, or `None` for a newline
pub type MeasureEntry = Option<Vec<Option<String>>>;

/// Chart metadata and entries. Absent or empty metadata keeps the song's.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<TimeSignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub chords: Vec<MeasureEntry>,
}

impl ChartData {
    /// Parse chart data from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse chart JSON")
    }

    /// Serialize to a pretty JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize chart to JSON")
    }

    /// Parse chart data from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse chart YAML")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize chart to YAML")
    }

    /// Append a measure entry
    pub fn push_measure<S: AsRef<str>>(&mut self, chords: &[S]) {
        let beats = chords
            .iter()
            .map(|c| Some(c.as_ref()).filter(|c| !c.is_empty()).map(str::to_string))
            .collect();
        self.chords.push(Some(beats));
    }

    /// Append a newline entry
    pub fn push_newline(&mut self) {
        self.chords.push(None);
    }

    /// Number of measure entries
    pub fn measure_count(&self) -> usize {
        self.chords
            .iter()
            .filter(|entry| entry.as_ref().is_some_and(|beats| !beats.is_empty()))
            .count()
    }
}
