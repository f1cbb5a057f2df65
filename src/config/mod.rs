// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song construction options.
//!
//! Options can be built in code or read from YAML or TOML text. Every field
//! is optional and falls back to 4/4 with no transposition.

use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Time signature, written as `[numerator, denominator]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 2]", into = "[u8; 2]")]
pub struct TimeSignature {
    /// Beats per measure
    pub numerator: u8,
    /// Beat unit (4 = quarter note)
    pub denominator: u8,
}

impl TimeSignature {
    /// Create a time signature
    pub fn new(numerator: u8, denominator: u8) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Beats per measure
    pub fn beats(&self) -> usize {
        self.numerator as usize
    }

    /// Check that both parts are positive
    pub fn validate(&self) -> ChartResult<()> {
        if self.numerator == 0 || self.denominator == 0 {
            return Err(ChartError::InvalidTimeSignature {
                numerator: self.numerator,
                denominator: self.denominator,
            });
        }
        Ok(())
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

impl From<[u8; 2]> for TimeSignature {
    fn from([numerator, denominator]: [u8; 2]) -> Self {
        Self::new(numerator, denominator)
    }
}

impl From<TimeSignature> for [u8; 2] {
    fn from(ts: TimeSignature) -> Self {
        [ts.numerator, ts.denominator]
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Options for creating a song
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SongOptions {
    /// Time signature new measures are sized from
    #[serde(default)]
    pub time_signature: TimeSignature,
    /// Transposition in semitones
    #[serde(default)]
    pub transpose: i32,
}

impl SongOptions {
    /// Parse options from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse song options YAML")
    }

    /// Parse options from a TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse song options TOML")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize song options to YAML")
    }

    /// Builder: set time signature
    pub fn with_time_signature(mut self, numerator: u8, denominator: u8) -> Self {
        self.time_signature = TimeSignature::new(numerator, denominator);
        self
    }

    /// Builder: set transposition
    pub fn with_transpose(mut self, semitones: i32) -> Self {
        self.transpose = semitones;
        self
    }
}
