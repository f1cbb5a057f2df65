// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for chord parsing and chart mutation.

use thiserror::Error;

use crate::chart::MeasureId;
use crate::music::ChordQuality;

/// Failure to read a chord symbol
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChordError {
    /// Nothing but whitespace was given
    #[error("empty chord symbol")]
    Empty,
    /// The symbol does not follow the chord grammar
    #[error("malformed chord symbol `{symbol}`: {reason}")]
    Malformed { symbol: String, reason: String },
}

impl ChordError {
    pub(crate) fn malformed(symbol: &str, reason: impl Into<String>) -> Self {
        ChordError::Malformed {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failure of a chart operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartError {
    /// A beat's chord text could not be parsed
    #[error("beat {slot} holds an unreadable chord `{raw}`")]
    MalformedChord {
        slot: usize,
        raw: String,
        #[source]
        source: ChordError,
    },
    /// An import entry failed; wraps the entry's own error
    #[error("chart entry {entry} is invalid")]
    InvalidEntry {
        entry: usize,
        #[source]
        source: Box<ChartError>,
    },
    /// Key-target transposition only understands major and minor chords
    #[error("cannot transpose to or from `{symbol}`: {quality} is neither major nor minor")]
    UnsupportedQuality {
        symbol: String,
        quality: ChordQuality,
    },
    /// The song key is not a readable chord symbol
    #[error("invalid key `{key}`")]
    InvalidKey {
        key: String,
        #[source]
        source: ChordError,
    },
    /// Both parts of a time signature must be positive
    #[error("invalid time signature {numerator}/{denominator}")]
    InvalidTimeSignature { numerator: u8, denominator: u8 },
    /// The handle does not name a live measure of this song
    #[error("unknown measure {0}")]
    UnknownMeasure(MeasureId),
    /// Beat index past the measure's capacity
    #[error("beat {slot} is out of range for {measure} ({beats} beats)")]
    BeatOutOfRange {
        measure: MeasureId,
        slot: usize,
        beats: usize,
    },
    /// The sequence element is a measure, or there is no element
    #[error("no newline marker at index {0}")]
    NotANewline(usize),
}

/// Result alias for chart operations
pub type ChartResult<T> = Result<T, ChartError>;
