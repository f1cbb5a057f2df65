// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pluggable chord theory.
//!
//! The song never reaches for a global parser. It owns a [`ChordTheory`]
//! handed to it at construction, so tests can swap in a deterministic fake.

use std::fmt;

use super::chord::Chord;
use super::note::Note;
use crate::error::ChordError;

/// Parsing, transposition and spelling of chords
pub trait ChordTheory: fmt::Debug {
    /// Parse a chord symbol
    fn parse(&self, symbol: &str) -> Result<Chord, ChordError>;

    /// Shift a chord by semitones, wrapping within the octave
    fn transpose(&self, chord: &Chord, semitones: i32) -> Chord {
        chord.transposed(semitones)
    }

    /// Default spelling of a pitch class
    fn spell(&self, note: Note) -> String;

    /// Signed distance from `from` to `to` with both in the same octave
    fn semitones(&self, from: Note, to: Note) -> i32 {
        to.pitch_class() as i32 - from.pitch_class() as i32
    }
}

/// Built-in theory: the chord grammar of [`Chord::parse`] and flat spelling
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTheory;

impl ChordTheory for StandardTheory {
    fn parse(&self, symbol: &str) -> Result<Chord, ChordError> {
        Chord::parse(symbol)
    }

    fn spell(&self, note: Note) -> String {
        note.flat_name().to_string()
    }
}

/// Parse a chord the way beats are stored.
///
/// The first `-7` is rewritten to `m7` before the theory sees it, since
/// parsers read the dash form wrong. The returned chord keeps the
/// uncorrected text as `raw`.
pub fn parse_chord(theory: &dyn ChordTheory, text: &str) -> Result<Chord, ChordError> {
    let corrected = text.replacen("-7", "m7", 1);
    Ok(theory.parse(&corrected)?.with_raw(text))
}
