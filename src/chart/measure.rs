// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Measures: fixed rows of beat slots.
//!
//! A measure is sized from the song's time signature when it is created and
//! keeps that size for its whole life. Its position is not stored here; the
//! song's sequence is the only record of where a measure sits.

use std::fmt;

use tracing::trace;

use super::song::SongId;
use crate::error::{ChartError, ChartResult};
use crate::music::{parse_chord, Chord, ChordTheory, TransposedChord};

/// Handle to a measure in a song's arena.
///
/// Arena slots of removed measures are reused; the generation tells a stale
/// handle from the measure that took over its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeasureId {
    song: SongId,
    index: usize,
    generation: u32,
}

impl MeasureId {
    pub(crate) fn new(song: SongId, index: usize) -> Self {
        Self {
            song,
            index,
            generation: 0,
        }
    }

    /// Handle for the next measure stored in this handle's slot
    pub(crate) fn reuse(self) -> Self {
        Self {
            generation: self.generation.wrapping_add(1),
            ..self
        }
    }

    /// Song that owns the measure
    pub fn song(&self) -> SongId {
        self.song
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for MeasureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "measure {}.{} of {}", self.index, self.generation, self.song)
    }
}

/// Parse beat texts into `capacity` slots.
///
/// Missing, null and blank entries leave the slot empty. Entries past
/// `capacity` are ignored without being parsed.
pub(crate) fn parse_beats<I, S>(
    theory: &dyn ChordTheory,
    capacity: usize,
    chords: I,
) -> ChartResult<Vec<Option<Chord>>>
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut texts = chords.into_iter();
    (0..capacity)
        .map(|slot| match texts.next().flatten() {
            Some(text) if !text.as_ref().trim().is_empty() => {
                let raw = text.as_ref();
                parse_chord(theory, raw)
                    .map(Some)
                    .map_err(|source| ChartError::MalformedChord {
                        slot,
                        raw: raw.to_string(),
                        source,
                    })
            }
            _ => Ok(None),
        })
        .collect()
}

/// A measure of beat slots, each empty or holding one chord
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    id: MeasureId,
    beats: Vec<Option<Chord>>,
}

impl Measure {
    pub(crate) fn new(id: MeasureId, beats: Vec<Option<Chord>>) -> Self {
        Self { id, beats }
    }

    /// Get the handle of this measure
    pub fn id(&self) -> MeasureId {
        self.id
    }

    /// Song that owns this measure
    pub fn song(&self) -> SongId {
        self.id.song
    }

    /// Number of beat slots
    pub fn beat_count(&self) -> usize {
        self.beats.len()
    }

    /// Whether no slot holds a chord
    pub fn is_empty(&self) -> bool {
        self.beats.iter().all(Option::is_none)
    }

    /// Stored, untransposed slots
    pub fn beats(&self) -> &[Option<Chord>] {
        &self.beats
    }

    /// Stored chord at `slot`, untransposed
    pub fn stored_beat(&self, slot: usize) -> Option<&Chord> {
        self.beats.get(slot).and_then(Option::as_ref)
    }

    /// Read the chord at `slot` shifted by `transpose` semitones.
    ///
    /// Returns `None` for an empty slot. Out-of-range slots are an error.
    pub fn read_beat(
        &self,
        slot: usize,
        transpose: i32,
        theory: &dyn ChordTheory,
    ) -> ChartResult<Option<TransposedChord>> {
        let stored = self.beats.get(slot).ok_or(ChartError::BeatOutOfRange {
            measure: self.id,
            slot,
            beats: self.beats.len(),
        })?;
        trace!(measure = %self.id, slot, transpose, "reading beat");
        Ok(stored
            .as_ref()
            .map(|chord| TransposedChord::read(chord, transpose, theory)))
    }

    pub(crate) fn set_beat(&mut self, slot: usize, chord: Option<Chord>) -> ChartResult<()> {
        let beats = self.beats.len();
        let target = self.beats.get_mut(slot).ok_or(ChartError::BeatOutOfRange {
            measure: self.id,
            slot,
            beats,
        })?;
        *target = chord;
        Ok(())
    }

    /// Literal chord texts, empty slots as `None`
    pub fn raw_beats(&self) -> Vec<Option<String>> {
        self.beats
            .iter()
            .map(|beat| beat.as_ref().map(|c| c.raw().to_string()))
            .collect()
    }
}
