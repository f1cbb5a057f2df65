// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pitch classes and note-name spelling.

use std::fmt;

use serde::{Deserialize, Serialize};

/// MIDI note number type (0-127)
pub type MidiNote = u8;

/// Note names (pitch classes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Note {
    C,
    Cs, // C# / Db
    D,
    Ds, // D# / Eb
    E,
    F,
    Fs, // F# / Gb
    G,
    Gs, // G# / Ab
    A,
    As, // A# / Bb
    B,
}

const SHARP_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
const FLAT_NAMES: [&str; 12] = ["C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B"];

impl Note {
    /// All notes in chromatic order
    pub const ALL: [Note; 12] = [
        Note::C,
        Note::Cs,
        Note::D,
        Note::Ds,
        Note::E,
        Note::F,
        Note::Fs,
        Note::G,
        Note::Gs,
        Note::A,
        Note::As,
        Note::B,
    ];

    /// Get the pitch class (0-11) for this note
    pub fn pitch_class(self) -> u8 {
        self as u8
    }

    /// Get note from pitch class
    pub fn from_pitch_class(pc: u8) -> Self {
        Note::ALL[(pc % 12) as usize]
    }

    /// Split a leading note name off `text`.
    ///
    /// Accepts a letter A-G in either case followed by at most one
    /// accidental (`#`, `b`, `♯`, `♭`). Returns the note and the number of
    /// bytes consumed.
    pub fn parse_prefix(text: &str) -> Option<(Self, usize)> {
        let mut chars = text.char_indices();
        let (_, letter) = chars.next()?;
        let natural = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };
        let mut consumed = letter.len_utf8();
        let mut pc = natural as i32;
        if let Some((idx, accidental)) = chars.next() {
            let shift = match accidental {
                '#' | '♯' => Some(1),
                'b' | '♭' => Some(-1),
                _ => None,
            };
            if let Some(shift) = shift {
                pc += shift;
                consumed = idx + accidental.len_utf8();
            }
        }
        Some((Note::from_pitch_class(pc.rem_euclid(12) as u8), consumed))
    }

    /// Parse a complete note name (e.g., "C", "c#", "Db", "B♭")
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match Note::parse_prefix(s) {
            Some((note, consumed)) if consumed == s.len() => Some(note),
            _ => None,
        }
    }

    /// Transpose by semitones, wrapping within the octave
    pub fn transpose(self, semitones: i32) -> Self {
        let new_pc = (self.pitch_class() as i32 + semitones).rem_euclid(12) as u8;
        Note::from_pitch_class(new_pc)
    }

    /// Name using sharps for black keys
    pub fn sharp_name(self) -> &'static str {
        SHARP_NAMES[self as usize]
    }

    /// Name using flats for black keys
    pub fn flat_name(self) -> &'static str {
        FLAT_NAMES[self as usize]
    }

    /// MIDI note number in the given octave (middle C = C4 = 60)
    pub fn midi(self, octave: i8) -> Option<MidiNote> {
        let midi = (octave as i16 + 1) * 12 + self.pitch_class() as i16;
        if !(0..=127).contains(&midi) {
            return None;
        }
        Some(midi as MidiNote)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sharp_name())
    }
}
