// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord symbols.
//!
//! A [`Chord`] is a root, a triad quality, a list of extensions and an
//! optional bass note, plus the literal text it was read from. Chords are
//! values: transposition always builds a new chord and keeps `raw`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::key::Mode;
use super::note::{MidiNote, Note};
use super::theory::ChordTheory;
use crate::error::ChordError;

/// Triad quality of a chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Suspended2,
    Suspended4,
    /// Root and fifth only
    Power,
}

impl ChordQuality {
    /// Semitone offsets of the triad
    pub fn triad(self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::Suspended2 => &[0, 2, 7],
            ChordQuality::Suspended4 => &[0, 5, 7],
            ChordQuality::Power => &[0, 7],
        }
    }

    /// Key mode for major and minor chords
    pub fn mode(self) -> Option<Mode> {
        match self {
            ChordQuality::Major => Some(Mode::Major),
            ChordQuality::Minor => Some(Mode::Minor),
            _ => None,
        }
    }

    /// Get a human-readable name
    pub fn name(self) -> &'static str {
        match self {
            ChordQuality::Major => "major",
            ChordQuality::Minor => "minor",
            ChordQuality::Diminished => "diminished",
            ChordQuality::Augmented => "augmented",
            ChordQuality::Suspended2 => "suspended second",
            ChordQuality::Suspended4 => "suspended fourth",
            ChordQuality::Power => "power chord",
        }
    }

    fn marker(self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
            ChordQuality::Power => "5",
            // written after the extensions, as in "7sus4"
            ChordQuality::Suspended2 | ChordQuality::Suspended4 => "",
        }
    }
}

impl fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tones added on top of the triad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extension {
    /// Added sixth
    Sixth,
    /// Sixth plus ninth
    SixNine,
    /// Minor seventh stacked up to the given degree (7, 9, 11, 13)
    Dominant(u8),
    /// Major seventh stacked up to the given degree (7, 9, 11, 13)
    Major(u8),
    /// Single added degree without the seventh
    Add(u8),
    /// Lowered degree (b5, b9, b13)
    Flat(u8),
    /// Raised degree (#5, #9, #11)
    Sharp(u8),
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extension::Sixth => write!(f, "6"),
            Extension::SixNine => write!(f, "6/9"),
            Extension::Dominant(n) => write!(f, "{}", n),
            Extension::Major(n) => write!(f, "maj{}", n),
            Extension::Add(n) => write!(f, "add{}", n),
            Extension::Flat(n) => write!(f, "b{}", n),
            Extension::Sharp(n) => write!(f, "#{}", n),
        }
    }
}

/// Semitones above the root for a chord degree
fn degree_offset(degree: u8) -> Option<u8> {
    match degree {
        2 => Some(2),
        4 => Some(5),
        5 => Some(7),
        6 => Some(9),
        9 => Some(14),
        11 => Some(17),
        13 => Some(21),
        _ => None,
    }
}

// Checked in order, so longer tokens come first.
const QUALITY_MARKERS: &[(&str, ChordQuality)] = &[
    ("min", ChordQuality::Minor),
    ("mi", ChordQuality::Minor),
    ("dim", ChordQuality::Diminished),
    ("°", ChordQuality::Diminished),
    ("o", ChordQuality::Diminished),
    ("aug", ChordQuality::Augmented),
    ("+", ChordQuality::Augmented),
    ("sus2", ChordQuality::Suspended2),
    ("sus4", ChordQuality::Suspended4),
    ("sus", ChordQuality::Suspended4),
    ("5", ChordQuality::Power),
];

const EXTENSION_TOKENS: &[(&str, Option<Extension>)] = &[
    ("maj13", Some(Extension::Major(13))),
    ("maj11", Some(Extension::Major(11))),
    ("maj9", Some(Extension::Major(9))),
    ("maj7", Some(Extension::Major(7))),
    ("maj", None),
    ("M13", Some(Extension::Major(13))),
    ("M11", Some(Extension::Major(11))),
    ("M9", Some(Extension::Major(9))),
    ("M7", Some(Extension::Major(7))),
    ("M", None),
    ("Δ7", Some(Extension::Major(7))),
    ("Δ", Some(Extension::Major(7))),
    ("6/9", Some(Extension::SixNine)),
    ("69", Some(Extension::SixNine)),
    ("add13", Some(Extension::Add(13))),
    ("add11", Some(Extension::Add(11))),
    ("add9", Some(Extension::Add(9))),
    ("add4", Some(Extension::Add(4))),
    ("add2", Some(Extension::Add(2))),
    ("b13", Some(Extension::Flat(13))),
    ("b9", Some(Extension::Flat(9))),
    ("b5", Some(Extension::Flat(5))),
    ("#11", Some(Extension::Sharp(11))),
    ("#9", Some(Extension::Sharp(9))),
    ("#5", Some(Extension::Sharp(5))),
    ("13", Some(Extension::Dominant(13))),
    ("11", Some(Extension::Dominant(11))),
    ("9", Some(Extension::Dominant(9))),
    ("7", Some(Extension::Dominant(7))),
    ("6", Some(Extension::Sixth)),
];

/// A parsed chord symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    root: Note,
    quality: ChordQuality,
    extensions: Vec<Extension>,
    bass: Option<Note>,
    /// Literal text the chord was read from
    raw: String,
}

impl Chord {
    /// Create a plain triad; `raw` starts empty
    pub fn new(root: Note, quality: ChordQuality) -> Self {
        Self {
            root,
            quality,
            extensions: Vec::new(),
            bass: None,
            raw: String::new(),
        }
    }

    /// Builder: add an extension
    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Builder: set the bass note
    pub fn with_bass(mut self, bass: Note) -> Self {
        self.bass = Some(bass);
        self
    }

    /// Builder: set the literal text
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }

    /// Parse a chord symbol with the built-in grammar.
    ///
    /// Does not understand the dash minor form; see
    /// [`parse_chord`](super::theory::parse_chord).
    pub fn parse(symbol: &str) -> Result<Self, ChordError> {
        let text = symbol.trim();
        if text.is_empty() {
            return Err(ChordError::Empty);
        }

        let (root, consumed) = Note::parse_prefix(text)
            .ok_or_else(|| ChordError::malformed(symbol, "missing root note"))?;
        let normalized = text[consumed..].replace('♭', "b").replace('♯', "#");
        let mut rest = normalized.as_str();

        let mut bass = None;
        if let Some(idx) = rest.rfind('/') {
            if let Some(note) = Note::parse(&rest[idx + 1..]) {
                bass = Some(note);
                rest = &rest[..idx];
            }
        }

        let mut quality = ChordQuality::Major;
        if !rest.starts_with("maj") {
            let marker = QUALITY_MARKERS
                .iter()
                .find(|(token, _)| rest.starts_with(token))
                .copied()
                .or_else(|| rest.starts_with('m').then_some(("m", ChordQuality::Minor)));
            if let Some((token, q)) = marker {
                quality = q;
                rest = &rest[token.len()..];
            }
        }

        let mut extensions = Vec::new();
        while !rest.is_empty() {
            if let Some(stripped) = rest.strip_prefix(&['(', ')', ',', ' '][..]) {
                rest = stripped;
                continue;
            }
            if let Some(stripped) = rest.strip_prefix("sus") {
                if quality != ChordQuality::Major {
                    return Err(ChordError::malformed(
                        symbol,
                        format!("cannot suspend a {} chord", quality),
                    ));
                }
                let (q, len) = match stripped.chars().next() {
                    Some('2') => (ChordQuality::Suspended2, 1),
                    Some('4') => (ChordQuality::Suspended4, 1),
                    _ => (ChordQuality::Suspended4, 0),
                };
                quality = q;
                rest = &stripped[len..];
                continue;
            }
            let (token, extension) = EXTENSION_TOKENS
                .iter()
                .find(|(token, _)| rest.starts_with(token))
                .ok_or_else(|| ChordError::malformed(symbol, format!("unexpected `{}`", rest)))?;
            if let Some(extension) = extension {
                extensions.push(*extension);
            }
            rest = &rest[token.len()..];
        }

        Ok(Self {
            root,
            quality,
            extensions,
            bass,
            raw: symbol.to_string(),
        })
    }

    /// Get the root note
    pub fn root(&self) -> Note {
        self.root
    }

    /// Get the triad quality
    pub fn quality(&self) -> ChordQuality {
        self.quality
    }

    /// Get the extensions in written order
    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    /// Get the bass note of a slash chord
    pub fn bass(&self) -> Option<Note> {
        self.bass
    }

    /// Get the literal text
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Copy shifted by `semitones`, wrapping within the octave
    pub fn transposed(&self, semitones: i32) -> Self {
        Self {
            root: self.root.transpose(semitones),
            bass: self.bass.map(|b| b.transpose(semitones)),
            ..self.clone()
        }
    }

    /// Everything after the root and before the bass, e.g. "m7" or "7sus4"
    pub fn suffix(&self) -> String {
        let mut out = String::from(self.quality.marker());
        for ext in &self.extensions {
            out.push_str(&ext.to_string());
        }
        match self.quality {
            ChordQuality::Suspended2 => out.push_str("sus2"),
            ChordQuality::Suspended4 => out.push_str("sus4"),
            _ => {}
        }
        out
    }

    /// Chord tones as semitone offsets from the root, ascending
    pub fn intervals(&self) -> Vec<u8> {
        let mut tones: Vec<u8> = self.quality.triad().to_vec();
        let seventh = if self.quality == ChordQuality::Diminished { 9 } else { 10 };

        for ext in &self.extensions {
            match *ext {
                Extension::Sixth => tones.push(9),
                Extension::SixNine => tones.extend([9, 14]),
                Extension::Dominant(n) | Extension::Major(n) => {
                    let is_major = matches!(ext, Extension::Major(_));
                    tones.push(if is_major { 11 } else { seventh });
                    tones.extend([9, 11, 13].iter().filter(|&&d| d <= n).filter_map(|&d| degree_offset(d)));
                }
                Extension::Add(n) => tones.extend(degree_offset(n)),
                Extension::Flat(n) | Extension::Sharp(n) => {
                    if let Some(natural) = degree_offset(n) {
                        tones.retain(|&t| t != natural);
                        let altered = if matches!(ext, Extension::Flat(_)) {
                            natural - 1
                        } else {
                            natural + 1
                        };
                        tones.push(altered);
                    }
                }
            }
        }

        tones.sort_unstable();
        tones.dedup();
        tones
    }

    /// MIDI notes with the root in `octave`; a bass note sounds an octave lower
    pub fn midi_notes(&self, octave: i8) -> Vec<MidiNote> {
        let Some(root) = self.root.midi(octave) else {
            return Vec::new();
        };
        let mut notes: Vec<MidiNote> = self
            .bass
            .and_then(|b| b.midi(octave.saturating_sub(1)))
            .into_iter()
            .collect();
        notes.extend(
            self.intervals()
                .into_iter()
                .filter_map(|i| root.checked_add(i))
                .filter(|&n| n <= 127),
        );
        notes
    }
}

/// A stored chord as seen through the current transposition.
///
/// `raw_root` is the root spelling to display: the user's own spelling when
/// no transposition is in effect, the theory's default spelling otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransposedChord {
    chord: Chord,
    raw_root: String,
    bass_name: Option<String>,
}

impl TransposedChord {
    /// Read `stored` shifted by `transpose` semitones
    pub fn read(stored: &Chord, transpose: i32, theory: &dyn ChordTheory) -> Self {
        let chord = theory.transpose(stored, transpose);
        let raw = stored.raw();

        let raw_root = if transpose != 0 {
            theory.spell(chord.root())
        } else if matches!(raw.chars().nth(1), Some('#' | '♯')) {
            let first: String = raw.chars().take(1).flat_map(char::to_uppercase).collect();
            first + "#"
        } else {
            theory.spell(stored.root())
        };

        let bass_name = chord.bass().map(|bass| {
            let typed = raw
                .rsplit_once('/')
                .map(|(_, b)| b.trim())
                .filter(|b| Note::parse(b) == Some(bass));
            match typed {
                Some(b) if transpose == 0 => {
                    let mut chars = b.chars();
                    chars
                        .next()
                        .map(|c| c.to_ascii_uppercase().to_string() + chars.as_str())
                        .unwrap_or_default()
                }
                _ => theory.spell(bass),
            }
        });

        Self {
            chord,
            raw_root,
            bass_name,
        }
    }

    /// Get the transposed chord
    pub fn chord(&self) -> &Chord {
        &self.chord
    }

    /// Get the root spelling to display
    pub fn raw_root(&self) -> &str {
        &self.raw_root
    }

    /// Get the literal text of the stored chord
    pub fn raw(&self) -> &str {
        self.chord.raw()
    }

    /// Get the transposed root
    pub fn root(&self) -> Note {
        self.chord.root()
    }

    /// Full symbol to display, e.g. "Bbm7/F"
    pub fn symbol(&self) -> String {
        let mut out = format!("{}{}", self.raw_root, self.chord.suffix());
        if let Some(bass) = &self.bass_name {
            out.push('/');
            out.push_str(bass);
        }
        out
    }
}

impl fmt::Display for TransposedChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol())
    }
}
