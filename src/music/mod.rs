// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory for chord charts.
//!
//! This module provides pitch classes, keys, chord symbols and the
//! pluggable theory used to parse, transpose and spell them.

pub mod chord;
pub mod key;
pub mod note;
pub mod theory;

pub use chord::{Chord, ChordQuality, Extension, TransposedChord};
pub use key::{Key, Mode};
pub use note::{MidiNote, Note};
pub use theory::{parse_chord, ChordTheory, StandardTheory};
