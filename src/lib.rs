// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Oligophony - chord-chart data model
//!
//! A song is an ordered sequence of measures and newline markers. Measures
//! hold one chord or nothing per beat. Chords are stored as typed and shifted
//! by the song's transposition when read, and every structural change is
//! announced on the song's event bus so renderers and players stay in sync.
//!
//! ```
//! use oligophony::{EventKind, Oligophony};
//!
//! let mut song = Oligophony::new();
//! song.subscribe(EventKind::TransposeChanged, |_, _| println!("re-read beats"));
//!
//! let id = song.add_measure(&["C", "Em", "F", "G"], None)?;
//! song.set_transpose(2)?;
//! assert_eq!(song.read_beat(id, 0)?.unwrap().symbol(), "D");
//! # Ok::<(), oligophony::ChartError>(())
//! ```
//!
//! The crate never installs a `tracing` subscriber; hosts choose where logs go.

pub mod chart;
pub mod config;
pub mod error;
pub mod events;
pub mod music;

pub use chart::{
    ChartData, Measure, MeasureEntry, MeasureId, Oligophony, Slot, SongId, TransposeTarget,
};
pub use config::{SongOptions, TimeSignature};
pub use error::{ChartError, ChartResult, ChordError};
pub use events::{EventBus, EventKind, SongEvent};
pub use music::{parse_chord, Chord, ChordTheory, StandardTheory, TransposedChord};
