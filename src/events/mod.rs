// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Change notifications for chart consumers.
//!
//! This module provides:
//! - A generic observer registry with one-time replay ([`EventBus`])
//! - The events a song emits ([`SongEvent`]) and their kinds ([`EventKind`])

pub mod bus;

pub use bus::{BusEvent, Callback, EventBus, Registration};

use std::fmt;

use crate::chart::MeasureId;

/// Events emitted by a song
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SongEvent {
    /// A measure was created and placed in the sequence
    MeasureCreated(MeasureId),
    /// A measure changed position
    MeasureMoved(MeasureId),
    /// A measure was destroyed
    MeasureRemoved(MeasureId),
    /// One beat slot of a measure was replaced
    BeatChanged { measure: MeasureId, slot: usize },
    /// A newline marker was inserted
    NewlineAdded,
    /// A newline marker was removed
    NewlineRemoved,
    /// The transposition changed; stored beats must be re-read
    TransposeChanged,
    /// A bulk import finished
    Imported,
    /// The renderer finished loading
    ViewerReady,
    /// The playback engine finished loading
    PlayerReady,
}

/// Kinds of [`SongEvent`], used to subscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MeasureCreated,
    MeasureMoved,
    MeasureRemoved,
    BeatChanged,
    NewlineAdded,
    NewlineRemoved,
    TransposeChanged,
    Imported,
    ViewerReady,
    PlayerReady,
}

impl EventKind {
    /// All kinds a song registers
    pub const ALL: [EventKind; 10] = [
        EventKind::MeasureCreated,
        EventKind::MeasureMoved,
        EventKind::MeasureRemoved,
        EventKind::BeatChanged,
        EventKind::NewlineAdded,
        EventKind::NewlineRemoved,
        EventKind::TransposeChanged,
        EventKind::Imported,
        EventKind::ViewerReady,
        EventKind::PlayerReady,
    ];

    /// Whether late subscribers get the last event replayed
    pub fn is_one_time(self) -> bool {
        matches!(self, EventKind::ViewerReady | EventKind::PlayerReady)
    }

    /// Dotted event name, e.g. "Measure.create"
    pub fn name(self) -> &'static str {
        match self {
            EventKind::MeasureCreated => "Measure.create",
            EventKind::MeasureMoved => "Measure.move",
            EventKind::MeasureRemoved => "Measure.remove",
            EventKind::BeatChanged => "Measure.beat",
            EventKind::NewlineAdded => "Oligophony.addNewline",
            EventKind::NewlineRemoved => "Oligophony.removeNewline",
            EventKind::TransposeChanged => "Oligophony.transpose",
            EventKind::Imported => "Oligophony.import",
            EventKind::ViewerReady => "Viewer.ready",
            EventKind::PlayerReady => "Player.ready",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl SongEvent {
    /// Measure carried by the event, if any
    pub fn measure(&self) -> Option<MeasureId> {
        match self {
            SongEvent::MeasureCreated(id)
            | SongEvent::MeasureMoved(id)
            | SongEvent::MeasureRemoved(id) => Some(*id),
            SongEvent::BeatChanged { measure, .. } => Some(*measure),
            _ => None,
        }
    }
}

impl BusEvent for SongEvent {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        match self {
            SongEvent::MeasureCreated(_) => EventKind::MeasureCreated,
            SongEvent::MeasureMoved(_) => EventKind::MeasureMoved,
            SongEvent::MeasureRemoved(_) => EventKind::MeasureRemoved,
            SongEvent::BeatChanged { .. } => EventKind::BeatChanged,
            SongEvent::NewlineAdded => EventKind::NewlineAdded,
            SongEvent::NewlineRemoved => EventKind::NewlineRemoved,
            SongEvent::TransposeChanged => EventKind::TransposeChanged,
            SongEvent::Imported => EventKind::Imported,
            SongEvent::ViewerReady => EventKind::ViewerReady,
            SongEvent::PlayerReady => EventKind::PlayerReady,
        }
    }
}
