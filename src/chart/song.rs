// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The song aggregate.
//!
//! A song owns its metadata, an arena of measures, the ordered sequence of
//! measure handles and newline markers, and the event bus its consumers
//! subscribe to. Stored chords are never rewritten by transposition; beats
//! are shifted on read.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use super::import::{ChartData, MeasureEntry};
use super::measure::{parse_beats, Measure, MeasureId};
use crate::config::{SongOptions, TimeSignature};
use crate::error::{ChartError, ChartResult};
use crate::events::{EventBus, EventKind, SongEvent};
use crate::music::{parse_chord, Chord, ChordTheory, Key, StandardTheory, TransposedChord};

static NEXT_SONG_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a song, used to reject handles of other songs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SongId(u64);

impl SongId {
    pub(crate) fn next() -> Self {
        SongId(NEXT_SONG_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "song #{}", self.0)
    }
}

/// One element of the measure sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// A live measure of this song
    Measure(MeasureId),
    /// A row break with no musical content
    Newline,
}

impl Slot {
    /// Measure handle, if this slot holds one
    pub fn measure(&self) -> Option<MeasureId> {
        match self {
            Slot::Measure(id) => Some(*id),
            Slot::Newline => None,
        }
    }

    /// Whether this slot is a newline marker
    pub fn is_newline(&self) -> bool {
        matches!(self, Slot::Newline)
    }
}

/// Requested transposition: a semitone count or a target key symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransposeTarget {
    Semitones(i32),
    Key(String),
}

impl From<i32> for TransposeTarget {
    fn from(semitones: i32) -> Self {
        TransposeTarget::Semitones(semitones)
    }
}

impl From<&str> for TransposeTarget {
    fn from(key: &str) -> Self {
        TransposeTarget::Key(key.to_string())
    }
}

impl From<String> for TransposeTarget {
    fn from(key: String) -> Self {
        TransposeTarget::Key(key)
    }
}

/// A chord chart: metadata, measures and row breaks
#[derive(Debug)]
pub struct Oligophony {
    id: SongId,
    title: String,
    composer: String,
    key: String,
    time_signature: TimeSignature,
    transpose: i32,
    measures: Vec<Option<Measure>>,
    free: Vec<MeasureId>,
    sequence: Vec<Slot>,
    events: EventBus<SongEvent, Oligophony>,
    theory: Box<dyn ChordTheory>,
}

impl Oligophony {
    /// Create an empty song in C, 4/4, untransposed
    pub fn new() -> Self {
        Self::build(SongOptions::default(), Box::new(StandardTheory))
    }

    /// Create an empty song from options
    pub fn with_options(options: SongOptions) -> ChartResult<Self> {
        Self::with_theory(options, Box::new(StandardTheory))
    }

    /// Create an empty song that parses and spells chords with `theory`
    pub fn with_theory(options: SongOptions, theory: Box<dyn ChordTheory>) -> ChartResult<Self> {
        if let Err(err) = options.time_signature.validate() {
            warn!(time_signature = %options.time_signature, "rejected song options");
            return Err(err);
        }
        Ok(Self::build(options, theory))
    }

    fn build(options: SongOptions, theory: Box<dyn ChordTheory>) -> Self {
        let mut events = EventBus::new();
        for kind in EventKind::ALL {
            events.register(kind, kind.is_one_time());
        }

        let song = Self {
            id: SongId::next(),
            title: String::new(),
            composer: String::new(),
            key: "C".to_string(),
            time_signature: options.time_signature,
            transpose: options.transpose.rem_euclid(12),
            measures: Vec::new(),
            free: Vec::new(),
            sequence: Vec::new(),
            events,
            theory,
        };
        debug!(
            song = %song.id,
            time_signature = %song.time_signature,
            transpose = song.transpose,
            "created song"
        );
        song
    }

    /// Get the song's identity
    pub fn id(&self) -> SongId {
        self.id
    }

    /// Get song title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set song title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Get composer
    pub fn composer(&self) -> &str {
        &self.composer
    }

    /// Set composer
    pub fn set_composer(&mut self, composer: impl Into<String>) {
        self.composer = composer.into();
    }

    /// Original key as a chord symbol, e.g. "C" or "F#m"
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Set the original key. The symbol must parse as a chord.
    pub fn set_key(&mut self, key: &str) -> ChartResult<()> {
        self.check_key(key)?;
        self.key = key.to_string();
        Ok(())
    }

    fn check_key(&self, key: &str) -> ChartResult<Chord> {
        parse_chord(self.theory.as_ref(), key).map_err(|source| {
            warn!(key, "rejected key");
            ChartError::InvalidKey {
                key: key.to_string(),
                source,
            }
        })
    }

    /// Get time signature
    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    /// Set the time signature used to size new measures.
    ///
    /// Existing measures keep the size they were created with.
    pub fn set_time_signature(&mut self, time_signature: TimeSignature) -> ChartResult<()> {
        time_signature.validate()?;
        self.time_signature = time_signature;
        Ok(())
    }

    /// Current transposition in semitones, always in `0..12`
    pub fn transpose(&self) -> i32 {
        self.transpose
    }

    /// Theory used to parse, shift and spell chords
    pub fn theory(&self) -> &dyn ChordTheory {
        self.theory.as_ref()
    }

    /// Set the transposition, either directly or by naming a target key.
    ///
    /// Returns the stored semitone count and dispatches `TransposeChanged`.
    pub fn set_transpose(&mut self, target: impl Into<TransposeTarget>) -> ChartResult<i32> {
        let semitones = match target.into() {
            TransposeTarget::Semitones(semitones) => semitones,
            TransposeTarget::Key(key) => self.semitones_to_key(&key)?,
        };
        self.transpose = semitones.rem_euclid(12);
        debug!(song = %self.id, transpose = self.transpose, "transpose changed");
        self.dispatch(SongEvent::TransposeChanged);
        Ok(self.transpose)
    }

    /// Semitones that move the original key to `target`.
    ///
    /// A target of the other mode is read as its relative key, so C to Am
    /// and Am to C are both 0. Only major and minor chords are understood.
    pub fn semitones_to_key(&self, target: &str) -> ChartResult<i32> {
        let original = self.check_key(&self.key)?;
        let wanted = self.check_key(target)?;
        let from = self.key_of(&original, &self.key)?;
        let to = self.key_of(&wanted, target)?.in_mode(from.mode());
        Ok(self.theory.semitones(from.root(), to.root()).rem_euclid(12))
    }

    fn key_of(&self, chord: &Chord, symbol: &str) -> ChartResult<Key> {
        let mode = chord.quality().mode().ok_or_else(|| {
            warn!(symbol, quality = %chord.quality(), "unsupported transpose target");
            ChartError::UnsupportedQuality {
                symbol: symbol.to_string(),
                quality: chord.quality(),
            }
        })?;
        Ok(Key::new(chord.root(), mode))
    }

    /// Create a measure from chord texts and place it.
    ///
    /// The measure has one slot per beat of the current time signature;
    /// extra texts are ignored and missing or blank ones leave the slot
    /// empty. Without an index the measure is appended. With one it is
    /// placed like [`Oligophony::reposition_measure`], which dispatches
    /// `MeasureMoved` before `MeasureCreated`.
    pub fn add_measure<S: AsRef<str>>(
        &mut self,
        chords: &[S],
        index: Option<usize>,
    ) -> ChartResult<MeasureId> {
        let beats = parse_beats(
            self.theory.as_ref(),
            self.time_signature.beats(),
            chords.iter().map(Some),
        )
        .inspect_err(|err| warn!(song = %self.id, error = %err, "rejected measure"))?;
        Ok(self.create_measure(beats, index))
    }

    fn create_measure(&mut self, beats: Vec<Option<Chord>>, index: Option<usize>) -> MeasureId {
        let id = match self.free.pop() {
            Some(removed) => {
                let id = removed.reuse();
                if let Some(slot) = self.measures.get_mut(id.index()) {
                    *slot = Some(Measure::new(id, beats));
                }
                id
            }
            None => {
                let id = MeasureId::new(self.id, self.measures.len());
                self.measures.push(Some(Measure::new(id, beats)));
                id
            }
        };

        let position = match index {
            Some(index) => self.move_measure(id, index),
            None => self.insert_slot(self.sequence.len(), Slot::Measure(id)),
        };
        debug!(measure = %id, position, "created measure");
        self.dispatch(SongEvent::MeasureCreated(id));
        id
    }

    /// Move a measure to `index`, returning where it landed.
    ///
    /// A measure already in the sequence that moves forward lands one place
    /// before `index`, as if `index` was counted before it was taken out. A
    /// detached measure is inserted at `index` as given; it is not treated
    /// as sitting at position -1, which would put a move to 0 before the
    /// last element.
    pub fn reposition_measure(&mut self, id: MeasureId, index: usize) -> ChartResult<usize> {
        self.measure(id)?;
        Ok(self.move_measure(id, index))
    }

    fn move_measure(&mut self, id: MeasureId, index: usize) -> usize {
        let current = self.measure_index(id);
        if let Some(current) = current {
            self.sequence.remove(current);
        }
        let target = match current {
            Some(current) if index > current => index - 1,
            _ => index,
        };
        let position = self.insert_slot(target, Slot::Measure(id));
        debug!(measure = %id, from = ?current, to = position, "moved measure");
        self.dispatch(SongEvent::MeasureMoved(id));
        position
    }

    fn insert_slot(&mut self, index: usize, slot: Slot) -> usize {
        let position = index.min(self.sequence.len());
        self.sequence.insert(position, slot);
        position
    }

    /// Position of a measure in the sequence, `None` when detached
    pub fn measure_index(&self, id: MeasureId) -> Option<usize> {
        self.sequence
            .iter()
            .position(|slot| *slot == Slot::Measure(id))
    }

    /// Take a measure out of the sequence without destroying it.
    ///
    /// Returns its former position. The measure can be placed again with
    /// [`Oligophony::reposition_measure`].
    pub fn detach_measure(&mut self, id: MeasureId) -> ChartResult<Option<usize>> {
        self.measure(id)?;
        let position = self.measure_index(id);
        if let Some(position) = position {
            self.sequence.remove(position);
            debug!(measure = %id, position, "detached measure");
            self.dispatch(SongEvent::MeasureMoved(id));
        }
        Ok(position)
    }

    /// Destroy a measure and drop it from the sequence
    pub fn remove_measure(&mut self, id: MeasureId) -> ChartResult<Measure> {
        self.measure(id)?;
        if let Some(position) = self.measure_index(id) {
            self.sequence.remove(position);
        }
        let measure = self
            .measures
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(ChartError::UnknownMeasure(id))?;
        self.free.push(id);
        debug!(measure = %id, "removed measure");
        self.dispatch(SongEvent::MeasureRemoved(id));
        Ok(measure)
    }

    /// Insert a newline marker, appending without an index.
    ///
    /// Returns the marker's position.
    pub fn add_newline(&mut self, index: Option<usize>) -> usize {
        let position = self.insert_slot(index.unwrap_or(self.sequence.len()), Slot::Newline);
        debug!(song = %self.id, position, "added newline");
        self.dispatch(SongEvent::NewlineAdded);
        position
    }

    /// Remove the newline marker at `index`
    pub fn remove_newline(&mut self, index: usize) -> ChartResult<()> {
        if self.sequence.get(index) != Some(&Slot::Newline) {
            warn!(song = %self.id, index, "no newline to remove");
            return Err(ChartError::NotANewline(index));
        }
        self.sequence.remove(index);
        debug!(song = %self.id, index, "removed newline");
        self.dispatch(SongEvent::NewlineRemoved);
        Ok(())
    }

    /// Replace one beat slot; `None` or blank text empties it
    pub fn set_beat(&mut self, id: MeasureId, slot: usize, chord: Option<&str>) -> ChartResult<()> {
        let chord = match chord.filter(|text| !text.trim().is_empty()) {
            Some(text) => Some(parse_chord(self.theory.as_ref(), text).map_err(|source| {
                warn!(measure = %id, slot, raw = text, "rejected beat");
                ChartError::MalformedChord {
                    slot,
                    raw: text.to_string(),
                    source,
                }
            })?),
            None => None,
        };
        self.measure_mut(id)?.set_beat(slot, chord)?;
        debug!(measure = %id, slot, "beat changed");
        self.dispatch(SongEvent::BeatChanged { measure: id, slot });
        Ok(())
    }

    /// Read a beat shifted by the current transposition
    pub fn read_beat(&self, id: MeasureId, slot: usize) -> ChartResult<Option<TransposedChord>> {
        self.measure(id)?
            .read_beat(slot, self.transpose, self.theory.as_ref())
    }

    /// Look up a live measure of this song
    pub fn measure(&self, id: MeasureId) -> ChartResult<&Measure> {
        self.measures
            .get(id.index())
            .and_then(Option::as_ref)
            .filter(|measure| measure.id() == id)
            .ok_or(ChartError::UnknownMeasure(id))
    }

    fn measure_mut(&mut self, id: MeasureId) -> ChartResult<&mut Measure> {
        self.measures
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .filter(|measure| measure.id() == id)
            .ok_or(ChartError::UnknownMeasure(id))
    }

    /// The sequence of measures and newline markers
    pub fn sequence(&self) -> &[Slot] {
        &self.sequence
    }

    /// Measures in sequence order, skipping newline markers
    pub fn measures(&self) -> impl Iterator<Item = &Measure> + '_ {
        self.sequence
            .iter()
            .filter_map(Slot::measure)
            .filter_map(|id| self.measure(id).ok())
    }

    /// Number of measures in the sequence
    pub fn measure_count(&self) -> usize {
        self.sequence.iter().filter(|slot| !slot.is_newline()).count()
    }

    /// Split the sequence into display rows at newline markers.
    ///
    /// `n` markers always give `n + 1` rows, so adjacent markers leave an
    /// empty row between them.
    pub fn rows(&self) -> Vec<Vec<MeasureId>> {
        self.sequence
            .split(|slot| slot.is_newline())
            .map(|row| row.iter().filter_map(Slot::measure).collect())
            .collect()
    }

    /// Append measures and newline markers in entry order.
    ///
    /// A non-empty list becomes a measure; `None` or an empty list becomes a
    /// newline. Every entry is parsed before anything is appended.
    pub fn parse_sequence(&mut self, entries: &[MeasureEntry]) -> ChartResult<()> {
        let parsed = self.parse_entries(entries, self.time_signature)?;
        self.append_entries(parsed);
        Ok(())
    }

    fn parse_entries(
        &self,
        entries: &[MeasureEntry],
        time_signature: TimeSignature,
    ) -> ChartResult<Vec<Option<Vec<Option<Chord>>>>> {
        entries
            .iter()
            .enumerate()
            .map(|(entry, chords)| match chords {
                Some(chords) if !chords.is_empty() => parse_beats(
                    self.theory.as_ref(),
                    time_signature.beats(),
                    chords.iter().map(Option::as_deref),
                )
                .map(Some)
                .map_err(|err| {
                    warn!(song = %self.id, entry, error = %err, "rejected chart entry");
                    ChartError::InvalidEntry {
                        entry,
                        source: Box::new(err),
                    }
                }),
                _ => Ok(None),
            })
            .collect()
    }

    fn append_entries(&mut self, entries: Vec<Option<Vec<Option<Chord>>>>) {
        for entry in entries {
            match entry {
                Some(beats) => {
                    self.create_measure(beats, None);
                }
                None => {
                    self.add_newline(None);
                }
            }
        }
    }

    /// Load a chart, keeping any metadata the chart leaves out.
    ///
    /// The time signature, key and every chord are checked before the song
    /// changes, so a failed import leaves it as it was. Measures already in
    /// the song keep their size. Dispatches `Imported` at the end.
    pub fn import(&mut self, data: &ChartData) -> ChartResult<()> {
        let time_signature = data.time_signature.unwrap_or(self.time_signature);
        if let Err(err) = time_signature.validate() {
            warn!(song = %self.id, %time_signature, "rejected import");
            return Err(err);
        }
        let key = data.key.as_deref().filter(|key| !key.is_empty());
        if let Some(key) = key {
            self.check_key(key)?;
        }
        let entries = self.parse_entries(&data.chords, time_signature)?;

        if let Some(title) = data.title.as_deref().filter(|t| !t.is_empty()) {
            self.title = title.to_string();
        }
        if let Some(composer) = data.composer.as_deref().filter(|c| !c.is_empty()) {
            self.composer = composer.to_string();
        }
        if let Some(key) = key {
            self.key = key.to_string();
        }
        self.time_signature = time_signature;
        self.append_entries(entries);

        debug!(
            song = %self.id,
            entries = data.chords.len(),
            measures = self.measure_count(),
            "imported chart"
        );
        self.dispatch(SongEvent::Imported);
        Ok(())
    }

    /// Export the current state as chart data, spelled as typed
    pub fn export(&self) -> ChartData {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        let chords = self
            .sequence
            .iter()
            .map(|slot| match slot {
                Slot::Measure(id) => self.measure(*id).ok().map(Measure::raw_beats),
                Slot::Newline => None,
            })
            .collect();

        ChartData {
            title: non_empty(&self.title),
            composer: non_empty(&self.composer),
            time_signature: Some(self.time_signature),
            key: Some(self.key.clone()),
            chords,
        }
    }

    /// Subscribe to one kind of song event.
    ///
    /// Callbacks get the song along with the event, so a consumer can re-read
    /// beats on `TransposeChanged` or announce its own events. Read through
    /// that reference: a host keeping the song in a `RefCell` still holds the
    /// mutable borrow of the mutator that is dispatching.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F)
    where
        F: Fn(&Oligophony, &SongEvent) + 'static,
    {
        self.events.subscribe(kind, self, callback);
    }

    /// Dispatch an event on behalf of a collaborator, e.g. `ViewerReady`
    pub fn announce(&self, event: SongEvent) -> bool {
        self.dispatch(event)
    }

    fn dispatch(&self, event: SongEvent) -> bool {
        self.events.dispatch(self, event)
    }

    /// Read access to the event bus
    pub fn events(&self) -> &EventBus<SongEvent, Oligophony> {
        &self.events
    }
}

impl Default for Oligophony {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChordError;
    use crate::music::{ChordQuality, Note};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn entry(chords: &[&str]) -> MeasureEntry {
        Some(chords.iter().map(|c| Some(c.to_string())).collect())
    }

    fn record(song: &Oligophony, kinds: &[EventKind]) -> Rc<RefCell<Vec<SongEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        for &kind in kinds {
            let sink = Rc::clone(&log);
            song.subscribe(kind, move |_, e| sink.borrow_mut().push(e.clone()));
        }
        log
    }

    fn roots(song: &Oligophony, id: MeasureId) -> Vec<Option<Note>> {
        let measure = song.measure(id).unwrap();
        (0..measure.beat_count())
            .map(|slot| song.read_beat(id, slot).unwrap().map(|c| c.root()))
            .collect()
    }

    #[test]
    fn test_new_song_defaults() {
        let song = Oligophony::new();
        assert_eq!(song.title(), "");
        assert_eq!(song.composer(), "");
        assert_eq!(song.key(), "C");
        assert_eq!(song.time_signature(), TimeSignature::new(4, 4));
        assert_eq!(song.transpose(), 0);
        assert!(song.sequence().is_empty());
        for kind in EventKind::ALL {
            let reg = song.events().registration(kind).unwrap();
            assert_eq!(reg.is_one_time(), kind.is_one_time());
        }
    }

    #[test]
    fn test_with_options() {
        let options = SongOptions::default()
            .with_time_signature(3, 4)
            .with_transpose(-1);
        let song = Oligophony::with_options(options).unwrap();
        assert_eq!(song.time_signature().beats(), 3);
        assert_eq!(song.transpose(), 11);

        let bad = SongOptions::default().with_time_signature(0, 4);
        assert!(matches!(
            Oligophony::with_options(bad),
            Err(ChartError::InvalidTimeSignature { .. })
        ));
    }

    #[test]
    fn test_parse_sequence_scenario() {
        let mut song = Oligophony::new();
        song.parse_sequence(&[entry(&["C", "Em", "F", "G"]), None, entry(&["Am"])])
            .unwrap();

        let sequence = song.sequence();
        assert_eq!(sequence.len(), 3);
        assert!(sequence[1].is_newline());

        let first = sequence[0].measure().unwrap();
        let last = sequence[2].measure().unwrap();
        assert_eq!(
            roots(&song, first),
            vec![Some(Note::C), Some(Note::E), Some(Note::F), Some(Note::G)]
        );
        assert_eq!(roots(&song, last), vec![Some(Note::A), None, None, None]);
        assert_eq!(
            song.measure(last).unwrap().stored_beat(0).unwrap().quality(),
            ChordQuality::Minor
        );
    }

    #[test]
    fn test_measure_capacity_ignores_supplied_count() {
        let mut song = Oligophony::with_options(SongOptions::default().with_time_signature(3, 4))
            .unwrap();
        let short = song.add_measure(&["C"], None).unwrap();
        let long = song.add_measure(&["C", "D", "E", "F", "G"], None).unwrap();
        let empty = song.add_measure::<&str>(&[], None).unwrap();
        for id in [short, long, empty] {
            assert_eq!(song.measure(id).unwrap().beat_count(), 3);
        }
    }

    #[test]
    fn test_empty_list_entry_is_newline() {
        let mut song = Oligophony::new();
        song.parse_sequence(&[Some(Vec::new()), entry(&["D"])]).unwrap();
        assert!(song.sequence()[0].is_newline());
        assert_eq!(song.measure_count(), 1);
    }

    #[test]
    fn test_transpose_by_semitones() {
        let mut song = Oligophony::new();
        let id = song.add_measure(&["C"], None).unwrap();

        assert_eq!(song.set_transpose(2).unwrap(), 2);
        let read = song.read_beat(id, 0).unwrap().unwrap();
        assert_eq!(read.root(), Note::D);
        assert_eq!(read.raw_root(), "D");

        assert_eq!(song.set_transpose(-1).unwrap(), 11);
        assert_eq!(song.set_transpose(14).unwrap(), 2);
        assert_eq!(song.set_transpose(-13).unwrap(), 11);

        // the stored chord is untouched
        assert_eq!(song.measure(id).unwrap().stored_beat(0).unwrap().root(), Note::C);
    }

    #[test]
    fn test_transpose_round_trip() {
        let mut song = Oligophony::new();
        let id = song.add_measure(&["Eb7", "F#m"], None).unwrap();
        for t in 0..12 {
            song.set_transpose(t).unwrap();
            for slot in 0..2 {
                let stored = song.measure(id).unwrap().stored_beat(slot).unwrap().root();
                let read = song.read_beat(id, slot).unwrap().unwrap();
                let back = song.theory().transpose(read.chord(), (-t).rem_euclid(12));
                assert_eq!(back.root(), stored);
            }
        }
    }

    #[test]
    fn test_transpose_to_key() {
        let mut song = Oligophony::new();
        assert_eq!(song.set_transpose("D").unwrap(), 2);
        assert_eq!(song.set_transpose("Bb").unwrap(), 10);
        // relative minor of C needs no shift
        assert_eq!(song.set_transpose("Am").unwrap(), 0);
        // E minor is the relative of G major
        assert_eq!(song.set_transpose("Em").unwrap(), 7);

        song.set_key("Am").unwrap();
        assert_eq!(song.set_transpose("C").unwrap(), 0);
        assert_eq!(song.set_transpose("Bm").unwrap(), 2);
        assert_eq!(song.set_transpose("D").unwrap(), 2);
        assert_eq!(song.set_transpose(String::from("Dm")).unwrap(), 5);
    }

    #[test]
    fn test_transpose_unsupported_quality() {
        let mut song = Oligophony::new();
        let log = record(&song, &[EventKind::TransposeChanged]);

        let err = song.set_transpose("Bdim").unwrap_err();
        assert_eq!(
            err,
            ChartError::UnsupportedQuality {
                symbol: "Bdim".to_string(),
                quality: ChordQuality::Diminished
            }
        );
        assert!(matches!(
            song.set_transpose("H7"),
            Err(ChartError::InvalidKey { .. })
        ));
        assert_eq!(song.transpose(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_transpose_dispatches() {
        let mut song = Oligophony::new();
        let log = record(&song, &[EventKind::TransposeChanged]);
        song.set_transpose(5).unwrap();
        song.set_transpose(5).unwrap();
        assert_eq!(
            *log.borrow(),
            vec![SongEvent::TransposeChanged, SongEvent::TransposeChanged]
        );
    }

    #[test]
    fn test_callbacks_read_song_during_dispatch() {
        let mut song = Oligophony::new();
        let id = song.add_measure(&["C", "G"], None).unwrap();

        let shown = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&shown);
        song.subscribe(EventKind::TransposeChanged, move |song, _| {
            let symbols = (0..2)
                .filter_map(|slot| song.read_beat(id, slot).ok().flatten())
                .map(|chord| chord.symbol());
            sink.borrow_mut().extend(symbols);
        });
        let gone = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&gone);
        song.subscribe(EventKind::MeasureRemoved, move |song, e| {
            if let Some(measure) = e.measure() {
                *sink.borrow_mut() = Some(song.measure(measure).is_err());
            }
        });

        song.set_transpose(2).unwrap();
        assert_eq!(*shown.borrow(), vec!["D".to_string(), "A".to_string()]);

        song.remove_measure(id).unwrap();
        assert_eq!(*gone.borrow(), Some(true));
    }

    #[test]
    fn test_reposition_rules() {
        let mut song = Oligophony::new();
        let a = song.add_measure(&["A"], None).unwrap();
        let b = song.add_measure(&["B"], None).unwrap();
        let c = song.add_measure(&["C"], None).unwrap();

        // forward move lands one before the requested index
        assert_eq!(song.reposition_measure(a, 2).unwrap(), 1);
        assert_eq!(song.measures().map(Measure::id).collect::<Vec<_>>(), vec![b, a, c]);

        // backward move lands at the requested index
        assert_eq!(song.reposition_measure(c, 0).unwrap(), 0);
        assert_eq!(song.measures().map(Measure::id).collect::<Vec<_>>(), vec![c, b, a]);

        // past the end appends
        assert_eq!(song.reposition_measure(c, 99).unwrap(), 2);
        assert_eq!(song.measure_index(c), Some(2));
    }

    #[test]
    fn test_reposition_detached_to_zero() {
        let mut song = Oligophony::new();
        let a = song.add_measure(&["A"], None).unwrap();
        let b = song.add_measure(&["B"], None).unwrap();
        let c = song.add_measure(&["C"], None).unwrap();

        assert_eq!(song.detach_measure(c).unwrap(), Some(2));
        assert_eq!(song.measure_index(c), None);
        assert_eq!(song.detach_measure(c).unwrap(), None);

        // lands at the front, not before the last element
        assert_eq!(song.reposition_measure(c, 0).unwrap(), 0);
        assert_eq!(
            song.sequence(),
            &[Slot::Measure(c), Slot::Measure(a), Slot::Measure(b)]
        );
    }

    #[test]
    fn test_removed_slots_are_reused() {
        let mut song = Oligophony::new();
        let a = song.add_measure(&["A"], None).unwrap();
        let b = song.add_measure(&["B"], None).unwrap();

        for _ in 0..10 {
            let c = song.add_measure(&["C"], None).unwrap();
            song.remove_measure(c).unwrap();
        }
        assert_eq!(song.measures.len(), 3);

        song.remove_measure(a).unwrap();
        let d = song.add_measure(&["D"], None).unwrap();
        assert_eq!(d.index(), a.index());
        assert_ne!(d, a);
        assert_eq!(song.measures.len(), 3);

        // the stale handle does not reach the measure now in its slot
        assert_eq!(song.measure(a).unwrap_err(), ChartError::UnknownMeasure(a));
        assert!(song.set_beat(a, 0, Some("E")).is_err());
        assert_eq!(song.read_beat(d, 0).unwrap().unwrap().root(), Note::D);
        assert_eq!(song.sequence(), &[Slot::Measure(b), Slot::Measure(d)]);
    }

    #[test]
    fn test_add_measure_at_index_events() {
        let mut song = Oligophony::new();
        let first = song.add_measure(&["C"], None).unwrap();
        let log = record(
            &song,
            &[EventKind::MeasureCreated, EventKind::MeasureMoved],
        );

        let inserted = song.add_measure(&["G"], Some(0)).unwrap();
        assert_eq!(song.sequence(), &[Slot::Measure(inserted), Slot::Measure(first)]);
        assert_eq!(
            *log.borrow(),
            vec![
                SongEvent::MeasureMoved(inserted),
                SongEvent::MeasureCreated(inserted)
            ]
        );
    }

    #[test]
    fn test_add_measure_reports_malformed_slot() {
        let mut song = Oligophony::new();
        let err = song.add_measure(&["C", "Q7"], None).unwrap_err();
        assert!(matches!(
            err,
            ChartError::MalformedChord { slot: 1, ref raw, source: ChordError::Malformed { .. } }
                if raw == "Q7"
        ));
        assert!(song.sequence().is_empty());
    }

    #[test]
    fn test_remove_measure() {
        let mut song = Oligophony::new();
        let a = song.add_measure(&["A"], None).unwrap();
        let b = song.add_measure(&["B"], None).unwrap();
        let log = record(&song, &[EventKind::MeasureRemoved]);

        let removed = song.remove_measure(a).unwrap();
        assert_eq!(removed.id(), a);
        assert_eq!(song.sequence(), &[Slot::Measure(b)]);
        assert_eq!(*log.borrow(), vec![SongEvent::MeasureRemoved(a)]);

        assert_eq!(song.measure(a).unwrap_err(), ChartError::UnknownMeasure(a));
        assert!(song.reposition_measure(a, 0).is_err());
        assert!(song.remove_measure(a).is_err());
    }

    #[test]
    fn test_foreign_measure_rejected() {
        let mut other = Oligophony::new();
        let foreign = other.add_measure(&["C"], None).unwrap();

        let mut song = Oligophony::new();
        song.add_measure(&["C"], None).unwrap();
        assert_eq!(
            song.read_beat(foreign, 0).unwrap_err(),
            ChartError::UnknownMeasure(foreign)
        );
        assert!(song.set_beat(foreign, 0, Some("D")).is_err());
        assert!(song.reposition_measure(foreign, 0).is_err());
    }

    #[test]
    fn test_newlines_and_rows() {
        let mut song = Oligophony::new();
        let a = song.add_measure(&["A"], None).unwrap();
        let log = record(
            &song,
            &[EventKind::NewlineAdded, EventKind::NewlineRemoved],
        );
        assert_eq!(song.add_newline(None), 1);
        let b = song.add_measure(&["B"], None).unwrap();
        assert_eq!(song.add_newline(Some(0)), 0);
        assert_eq!(song.add_newline(Some(50)), 4);

        assert_eq!(song.rows(), vec![vec![], vec![a], vec![b], vec![]]);

        assert_eq!(song.remove_newline(1), Err(ChartError::NotANewline(1)));
        assert_eq!(song.remove_newline(9), Err(ChartError::NotANewline(9)));
        song.remove_newline(0).unwrap();
        assert_eq!(song.rows(), vec![vec![a], vec![b], vec![]]);
        assert_eq!(
            *log.borrow(),
            vec![
                SongEvent::NewlineAdded,
                SongEvent::NewlineAdded,
                SongEvent::NewlineAdded,
                SongEvent::NewlineRemoved
            ]
        );
    }

    #[test]
    fn test_set_beat() {
        let mut song = Oligophony::new();
        let id = song.add_measure(&["C"], None).unwrap();
        let log = record(&song, &[EventKind::BeatChanged]);

        song.set_beat(id, 2, Some("D-7")).unwrap();
        let stored = song.measure(id).unwrap().stored_beat(2).unwrap();
        assert_eq!(stored.quality(), ChordQuality::Minor);
        assert_eq!(stored.raw(), "D-7");

        song.set_beat(id, 0, None).unwrap();
        assert!(song.read_beat(id, 0).unwrap().is_none());

        assert!(matches!(
            song.set_beat(id, 4, Some("C")),
            Err(ChartError::BeatOutOfRange { slot: 4, beats: 4, .. })
        ));
        assert!(matches!(
            song.set_beat(id, 1, Some("nope")),
            Err(ChartError::MalformedChord { slot: 1, .. })
        ));
        assert_eq!(
            *log.borrow(),
            vec![
                SongEvent::BeatChanged { measure: id, slot: 2 },
                SongEvent::BeatChanged { measure: id, slot: 0 }
            ]
        );
    }

    #[test]
    fn test_time_signature_change_keeps_existing_measures() {
        let mut song = Oligophony::new();
        let old = song.add_measure(&["C"], None).unwrap();
        song.set_time_signature(TimeSignature::new(3, 4)).unwrap();
        let new = song.add_measure(&["C"], None).unwrap();

        assert_eq!(song.measure(old).unwrap().beat_count(), 4);
        assert_eq!(song.measure(new).unwrap().beat_count(), 3);
        assert!(song.set_time_signature(TimeSignature::new(4, 0)).is_err());
        assert_eq!(song.time_signature(), TimeSignature::new(3, 4));
    }

    #[test]
    fn test_set_key_validates() {
        let mut song = Oligophony::new();
        song.set_key("F#m").unwrap();
        assert_eq!(song.key(), "F#m");
        assert!(matches!(
            song.set_key("not a key"),
            Err(ChartError::InvalidKey { .. })
        ));
        assert_eq!(song.key(), "F#m");
    }

    #[test]
    fn test_import_partial_metadata() {
        let mut song = Oligophony::new();
        song.set_title("Old");
        song.set_composer("Someone");
        let log = record(&song, &[EventKind::Imported, EventKind::MeasureCreated]);

        let data = ChartData {
            title: Some("Blue Bossa".to_string()),
            composer: Some(String::new()),
            time_signature: None,
            key: Some("Cm".to_string()),
            chords: vec![entry(&["Cm7"]), None, entry(&["Fm7"])],
        };
        song.import(&data).unwrap();

        assert_eq!(song.title(), "Blue Bossa");
        assert_eq!(song.composer(), "Someone");
        assert_eq!(song.key(), "Cm");
        assert_eq!(song.time_signature(), TimeSignature::new(4, 4));
        assert_eq!(song.sequence().len(), 3);

        let events = log.borrow();
        assert_eq!(events.len(), 3);
        assert_eq!(events.last(), Some(&SongEvent::Imported));
    }

    #[test]
    fn test_import_is_atomic() {
        let mut song = Oligophony::new();
        let log = record(&song, &EventKind::ALL);

        let data = ChartData {
            title: Some("Broken".to_string()),
            time_signature: Some(TimeSignature::new(3, 4)),
            chords: vec![entry(&["C"]), None, entry(&["G", "Zz"])],
            ..ChartData::default()
        };
        let err = song.import(&data).unwrap_err();
        match err {
            ChartError::InvalidEntry { entry, source } => {
                assert_eq!(entry, 2);
                assert!(matches!(*source, ChartError::MalformedChord { slot: 1, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(song.title(), "");
        assert_eq!(song.time_signature(), TimeSignature::new(4, 4));
        assert!(song.sequence().is_empty());
        assert!(log.borrow().is_empty());

        let bad_key = ChartData {
            key: Some("Xyz".to_string()),
            ..ChartData::default()
        };
        assert!(matches!(
            song.import(&bad_key),
            Err(ChartError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_import_ignores_beats_past_capacity() {
        let mut song = Oligophony::new();
        let data = ChartData {
            time_signature: Some(TimeSignature::new(2, 4)),
            chords: vec![entry(&["C", "G", "not a chord"])],
            ..ChartData::default()
        };
        song.import(&data).unwrap();
        let id = song.sequence()[0].measure().unwrap();
        assert_eq!(song.measure(id).unwrap().beat_count(), 2);
    }

    #[test]
    fn test_export_reimports() {
        let mut song = Oligophony::new();
        song.set_title("Tune");
        song.parse_sequence(&[entry(&["C#m7", "", "F#7"]), None, entry(&["Bb-7"])])
            .unwrap();
        song.set_transpose(3).unwrap();

        let data = song.export();
        assert_eq!(data.title.as_deref(), Some("Tune"));
        assert_eq!(data.composer, None);
        assert_eq!(
            data.chords[0],
            Some(vec![
                Some("C#m7".to_string()),
                None,
                Some("F#7".to_string()),
                None
            ])
        );
        assert_eq!(data.chords[1], None);

        let mut copy = Oligophony::new();
        copy.import(&data).unwrap();
        assert_eq!(copy.export(), data);
    }

    #[test]
    fn test_late_viewer_ready_is_replayed() {
        let song = Oligophony::new();
        assert!(song.announce(SongEvent::ViewerReady));

        let log = record(&song, &[EventKind::ViewerReady]);
        assert_eq!(*log.borrow(), vec![SongEvent::ViewerReady]);
        let reg = song.events().registration(EventKind::ViewerReady).unwrap();
        assert_eq!(reg.subscriber_count(), 0);
        assert_eq!(reg.dispatch_count(), 1);
    }

    #[test]
    fn test_sharp_spelling_kept_untransposed() {
        let mut song = Oligophony::new();
        let id = song.add_measure(&["C#m", "Db"], None).unwrap();

        assert_eq!(song.read_beat(id, 0).unwrap().unwrap().raw_root(), "C#");
        assert_eq!(song.read_beat(id, 1).unwrap().unwrap().raw_root(), "Db");

        song.set_transpose(12).unwrap();
        assert_eq!(song.read_beat(id, 0).unwrap().unwrap().raw_root(), "C#");

        song.set_transpose(1).unwrap();
        assert_eq!(song.read_beat(id, 0).unwrap().unwrap().raw_root(), "D");
        assert_eq!(song.read_beat(id, 1).unwrap().unwrap().raw_root(), "D");
    }
}
