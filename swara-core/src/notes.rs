//! # Stable Note Module
//!
//! Collapses a segment stream into discrete note events and serves
//! point-in-time lookups against the result.
//!
//! A run grows while incoming segments round to the same MIDI number as the
//! run's last segment and start less than the join gap after it ends. A run is
//! kept only if it spans strictly more than the minimum duration; shorter runs
//! are how one-frame glitches get discarded.

use serde::{Deserialize, Serialize};

use crate::segment::PitchSegment;
use crate::tuning;

/// Default shortest span (exclusive) a run needs to become a note.
pub const DEFAULT_MIN_NOTE_DURATION_SECONDS: f64 = 0.15;
/// Default largest gap (exclusive) allowed between segments of one run.
pub const DEFAULT_NOTE_JOIN_GAP_SECONDS: f64 = 0.1;

/// A sustained note detected in the signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StableNoteEvent {
    pub start_time: f64,
    pub end_time: f64,
    /// Unweighted mean of the run's segment frequencies.
    pub average_frequency: f32,
    pub midi_number: i32,
    /// Letter plus octave, e.g. `"A4"`.
    pub note_name: String,
    /// Distance from the equal-tempered pitch of `midi_number`.
    pub cents_deviation: f32,
    /// Filled in by [`crate::tuning::NoteLabeler::apply`].
    pub scale_degree_label: Option<String>,
}

impl StableNoteEvent {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time <= self.end_time
    }
}

/// Run-joining and duration thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatorSettings {
    pub min_duration: f64,
    pub join_gap: f64,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            min_duration: DEFAULT_MIN_NOTE_DURATION_SECONDS,
            join_gap: DEFAULT_NOTE_JOIN_GAP_SECONDS,
        }
    }
}

/// Segments of the run currently being grown, with the MIDI number of the last one.
struct Run<'a> {
    segments: Vec<&'a PitchSegment>,
    last_midi: i32,
}

impl<'a> Run<'a> {
    fn start(segment: &'a PitchSegment, midi: i32) -> Self {
        Self { segments: vec![segment], last_midi: midi }
    }

    fn accepts(&self, segment: &PitchSegment, midi: i32, join_gap: f64) -> bool {
        let last = self.segments[self.segments.len() - 1];
        midi == self.last_midi && segment.start_time - last.end_time < join_gap
    }

    fn push(&mut self, segment: &'a PitchSegment, midi: i32) {
        self.segments.push(segment);
        self.last_midi = midi;
    }

    fn close(self, min_duration: f64) -> Option<StableNoteEvent> {
        let first = self.segments.first()?;
        let last = self.segments.last()?;
        let (start_time, end_time) = (first.start_time, last.end_time);
        if end_time - start_time <= min_duration {
            return None;
        }

        let average_frequency =
            self.segments.iter().map(|s| s.frequency).sum::<f32>() / self.segments.len() as f32;
        let midi_number = tuning::frequency_to_midi(average_frequency);
        Some(StableNoteEvent {
            start_time,
            end_time,
            average_frequency,
            midi_number,
            note_name: tuning::midi_to_note_name(midi_number),
            cents_deviation: tuning::calculate_cents_deviation(
                average_frequency,
                tuning::midi_to_frequency(midi_number),
            ),
            scale_degree_label: None,
        })
    }
}

/// Merges time-ordered segments into stable note events.
pub fn aggregate(segments: &[PitchSegment], settings: AggregatorSettings) -> Vec<StableNoteEvent> {
    let mut events = Vec::new();
    let mut run: Option<Run<'_>> = None;

    for segment in segments {
        let midi = tuning::frequency_to_midi(segment.frequency);
        if let Some(current) = run.as_mut() {
            if current.accepts(segment, midi, settings.join_gap) {
                current.push(segment, midi);
                continue;
            }
        }
        if let Some(finished) = run.take() {
            events.extend(finished.close(settings.min_duration));
        }
        run = Some(Run::start(segment, midi));
    }

    if let Some(finished) = run {
        events.extend(finished.close(settings.min_duration));
    }
    events
}

/// The event whose `[start_time, end_time]` contains `time`.
///
/// `events` must be time-ordered and non-overlapping, as produced by
/// [`aggregate`].
pub fn find_active_note(events: &[StableNoteEvent], time: f64) -> Option<&StableNoteEvent> {
    let idx = events.partition_point(|e| e.start_time <= time);
    let candidate = events.get(idx.checked_sub(1)?)?;
    candidate.contains(time).then_some(candidate)
}
