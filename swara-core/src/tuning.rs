//! # Musical Tuning Module
//!
//! Equal-temperament conversions between frequency, MIDI numbers and note
//! names, plus the movable scale-degree ("sargam") labelling used to show a
//! note relative to a chosen root key.
//!
//! ## Features
//! - Frequency ↔ MIDI conversion with A4 = 440 Hz
//! - Note names from a 12-entry chromatic table starting at C
//! - Cent deviation from the nearest equal-tempered pitch
//! - Root-key parsing (sharps and flats) and sargam labels

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::StableNoteEvent;

/// Reference pitch for MIDI 69.
pub const A4_FREQUENCY: f32 = 440.0;
/// MIDI number of A4.
pub const A4_MIDI: i32 = 69;

/// Chromatic pitch-class names, index 0 is C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Movable scale-degree names, index 0 is the root.
///
/// Lowercase marks the lowered (komal) variant, `MA` the raised (tivra) fourth.
pub const SARGAM_NAMES: [&str; 12] = [
    "Sa", "re", "Re", "ga", "Ga", "Ma", "MA", "Pa", "dha", "Dha", "ni", "Ni",
];

/// Lookup table for root-key names, accepting both sharp and flat spellings.
static PITCH_CLASS_MAP: Lazy<BTreeMap<String, u8>> = Lazy::new(|| {
    let mut map: BTreeMap<String, u8> = NOTE_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_string(), i as u8))
        .collect();
    for (name, index) in [("Db", 1), ("Eb", 3), ("Gb", 6), ("Ab", 8), ("Bb", 10)] {
        map.insert(name.to_string(), index);
    }
    map
});

/// One of the twelve chromatic pitch classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PitchClass(u8);

impl PitchClass {
    /// Parses a pitch-class name such as `"C"`, `"f#"` or `"Bb"`.
    ///
    /// Returns `None` for anything outside the chromatic table.
    pub fn from_name(name: &str) -> Option<Self> {
        let mut chars = name.trim().chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let normalized: String = std::iter::once(letter).chain(chars).collect();
        PITCH_CLASS_MAP.get(&normalized).map(|&i| PitchClass(i))
    }

    /// Pitch class of a MIDI number.
    pub fn from_midi(midi: i32) -> Self {
        PitchClass(midi.rem_euclid(12) as u8)
    }

    /// Position in the chromatic table, 0 = C.
    pub fn index(self) -> u8 {
        self.0
    }

    pub fn name(self) -> &'static str {
        NOTE_NAMES[self.0 as usize]
    }
}

/// Converts a frequency to the nearest MIDI number.
///
/// `frequency` must be positive.
pub fn frequency_to_midi(frequency: f32) -> i32 {
    (A4_MIDI as f32 + 12.0 * (frequency / A4_FREQUENCY).log2()).round() as i32
}

/// Equal-temperament frequency of a MIDI number.
pub fn midi_to_frequency(midi: i32) -> f32 {
    A4_FREQUENCY * 2.0_f32.powf((midi - A4_MIDI) as f32 / 12.0)
}

/// Note name with octave, e.g. `69` → `"A4"`, `60` → `"C4"`.
pub fn midi_to_note_name(midi: i32) -> String {
    let octave = midi.div_euclid(12) - 1;
    format!("{}{}", PitchClass::from_midi(midi).name(), octave)
}

/// Calculates the deviation from a target frequency in cents.
///
/// Positive values are sharp, negative values flat; 100 cents = 1 semitone.
pub fn calculate_cents_deviation(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}

/// Scale-degree label of `midi` relative to `root`.
///
/// Depends only on the pitch class, never on the octave.
pub fn sargam_label(midi: i32, root: PitchClass) -> &'static str {
    let interval = (PitchClass::from_midi(midi).index() as i32 - root.index() as i32 + 12) % 12;
    SARGAM_NAMES[interval as usize]
}

/// Presentation settings for note labels. Never persisted by the core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Root key name, e.g. `"C"` or `"F#"`.
    pub root_key: Option<String>,
    /// Show sargam labels instead of absolute note names.
    pub use_scale_degrees: bool,
}

/// Turns stable notes into display labels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoteLabeler {
    root: Option<PitchClass>,
    use_scale_degrees: bool,
}

impl NoteLabeler {
    pub fn new(root: Option<PitchClass>, use_scale_degrees: bool) -> Self {
        Self { root, use_scale_degrees }
    }

    /// Builds a labeler from a [`LabelConfig`].
    ///
    /// An unrecognised root key falls back to absolute note names.
    pub fn from_config(config: &LabelConfig) -> Self {
        let root = match config.root_key.as_deref() {
            Some(name) => {
                let parsed = PitchClass::from_name(name);
                if parsed.is_none() {
                    warn!(root_key = name, "unknown root key, using absolute note names");
                }
                parsed
            }
            None => None,
        };
        Self::new(root, config.use_scale_degrees)
    }

    pub fn root(&self) -> Option<PitchClass> {
        self.root
    }

    /// The sargam label when a root is set, otherwise the plain note name.
    pub fn scale_degree(&self, event: &StableNoteEvent) -> String {
        match self.root {
            Some(root) => sargam_label(event.midi_number, root).to_string(),
            None => event.note_name.clone(),
        }
    }

    /// The label to display, honouring the scale-degree toggle.
    pub fn label(&self, event: &StableNoteEvent) -> String {
        if self.use_scale_degrees {
            self.scale_degree(event)
        } else {
            event.note_name.clone()
        }
    }

    /// Fills `scale_degree_label` on every event.
    pub fn apply(&self, events: &mut [StableNoteEvent]) {
        for event in events.iter_mut() {
            event.scale_degree_label = Some(self.scale_degree(event));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(midi: i32) -> StableNoteEvent {
        StableNoteEvent {
            start_time: 0.0,
            end_time: 0.5,
            average_frequency: midi_to_frequency(midi),
            midi_number: midi,
            note_name: midi_to_note_name(midi),
            cents_deviation: 0.0,
            scale_degree_label: None,
        }
    }

    #[test]
    fn a4_is_midi_69() {
        assert_eq!(frequency_to_midi(440.0), 69);
        assert_eq!(midi_to_note_name(69), "A4");
        assert_eq!(midi_to_note_name(60), "C4");
        assert_eq!(midi_to_note_name(59), "B3");
    }

    #[test]
    fn octave_floors_for_low_midi() {
        assert_eq!(midi_to_note_name(0), "C-1");
        assert_eq!(midi_to_note_name(-1), "B-2");
    }

    #[test]
    fn nearby_frequencies_round_to_the_same_note() {
        assert_eq!(frequency_to_midi(446.0), 69);
        assert_eq!(frequency_to_midi(434.0), 69);
        assert_eq!(frequency_to_midi(880.0), 81);
    }

    #[test]
    fn parses_sharps_and_flats() {
        assert_eq!(PitchClass::from_name("C").map(PitchClass::index), Some(0));
        assert_eq!(PitchClass::from_name("c#").map(PitchClass::index), Some(1));
        assert_eq!(PitchClass::from_name("Db").map(PitchClass::index), Some(1));
        assert_eq!(PitchClass::from_name("Bb").map(PitchClass::index), Some(10));
        assert_eq!(PitchClass::from_name("H"), None);
        assert_eq!(PitchClass::from_name(""), None);
    }

    #[test]
    fn sargam_relative_to_c() {
        let c = PitchClass::from_name("C").unwrap();
        assert_eq!(sargam_label(60, c), "Sa");
        assert_eq!(sargam_label(62, c), "Re");
        assert_eq!(sargam_label(67, c), "Pa");
        assert_eq!(sargam_label(66, c), "MA");
        assert_eq!(sargam_label(48, c), "Sa");
    }

    #[test]
    fn rotating_root_moves_sa() {
        let d = PitchClass::from_name("D").unwrap();
        assert_eq!(sargam_label(62, d), "Sa");
        assert_eq!(sargam_label(60, d), "ni");
    }

    #[test]
    fn unknown_root_falls_back_to_note_names() {
        let labeler = NoteLabeler::from_config(&LabelConfig {
            root_key: Some("X#".into()),
            use_scale_degrees: true,
        });
        assert_eq!(labeler.root(), None);
        assert_eq!(labeler.label(&event(69)), "A4");
    }

    #[test]
    fn label_toggle_chooses_between_names() {
        let root = PitchClass::from_name("A");
        assert_eq!(NoteLabeler::new(root, true).label(&event(69)), "Sa");
        assert_eq!(NoteLabeler::new(root, false).label(&event(69)), "A4");

        let mut events = vec![event(69), event(76)];
        NoteLabeler::new(root, false).apply(&mut events);
        assert_eq!(events[1].scale_degree_label.as_deref(), Some("Pa"));
    }
}
