//! Text and JSON rendering of analysis results.

use serde::Serialize;
use std::fmt::Write;
use swara_core::{Analysis, NoteLabeler, StableNoteEvent};

/// One row of the note timeline, as written to JSON.
#[derive(Debug, Serialize)]
pub struct NoteRow<'a> {
    pub start: f64,
    pub end: f64,
    pub frequency: f32,
    pub midi: i32,
    pub note: &'a str,
    pub label: String,
    pub cents: f32,
}

#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub duration_seconds: f64,
    pub normalization_gain: f32,
    pub notes: Vec<NoteRow<'a>>,
}

pub fn rows<'a>(notes: &'a [StableNoteEvent], labeler: &NoteLabeler) -> Vec<NoteRow<'a>> {
    notes
        .iter()
        .map(|n| NoteRow {
            start: n.start_time,
            end: n.end_time,
            frequency: n.average_frequency,
            midi: n.midi_number,
            note: &n.note_name,
            label: labeler.label(n),
            cents: n.cents_deviation,
        })
        .collect()
}

pub fn to_json(analysis: &Analysis, labeler: &NoteLabeler) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Report {
        duration_seconds: analysis.duration_seconds,
        normalization_gain: analysis.normalization_gain,
        notes: rows(&analysis.notes, labeler),
    })
}

/// Fixed-width timeline table.
pub fn to_table(analysis: &Analysis, labeler: &NoteLabeler) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>8} {:>8} {:>9} {:>5} {:>6} {:>7}",
        "start", "end", "freq", "note", "label", "cents"
    );
    for row in rows(&analysis.notes, labeler) {
        let _ = writeln!(
            out,
            "{:>8.3} {:>8.3} {:>9.2} {:>5} {:>6} {:>+7.1}",
            row.start, row.end, row.frequency, row.note, row.label, row.cents
        );
    }
    let _ = writeln!(
        out,
        "{} notes in {:.2}s",
        analysis.notes.len(),
        analysis.duration_seconds
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use swara_core::PitchClass;

    fn analysis() -> Analysis {
        Analysis {
            segments: Vec::new(),
            notes: vec![StableNoteEvent {
                start_time: 0.0,
                end_time: 0.5,
                average_frequency: 261.63,
                midi_number: 60,
                note_name: "C4".into(),
                cents_deviation: 0.0,
                scale_degree_label: None,
            }],
            duration_seconds: 1.0,
            normalization_gain: 1.0,
        }
    }

    #[test]
    fn table_lists_every_note() {
        let labeler = NoteLabeler::new(PitchClass::from_name("C"), true);
        let table = to_table(&analysis(), &labeler);
        assert!(table.contains("C4"));
        assert!(table.contains("Sa"));
        assert!(table.contains("1 notes in 1.00s"));
    }

    #[test]
    fn json_carries_labels() {
        let labeler = NoteLabeler::new(PitchClass::from_name("G"), true);
        let json = to_json(&analysis(), &labeler).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["notes"][0]["label"], "Ma");
        assert_eq!(value["notes"][0]["midi"], 60);
    }
}
