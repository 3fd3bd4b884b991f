//! Packing chord segments into notation lines.
//!
//! Lines are rebuilt from the history on every call; nothing here keeps
//! state between calls.

use serde::{Deserialize, Serialize};

use crate::duration::{DurationQuantizer, DurationSymbol};
use crate::tracker::ChordSegment;
use crate::tuning::notation_key;

/// Horizontal space per notated chord on a staff line.
pub const DEFAULT_SYMBOL_SPACING: f32 = 80.0;

/// Horizontal space reserved at the line start (clef and margin).
pub const DEFAULT_LINE_MARGIN: f32 = 20.0;

/// One chord as a renderer should draw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotatedChord {
    pub label: String,
    pub note_names: Vec<String>,
    /// Renderer keys, e.g. `"c#/4"`, parallel to `note_names`
    pub notation_keys: Vec<String>,
    pub duration: DurationSymbol,
    pub start_time: f64,
    pub end_time: f64,
}

impl NotatedChord {
    /// Indices of notes that need a sharp drawn next to them.
    pub fn sharp_indices(&self) -> Vec<usize> {
        self.note_names
            .iter()
            .enumerate()
            .filter(|(_, name)| name.contains('#'))
            .map(|(i, _)| i)
            .collect()
    }
}

/// A run of consecutive chords that fits on one line.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NotationLine {
    pub entries: Vec<NotatedChord>,
}

/// How many chords fit in `available_width`, never fewer than one.
pub fn max_per_line(available_width: f32, symbol_spacing: f32, margin: f32) -> usize {
    if !(symbol_spacing > 0.0) {
        return 1;
    }
    let count = ((available_width - margin) / symbol_spacing).floor();
    if count.is_finite() && count >= 1.0 {
        count as usize
    } else {
        1
    }
}

/// Lays the history out as notation lines.
///
/// # Arguments
/// * `history` - Chord segments, oldest first
/// * `now` - Provisional end for an open last segment; `None` leaves it out
/// * `max_per_line` - Chords per line; 0 is treated as 1
/// * `quantizer` - Tempo used for the duration symbols
pub fn layout_lines(
    history: &[ChordSegment],
    now: Option<f64>,
    max_per_line: usize,
    quantizer: &DurationQuantizer,
) -> Vec<NotationLine> {
    let notated: Vec<NotatedChord> = history
        .iter()
        .filter_map(|segment| {
            let end_time = segment.end_time.or(now)?;
            let elapsed = (end_time - segment.start_time).max(0.0);
            Some(NotatedChord {
                label: segment.label.clone(),
                note_names: segment.note_names.clone(),
                notation_keys: segment.note_names.iter().map(|n| notation_key(n)).collect(),
                duration: quantizer.quantize(elapsed),
                start_time: segment.start_time,
                end_time,
            })
        })
        .collect();

    notated
        .chunks(max_per_line.max(1))
        .map(|chunk| NotationLine {
            entries: chunk.to_vec(),
        })
        .collect()
}
