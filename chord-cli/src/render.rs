//! Plain-text output and JSON export of a recognition run.

use anyhow::{Context, Result};
use chord_core::{ChordSegment, NotationLine, TickReport};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Everything a run produced, as written by `--json`.
#[derive(Debug, Serialize)]
pub struct RunExport<'a> {
    pub tempo_bpm: f64,
    pub segments: &'a [ChordSegment],
    pub lines: &'a [NotationLine],
}

/// Saves a run to a pretty-printed JSON file.
pub fn save_export(export: &RunExport<'_>, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(export)?;
    let mut file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(json_string.as_bytes())?;
    Ok(())
}

/// One notation line per output line: `[C4 E4 G4] CM h | ...`.
pub fn format_lines(lines: &[NotationLine]) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let entries: Vec<String> = line
            .entries
            .iter()
            .map(|e| format!("[{}] {} {}", e.note_names.join(" "), e.label, e.duration.code()))
            .collect();
        out.push_str(&format!("{:>3}: {}\n", i + 1, entries.join(" | ")));
    }
    out
}

/// Segment table: start, end, label, notes.
pub fn format_segments(segments: &[ChordSegment]) -> String {
    let mut out = String::new();
    for segment in segments {
        let end = segment
            .end_time
            .map(|t| format!("{:8.3}", t))
            .unwrap_or_else(|| "    open".to_string());
        out.push_str(&format!(
            "{:8.3} {} {:<8} {}\n",
            segment.start_time,
            end,
            segment.label,
            segment.note_names.join(" ")
        ));
    }
    out
}

/// Single-note tuner readout for one tick.
pub fn format_tuner(report: &TickReport) -> String {
    match report.notes.first() {
        Some(note) => format!(
            "{:8.3}s  note {:<4} {:8.2} Hz  {:+6.1} cents  {}",
            report.timestamp,
            note.pitch.note_name,
            note.pitch.frequency_hz,
            note.pitch.cents_offset,
            note.tuning
        ),
        None => format!("{:8.3}s  note --   frequency -- Hz", report.timestamp),
    }
}
