//! Elapsed time to notated note values at a fixed tempo.

use serde::{Deserialize, Serialize};

use crate::error::{ChordError, Result};

/// Notated duration of one chord segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DurationSymbol {
    Whole,
    Half,
    DottedQuarter,
    Quarter,
    TripletEighth,
    Eighth,
    Sixteenth,
}

impl DurationSymbol {
    /// Renderer duration code ("w", "h", "qd", "q", "8t", "8", "16").
    pub fn code(self) -> &'static str {
        match self {
            DurationSymbol::Whole => "w",
            DurationSymbol::Half => "h",
            DurationSymbol::DottedQuarter => "qd",
            DurationSymbol::Quarter => "q",
            DurationSymbol::TripletEighth => "8t",
            DurationSymbol::Eighth => "8",
            DurationSymbol::Sixteenth => "16",
        }
    }

    /// Nominal length in beats, as listed in [`DURATION_TABLE`].
    pub fn beats(self) -> f64 {
        DURATION_TABLE
            .iter()
            .find(|(_, symbol)| *symbol == self)
            .map(|&(beats, _)| beats)
            .unwrap_or(0.0)
    }
}

impl std::fmt::Display for DurationSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DurationSymbol::Whole => "whole",
            DurationSymbol::Half => "half",
            DurationSymbol::DottedQuarter => "dotted-quarter",
            DurationSymbol::Quarter => "quarter",
            DurationSymbol::TripletEighth => "triplet-eighth",
            DurationSymbol::Eighth => "eighth",
            DurationSymbol::Sixteenth => "sixteenth",
        };
        f.write_str(name)
    }
}

/// Representable durations, longest first. Order decides exact ties.
pub const DURATION_TABLE: [(f64, DurationSymbol); 7] = [
    (4.0, DurationSymbol::Whole),
    (2.0, DurationSymbol::Half),
    (1.5, DurationSymbol::DottedQuarter),
    (1.0, DurationSymbol::Quarter),
    (0.666, DurationSymbol::TripletEighth),
    (0.5, DurationSymbol::Eighth),
    (0.25, DurationSymbol::Sixteenth),
];

/// Nearest table entry to a beat count.
///
/// Values outside the table clamp to a whole note or a sixteenth; on an exact
/// tie the earlier (longer) entry wins.
pub fn quantize_beats(beats: f64) -> DurationSymbol {
    let (first_beats, first_symbol) = DURATION_TABLE[0];
    let mut best = first_symbol;
    let mut min_diff = (beats - first_beats).abs();
    for &(table_beats, symbol) in &DURATION_TABLE[1..] {
        let diff = (beats - table_beats).abs();
        if diff < min_diff {
            min_diff = diff;
            best = symbol;
        }
    }
    best
}

/// Converts elapsed seconds to note values at a fixed tempo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationQuantizer {
    beat_seconds: f64,
}

impl DurationQuantizer {
    /// # Errors
    /// * `ChordError::InvalidConfig` when `tempo_bpm` is not a positive number
    pub fn new(tempo_bpm: f64) -> Result<Self> {
        if !(tempo_bpm > 0.0 && tempo_bpm.is_finite()) {
            return Err(ChordError::config("tempo_bpm", format!("{} is not a positive tempo", tempo_bpm)));
        }
        Ok(Self {
            beat_seconds: 60.0 / tempo_bpm,
        })
    }

    /// Length of one beat in seconds.
    pub fn beat_seconds(&self) -> f64 {
        self.beat_seconds
    }

    pub fn beats(&self, elapsed_secs: f64) -> f64 {
        elapsed_secs / self.beat_seconds
    }

    pub fn quantize(&self, elapsed_secs: f64) -> DurationSymbol {
        quantize_beats(self.beats(elapsed_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantizes_at_120_bpm() {
        let q = DurationQuantizer::new(120.0).unwrap();
        assert_eq!(q.beat_seconds(), 0.5);
        assert_eq!(q.quantize(1.0), DurationSymbol::Half);
        assert_eq!(q.quantize(0.74), DurationSymbol::DottedQuarter);
        assert_eq!(q.quantize(0.5), DurationSymbol::Quarter);
        assert_eq!(q.quantize(0.125), DurationSymbol::Sixteenth);
    }

    #[test]
    fn out_of_range_clamps_to_extremes() {
        assert_eq!(quantize_beats(40.0), DurationSymbol::Whole);
        assert_eq!(quantize_beats(0.0), DurationSymbol::Sixteenth);
        assert_eq!(quantize_beats(-3.0), DurationSymbol::Sixteenth);
    }

    #[test]
    fn exact_ties_prefer_the_longer_value() {
        // 3.0 is exactly between 4 and 2.
        assert_eq!(quantize_beats(3.0), DurationSymbol::Whole);
        // 1.25 is exactly between 1.5 and 1.
        assert_eq!(quantize_beats(1.25), DurationSymbol::DottedQuarter);
        // 0.375 is exactly between 0.5 and 0.25.
        assert_eq!(quantize_beats(0.375), DurationSymbol::Eighth);
    }

    #[test]
    fn triplet_eighth_is_reachable() {
        assert_eq!(quantize_beats(0.67), DurationSymbol::TripletEighth);
        assert_eq!(DurationSymbol::TripletEighth.code(), "8t");
        assert_eq!(DurationSymbol::DottedQuarter.to_string(), "dotted-quarter");
        assert_eq!(DurationSymbol::Half.beats(), 2.0);
    }

    #[test]
    fn rejects_bad_tempos() {
        assert!(DurationQuantizer::new(0.0).is_err());
        assert!(DurationQuantizer::new(-60.0).is_err());
        assert!(DurationQuantizer::new(f64::NAN).is_err());
    }
}
