//! # Musical Tuning Module
//!
//! Conversions between frequency, MIDI note number, note name and cents
//! deviation, all in twelve-tone equal temperament with A4 = 440 Hz.
//!
//! ## Features
//! - Frequency to nearest note (name, MIDI number, cents offset)
//! - Note name to frequency, with strict parsing of `[A-G](#)?<octave>`
//! - Cent deviation and flat / in tune / sharp classification
//! - Renderer key form (`"c#/4"`) for notation output

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ChordError, Result};

/// Reference pitch for A4 in Hz.
pub const A4_HZ: f32 = 440.0;

/// MIDI number of A4.
pub const A4_MIDI: i32 = 69;

/// Pitch class names, indexed by `midi mod 12`.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Static map for pitch class to semitone index lookups.
static PITCH_CLASS_INDEX: Lazy<BTreeMap<&'static str, i32>> = Lazy::new(|| {
    NOTE_NAMES
        .iter()
        .enumerate()
        .map(|(i, &name)| (name, i as i32))
        .collect()
});

/// A detected frequency snapped to its nearest equal-tempered note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pitch {
    /// Measured frequency in Hz
    pub frequency_hz: f32,
    /// Nearest note name (e.g., "A4", "C#3")
    pub note_name: String,
    /// MIDI-style note number (A4 = 69)
    pub midi_number: i32,
    /// Deviation from the nearest note in cents
    pub cents_offset: f32,
}

impl Pitch {
    /// Classifies this pitch's cents offset.
    pub fn tuning_status(&self, tolerance_cents: f32) -> TuningStatus {
        tuning_status(self.cents_offset, tolerance_cents)
    }
}

/// How far a pitch sits from its target note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TuningStatus {
    Flat,
    InTune,
    Sharp,
}

impl std::fmt::Display for TuningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            TuningStatus::Flat => "flat",
            TuningStatus::InTune => "in tune",
            TuningStatus::Sharp => "sharp",
        };
        f.write_str(text)
    }
}

/// Frequency of an equal-tempered MIDI note.
pub fn midi_to_frequency(midi: i32) -> f32 {
    A4_HZ * 2.0_f32.powf((midi - A4_MIDI) as f32 / 12.0)
}

/// Note name ("C#4") for a MIDI number. Octaves change at C.
pub fn note_name_for_midi(midi: i32) -> String {
    let pitch_class = NOTE_NAMES[midi.rem_euclid(12) as usize];
    let octave = midi.div_euclid(12) - 1;
    format!("{}{}", pitch_class, octave)
}

/// Finds the nearest equal-tempered note to a frequency.
///
/// # Arguments
/// * `freq` - Input frequency in Hz
///
/// # Returns
/// * `Some(pitch)` - Nearest note with its cents offset
/// * `None` - The frequency is zero, negative or not finite
pub fn frequency_to_pitch(freq: f32) -> Option<Pitch> {
    if !freq.is_finite() || freq <= 0.0 {
        return None;
    }

    let midi = (12.0 * (freq / A4_HZ).log2() + A4_MIDI as f32).round() as i32;
    let target = midi_to_frequency(midi);

    Some(Pitch {
        frequency_hz: freq,
        note_name: note_name_for_midi(midi),
        midi_number: midi,
        cents_offset: cents_offset(freq, target),
    })
}

/// Splits a note name such as "C#4" or "A-1" into (semitone index, octave).
///
/// Only sharps are accepted; flats and lowercase letters are rejected as
/// malformed rather than guessed at.
pub fn parse_note_name(name: &str) -> Result<(i32, i32)> {
    let letter_len = match name.as_bytes().first() {
        Some(b'A'..=b'G') => 1,
        _ => return Err(ChordError::malformed(name)),
    };
    let class_len = if name[letter_len..].starts_with('#') {
        letter_len + 1
    } else {
        letter_len
    };

    let (pitch_class, octave) = name.split_at(class_len);
    let semitone = semitone_index(pitch_class).ok_or_else(|| ChordError::malformed(name))?;
    let octave = parse_octave(octave).ok_or_else(|| ChordError::malformed(name))?;
    Ok((semitone, octave))
}

fn parse_octave(text: &str) -> Option<i32> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn semitone_index(pitch_class: &str) -> Option<i32> {
    PITCH_CLASS_INDEX.get(pitch_class).copied()
}

/// MIDI number of a semitone in an octave; `None` past the `i32` range.
fn midi_number(semitone: i32, octave: i32) -> Option<i32> {
    octave
        .checked_add(1)
        .and_then(|o| o.checked_mul(12))
        .and_then(|m| m.checked_add(semitone))
}

/// Equal-tempered frequency of a pitch class in a given octave.
///
/// # Errors
/// * `ChordError::MalformedNoteName` if `pitch_class` is not one of
///   [`NOTE_NAMES`] or the octave is out of range
pub fn pitch_to_frequency(pitch_class: &str, octave: i32) -> Result<f32> {
    let malformed = || ChordError::malformed(&format!("{}{}", pitch_class, octave));
    let semitone = semitone_index(pitch_class).ok_or_else(malformed)?;
    let midi = midi_number(semitone, octave).ok_or_else(malformed)?;
    Ok(midi_to_frequency(midi))
}

/// Equal-tempered frequency of a full note name such as "C#4".
pub fn note_to_frequency(name: &str) -> Result<f32> {
    let (semitone, octave) = parse_note_name(name)?;
    let midi = midi_number(semitone, octave).ok_or_else(|| ChordError::malformed(name))?;
    Ok(midi_to_frequency(midi))
}

/// Strips the octave from a note name: "C#4" -> "C#".
///
/// Names that do not start with a pitch class are returned unchanged.
pub fn pitch_class(note_name: &str) -> &str {
    let end = note_name
        .char_indices()
        .find(|&(i, c)| i > 0 && c != '#')
        .map(|(i, _)| i)
        .unwrap_or(note_name.len());
    &note_name[..end]
}

/// Renderer key form of a note name: "C#4" -> "c#/4".
pub fn notation_key(note_name: &str) -> String {
    let class = pitch_class(note_name);
    let octave = &note_name[class.len()..];
    format!("{}/{}", class.to_lowercase(), octave)
}

/// Calculates the deviation from a reference frequency in cents.
///
/// - 100 cents = 1 semitone
/// - 1200 cents = 1 octave
/// - Positive values indicate sharpness, negative values indicate flatness
pub fn cents_offset(freq: f32, reference_freq: f32) -> f32 {
    1200.0 * (freq / reference_freq).log2()
}

/// Classifies a cents deviation.
///
/// Anything strictly inside `±tolerance_cents` is in tune.
pub fn tuning_status(cents: f32, tolerance_cents: f32) -> TuningStatus {
    if cents.abs() < tolerance_cents {
        TuningStatus::InTune
    } else if cents < 0.0 {
        TuningStatus::Flat
    } else {
        TuningStatus::Sharp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_mapping() {
        let test_cases = [
            (440.0, "A4", 69),
            (493.88, "B4", 71),
            (523.25, "C5", 72),
            (392.0, "G4", 67),
            (220.0, "A3", 57),
            (261.63, "C4", 60),
            (277.18, "C#4", 61),
        ];

        for (freq, name, midi) in test_cases {
            let pitch = frequency_to_pitch(freq).unwrap();
            assert_eq!(pitch.note_name, name, "{} Hz", freq);
            assert_eq!(pitch.midi_number, midi, "{} Hz", freq);
            assert!(pitch.cents_offset.abs() < 1.0, "{} Hz is {} cents off", freq, pitch.cents_offset);
        }
    }

    #[test]
    fn non_positive_frequencies_have_no_pitch() {
        assert!(frequency_to_pitch(0.0).is_none());
        assert!(frequency_to_pitch(-440.0).is_none());
        assert!(frequency_to_pitch(f32::NAN).is_none());
        assert!(frequency_to_pitch(f32::INFINITY).is_none());
    }

    #[test]
    fn midi_round_trips_through_frequency() {
        for midi in 0..=127 {
            let name = note_name_for_midi(midi);
            let freq = note_to_frequency(&name).unwrap();
            let pitch = frequency_to_pitch(freq).unwrap();
            assert_eq!(pitch.midi_number, midi, "{}", name);
            assert_eq!(pitch.note_name, name);
        }
    }

    #[test]
    fn pitch_to_frequency_matches_combined_form() {
        assert_eq!(pitch_to_frequency("A", 4).unwrap(), 440.0);
        assert_eq!(pitch_to_frequency("C#", 3).unwrap(), note_to_frequency("C#3").unwrap());
        assert!((pitch_to_frequency("A", 3).unwrap() - 220.0).abs() < 1e-3);
    }

    #[test]
    fn negative_octaves_parse() {
        assert_eq!(parse_note_name("C-1").unwrap(), (0, -1));
        assert_eq!(note_name_for_midi(0), "C-1");
        assert_eq!(note_name_for_midi(-1), "B-2");
    }

    #[test]
    fn malformed_names_are_rejected() {
        for bad in ["", "H4", "c4", "Db4", "C", "C#", "C##4", "C4.5", "C-", "4C", "C 4"] {
            assert_eq!(
                note_to_frequency(bad),
                Err(ChordError::MalformedNoteName { name: bad.to_string() }),
                "{:?}",
                bad
            );
        }
        assert!(pitch_to_frequency("Bb", 4).is_err());
    }

    #[test]
    fn out_of_range_octaves_are_malformed() {
        assert_eq!(
            note_to_frequency("C200000000"),
            Err(ChordError::MalformedNoteName {
                name: "C200000000".to_string()
            })
        );
        assert!(note_to_frequency("B-2147483648").is_err());
        assert_eq!(
            pitch_to_frequency("C", i32::MAX),
            Err(ChordError::MalformedNoteName {
                name: format!("C{}", i32::MAX)
            })
        );
    }

    #[test]
    fn cents_and_status() {
        assert_eq!(cents_offset(440.0, 440.0), 0.0);
        assert_eq!(cents_offset(123.4, 123.4), 0.0);
        assert!((cents_offset(880.0, 440.0) - 1200.0).abs() < 1e-3);
        assert_eq!(tuning_status(0.0, 5.0), TuningStatus::InTune);
        assert_eq!(tuning_status(6.0, 5.0), TuningStatus::Sharp);
        assert_eq!(tuning_status(-6.0, 5.0), TuningStatus::Flat);
        assert_eq!(tuning_status(5.0, 5.0), TuningStatus::Sharp);
        assert_eq!(tuning_status(-4.9, 5.0), TuningStatus::InTune);
    }

    #[test]
    fn pitch_class_and_renderer_keys() {
        assert_eq!(pitch_class("C#4"), "C#");
        assert_eq!(pitch_class("A-1"), "A");
        assert_eq!(pitch_class("G"), "G");
        assert_eq!(notation_key("C#4"), "c#/4");
        assert_eq!(notation_key("E3"), "e/3");
    }
}
