//! Chord naming for a set of sounding pitch classes.
//!
//! The tracker does not match chords itself; it asks a
//! [`ChordNameResolver`] and treats the first candidate as authoritative.
//! [`TemplateChordResolver`] is the resolver shipped with the crate.

use thiserror::Error;

use crate::tuning::{NOTE_NAMES, pitch_class};

/// Label used whenever a chord cannot be named.
pub const UNKNOWN_CHORD: &str = "Unknown";

/// A resolver could not be reached or failed internally.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("chord resolver unavailable: {0}")]
pub struct ResolverError(pub String);

/// External capability that names a chord from its pitch classes.
pub trait ChordNameResolver {
    /// Names the chord formed by `pitch_classes` (e.g. `["C", "E", "G"]`).
    ///
    /// # Returns
    /// * `Ok(Some(name))` - Best-guess chord name
    /// * `Ok(None)` - No chord matches
    /// * `Err(_)` - The resolver itself failed
    fn resolve(&self, pitch_classes: &[&str]) -> Result<Option<String>, ResolverError>;
}

impl<F> ChordNameResolver for F
where
    F: Fn(&[&str]) -> Result<Option<String>, ResolverError>,
{
    fn resolve(&self, pitch_classes: &[&str]) -> Result<Option<String>, ResolverError> {
        self(pitch_classes)
    }
}

/// Computes the segment label for a set of note names.
///
/// Pitch classes are de-duplicated in detection order. One distinct class is
/// labelled with the class itself; several go to the resolver. A resolver
/// miss or failure becomes [`UNKNOWN_CHORD`], so a flaky resolver cannot open
/// and close segments on its own. Returns `None` for an empty set.
pub fn label_for(note_names: &[String], resolver: &dyn ChordNameResolver) -> Option<String> {
    let mut classes: Vec<&str> = Vec::with_capacity(note_names.len());
    for name in note_names {
        let class = pitch_class(name);
        if !classes.contains(&class) {
            classes.push(class);
        }
    }

    match classes.as_slice() {
        [] => None,
        [single] => Some(single.to_string()),
        _ => match resolver.resolve(&classes) {
            Ok(Some(name)) => Some(name),
            Ok(None) => Some(UNKNOWN_CHORD.to_string()),
            Err(e) => {
                log::warn!("{}; labelling {:?} as {}", e, classes, UNKNOWN_CHORD);
                Some(UNKNOWN_CHORD.to_string())
            }
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Sus2,
    Sus4,
    Power,
    Dominant7,
    Major7,
    Minor7,
    HalfDiminished7,
    Diminished7,
}

impl ChordQuality {
    /// Suffix appended to the root. Majors carry an explicit "M" so that a C
    /// major chord never shares the label "C" with a lone C note.
    fn suffix(self) -> &'static str {
        match self {
            ChordQuality::Major => "M",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
            ChordQuality::Sus2 => "sus2",
            ChordQuality::Sus4 => "sus4",
            ChordQuality::Power => "5",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Minor7 => "m7",
            ChordQuality::HalfDiminished7 => "m7b5",
            ChordQuality::Diminished7 => "dim7",
        }
    }
}

// (quality, intervals above the root, priority). Exact matches only; higher
// priority wins when more than one root fits.
const CHORD_TEMPLATES: [(ChordQuality, &[u8], u8); 12] = [
    (ChordQuality::Dominant7, &[0, 4, 7, 10], 12),
    (ChordQuality::Major7, &[0, 4, 7, 11], 12),
    (ChordQuality::Minor7, &[0, 3, 7, 10], 12),
    (ChordQuality::HalfDiminished7, &[0, 3, 6, 10], 11),
    (ChordQuality::Diminished7, &[0, 3, 6, 9], 11),
    (ChordQuality::Major, &[0, 4, 7], 10),
    (ChordQuality::Minor, &[0, 3, 7], 10),
    (ChordQuality::Sus4, &[0, 5, 7], 8),
    (ChordQuality::Sus2, &[0, 2, 7], 8),
    (ChordQuality::Diminished, &[0, 3, 6], 7),
    (ChordQuality::Augmented, &[0, 4, 8], 7),
    (ChordQuality::Power, &[0, 7], 5),
];

/// Names chords by exact interval-template matching.
///
/// Every pitch class is tried as the root; the best-priority template whose
/// interval set equals the sounding set wins. Ties keep the root that was
/// detected first, i.e. the loudest note. Symmetric chords (augmented,
/// diminished seventh) are therefore named after the loudest note.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateChordResolver;

impl ChordNameResolver for TemplateChordResolver {
    fn resolve(&self, pitch_classes: &[&str]) -> Result<Option<String>, ResolverError> {
        let mut semitones: Vec<u8> = Vec::with_capacity(pitch_classes.len());
        for class in pitch_classes {
            match NOTE_NAMES.iter().position(|n| n == class) {
                Some(index) => semitones.push(index as u8),
                None => return Ok(None),
            }
        }

        let mut best: Option<(u8, ChordQuality, u8)> = None;
        for &root in &semitones {
            let mut intervals: Vec<u8> = semitones.iter().map(|&pc| (pc + 12 - root) % 12).collect();
            intervals.sort_unstable();
            intervals.dedup();

            for &(quality, template, priority) in &CHORD_TEMPLATES {
                if intervals.as_slice() != template {
                    continue;
                }
                if best.is_none_or(|(_, _, prev)| priority > prev) {
                    best = Some((root, quality, priority));
                }
            }
        }

        Ok(best.map(|(root, quality, _)| format!("{}{}", NOTE_NAMES[root as usize], quality.suffix())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(notes: &[&str]) -> Vec<String> {
        notes.iter().map(|n| n.to_string()).collect()
    }

    fn resolve(classes: &[&str]) -> Option<String> {
        TemplateChordResolver.resolve(classes).unwrap()
    }

    #[test]
    fn names_common_triads() {
        assert_eq!(resolve(&["C", "E", "G"]).as_deref(), Some("CM"));
        assert_eq!(resolve(&["E", "G", "C"]).as_deref(), Some("CM"));
        assert_eq!(resolve(&["A", "C", "E"]).as_deref(), Some("Am"));
        assert_eq!(resolve(&["B", "D", "F"]).as_deref(), Some("Bdim"));
        assert_eq!(resolve(&["D", "G", "A"]).as_deref(), Some("Dsus4"));
        assert_eq!(resolve(&["E", "B"]).as_deref(), Some("E5"));
    }

    #[test]
    fn names_sevenths() {
        assert_eq!(resolve(&["G", "B", "D", "F"]).as_deref(), Some("G7"));
        assert_eq!(resolve(&["C", "E", "G", "B"]).as_deref(), Some("Cmaj7"));
        assert_eq!(resolve(&["D", "F", "A", "C"]).as_deref(), Some("Dm7"));
    }

    #[test]
    fn unmatched_sets_resolve_to_none() {
        assert_eq!(resolve(&["C", "C#"]), None);
        assert_eq!(resolve(&["C", "Bb"]), None);
    }

    #[test]
    fn single_pitch_class_is_its_own_label() {
        let label = label_for(&names(&["C4", "C5"]), &TemplateChordResolver);
        assert_eq!(label.as_deref(), Some("C"));
        assert_eq!(label_for(&names(&["F#3"]), &TemplateChordResolver).as_deref(), Some("F#"));
    }

    #[test]
    fn empty_set_has_no_label() {
        assert_eq!(label_for(&[], &TemplateChordResolver), None);
    }

    #[test]
    fn resolver_failure_becomes_unknown() {
        let failing = |_: &[&str]| -> Result<Option<String>, ResolverError> {
            Err(ResolverError("offline".to_string()))
        };
        let label = label_for(&names(&["C4", "E4", "G4"]), &failing);
        assert_eq!(label.as_deref(), Some(UNKNOWN_CHORD));
    }

    #[test]
    fn resolver_miss_becomes_unknown() {
        let label = label_for(&names(&["C4", "C#4"]), &TemplateChordResolver);
        assert_eq!(label.as_deref(), Some(UNKNOWN_CHORD));
    }

    #[test]
    fn closures_act_as_resolvers() {
        let first = |classes: &[&str]| -> Result<Option<String>, ResolverError> {
            Ok(Some(format!("{}?", classes[0])))
        };
        let label = label_for(&names(&["D4", "A4"]), &first);
        assert_eq!(label.as_deref(), Some("D?"));
    }
}
