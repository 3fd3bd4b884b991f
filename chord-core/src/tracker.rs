//! # Chord Change Tracker
//!
//! Turns a stream of per-tick note-name sets into chord segments with start
//! and end timestamps. A segment opens when the label of the sounding set
//! changes and closes when the next one opens or the session stops.
//!
//! Silence (an empty note set) neither opens nor closes a segment unless a
//! silence timeout is configured with [`ChordChangeTracker::set_silence_timeout`].

use serde::{Deserialize, Serialize};

use crate::chord::{ChordNameResolver, TemplateChordResolver, label_for};

/// A maximal run of ticks sharing one chord or note label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordSegment {
    /// Note names as first detected, in detection order
    pub note_names: Vec<String>,
    /// The label that opened this segment
    pub label: String,
    /// Start time in seconds
    pub start_time: f64,
    /// End time in seconds; `None` while the segment is still sounding
    pub end_time: Option<f64>,
}

impl ChordSegment {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Duration in seconds, measuring an open segment up to `now`.
    pub fn duration(&self, now: f64) -> f64 {
        (self.end_time.unwrap_or(now) - self.start_time).max(0.0)
    }
}

/// What a call to [`ChordChangeTracker::observe`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Empty note set; nothing changed.
    Silent,
    /// Empty note set that exceeded the silence timeout and closed a segment.
    SilenceClosed,
    /// Same label as the open segment; nothing changed.
    Sustained,
    /// A new segment was opened (and the previous one, if any, closed).
    Opened,
}

/// Owns the chord history of one recognition session.
pub struct ChordChangeTracker {
    history: Vec<ChordSegment>,
    resolver: Box<dyn ChordNameResolver + Send>,
    silence_timeout: Option<f64>,
    silent_since: Option<f64>,
}

impl std::fmt::Debug for ChordChangeTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChordChangeTracker")
            .field("history", &self.history)
            .field("silence_timeout", &self.silence_timeout)
            .field("silent_since", &self.silent_since)
            .finish_non_exhaustive()
    }
}

impl Default for ChordChangeTracker {
    fn default() -> Self {
        Self::new(Box::new(TemplateChordResolver))
    }
}

impl ChordChangeTracker {
    pub fn new(resolver: Box<dyn ChordNameResolver + Send>) -> Self {
        Self {
            history: Vec::new(),
            resolver,
            silence_timeout: None,
            silent_since: None,
        }
    }

    /// Closes the open segment once silence has lasted `timeout` seconds.
    /// `None` restores the default of holding segments open through silence.
    pub fn set_silence_timeout(&mut self, timeout: Option<f64>) {
        self.silence_timeout = timeout;
    }

    /// All segments, oldest first. At most the last one is open.
    pub fn history(&self) -> &[ChordSegment] {
        &self.history
    }

    /// The currently sounding segment, if any.
    pub fn open_segment(&self) -> Option<&ChordSegment> {
        self.history.last().filter(|s| s.is_open())
    }

    /// Label the tracker would give `note_names`; `None` for silence.
    pub fn label_of(&self, note_names: &[String]) -> Option<String> {
        label_for(note_names, self.resolver.as_ref())
    }

    /// Feeds one tick's note names.
    ///
    /// # Arguments
    /// * `note_names` - Distinct note names in detection order
    /// * `timestamp` - Tick time in seconds
    pub fn observe(&mut self, note_names: &[String], timestamp: f64) -> Observation {
        let label = self.label_of(note_names);
        self.observe_labeled(note_names, label, timestamp)
    }

    /// Like [`Self::observe`] with the label already computed by
    /// [`Self::label_of`].
    pub fn observe_labeled(
        &mut self,
        note_names: &[String],
        label: Option<String>,
        timestamp: f64,
    ) -> Observation {
        let Some(label) = label.filter(|_| !note_names.is_empty()) else {
            return self.observe_silence(timestamp);
        };
        self.silent_since = None;

        if self
            .open_segment()
            .is_some_and(|open| open.label == label)
        {
            return Observation::Sustained;
        }

        self.finalize(timestamp);
        log::info!("{:.3}s: opened segment {} {:?}", timestamp, label, note_names);
        self.history.push(ChordSegment {
            note_names: note_names.to_vec(),
            label,
            start_time: timestamp,
            end_time: None,
        });
        Observation::Opened
    }

    fn observe_silence(&mut self, timestamp: f64) -> Observation {
        let Some(timeout) = self.silence_timeout else {
            return Observation::Silent;
        };
        if self.open_segment().is_none() {
            return Observation::Silent;
        }

        let since = *self.silent_since.get_or_insert(timestamp);
        if timestamp - since >= timeout {
            log::debug!("{:.3}s: silence since {:.3}s closes the open segment", timestamp, since);
            self.finalize(since);
            self.silent_since = None;
            Observation::SilenceClosed
        } else {
            Observation::Silent
        }
    }

    /// Closes the open segment at `timestamp`. Does nothing if none is open.
    ///
    /// A timestamp before the segment's start is clamped to the start.
    pub fn finalize(&mut self, timestamp: f64) {
        let Some(open) = self.history.last_mut().filter(|s| s.is_open()) else {
            return;
        };
        let end = if timestamp < open.start_time {
            log::warn!(
                "segment {} closed at {:.3}s before its start {:.3}s; clamping",
                open.label,
                timestamp,
                open.start_time
            );
            open.start_time
        } else {
            timestamp
        };
        open.end_time = Some(end);
        log::info!("{:.3}s: closed segment {}", end, open.label);
    }

    /// Clears history and the open segment for a new session.
    pub fn reset(&mut self) {
        self.history.clear();
        self.silent_since = None;
    }
}
