//! # Recognition Session
//!
//! One session owns the configuration, the chord tracker and a lifecycle
//! flag. An external scheduler (a frame callback, a timer, a file reader)
//! calls [`Session::tick`] once per analysis buffer; the session never owns a
//! timer or a thread itself.
//!
//! ## Lifecycle
//! - [`Session::start`] clears the history and begins accepting ticks
//! - [`Session::stop`] closes the open segment and stops accepting ticks
//! - replaying a captured buffer is just another `start` on the same session

use crate::chord::{ChordNameResolver, TemplateChordResolver};
use crate::config::AnalysisConfig;
use crate::duration::DurationQuantizer;
use crate::error::Result;
use crate::layout::{NotationLine, layout_lines};
use crate::peaks::extract_fundamentals;
use crate::pitch::detect_pitch_autocorrelation;
use crate::tracker::{ChordChangeTracker, ChordSegment, Observation};
use crate::tuning::{Pitch, TuningStatus, frequency_to_pitch};

/// One tick's worth of input from the sample source.
#[derive(Debug, Clone, Copy)]
pub enum Frame<'a> {
    /// dB magnitudes per bin, as produced by a forward FFT of `fft_size` points
    Spectrum {
        magnitudes_db: &'a [f32],
        sample_rate: f32,
        fft_size: usize,
    },
    /// Raw samples
    TimeDomain { samples: &'a [f32], sample_rate: f32 },
}

/// Whether a session is accepting ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Stopped,
}

/// A pitch detected in one tick, with its tuning readout.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedNote {
    pub pitch: Pitch,
    pub tuning: TuningStatus,
}

/// What one tick produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub timestamp: f64,
    /// Notes in detection order; empty means no pitch this tick
    pub notes: Vec<DetectedNote>,
    /// Label of the detected note set; `None` when nothing sounded
    pub label: Option<String>,
    /// Effect on the chord history; `None` when the tick was skipped
    pub observation: Option<Observation>,
}

impl TickReport {
    fn skipped(timestamp: f64) -> Self {
        Self {
            timestamp,
            notes: Vec::new(),
            label: None,
            observation: None,
        }
    }

    /// Whether this tick changed the chord history.
    pub fn history_changed(&self) -> bool {
        matches!(
            self.observation,
            Some(Observation::Opened) | Some(Observation::SilenceClosed)
        )
    }
}

/// An independent chord recognition session.
#[derive(Debug)]
pub struct Session {
    config: AnalysisConfig,
    quantizer: DurationQuantizer,
    tracker: ChordChangeTracker,
    state: SessionState,
}

impl Session {
    /// Creates an idle session using the built-in chord resolver.
    ///
    /// # Errors
    /// * `ChordError::InvalidConfig` if the configuration does not validate
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Self::with_resolver(config, Box::new(TemplateChordResolver))
    }

    /// Creates an idle session that names chords with `resolver`.
    pub fn with_resolver(
        config: AnalysisConfig,
        resolver: Box<dyn ChordNameResolver + Send>,
    ) -> Result<Self> {
        config.validate()?;
        let quantizer = DurationQuantizer::new(config.tempo_bpm)?;
        let mut tracker = ChordChangeTracker::new(resolver);
        tracker.set_silence_timeout(config.silence_close_after_secs);
        Ok(Self {
            config,
            quantizer,
            tracker,
            state: SessionState::Idle,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn quantizer(&self) -> &DurationQuantizer {
        &self.quantizer
    }

    /// Chord history of the current (or last) run.
    pub fn history(&self) -> &[ChordSegment] {
        self.tracker.history()
    }

    /// Resets all state and starts accepting ticks.
    pub fn start(&mut self) {
        self.tracker.reset();
        self.state = SessionState::Running;
        log::info!("session started ({:?} mode, {} BPM)", self.config.mode, self.config.tempo_bpm);
    }

    /// Closes the open segment at `now` and stops accepting ticks.
    pub fn stop(&mut self, now: f64) {
        if self.state != SessionState::Running {
            return;
        }
        self.tracker.finalize(now);
        self.state = SessionState::Stopped;
        log::info!("session stopped at {:.3}s with {} segments", now, self.history().len());
    }

    /// Runs one analysis tick.
    ///
    /// # Arguments
    /// * `frame` - This tick's buffer; `None` when the source had nothing
    /// * `timestamp` - Tick time in seconds
    pub fn tick(&mut self, frame: Option<Frame<'_>>, timestamp: f64) -> TickReport {
        if self.state != SessionState::Running {
            log::debug!("tick at {:.3}s ignored: session is {:?}", timestamp, self.state);
            return TickReport::skipped(timestamp);
        }
        let Some(frame) = frame else {
            log::debug!("tick at {:.3}s: no input", timestamp);
            return TickReport::skipped(timestamp);
        };

        let notes = self.detect(frame);
        let mut note_names: Vec<String> = Vec::with_capacity(notes.len());
        for note in &notes {
            if !note_names.contains(&note.pitch.note_name) {
                note_names.push(note.pitch.note_name.clone());
            }
        }
        if notes.is_empty() {
            log::debug!("tick at {:.3}s: no pitch", timestamp);
        }

        let label = self.tracker.label_of(&note_names);
        let observation = self.tracker.observe_labeled(&note_names, label.clone(), timestamp);

        TickReport {
            timestamp,
            notes,
            label,
            observation: Some(observation),
        }
    }

    /// Estimates the pitches present in one frame.
    pub fn detect(&self, frame: Frame<'_>) -> Vec<DetectedNote> {
        let frequencies = match frame {
            Frame::Spectrum {
                magnitudes_db,
                sample_rate,
                fft_size,
            } => extract_fundamentals(magnitudes_db, sample_rate, fft_size, &self.config.spectral()),
            Frame::TimeDomain {
                samples,
                sample_rate,
            } => detect_pitch_autocorrelation(samples, sample_rate, &self.config.autocorrelation())
                .into_iter()
                .collect(),
        };

        frequencies
            .into_iter()
            .filter_map(frequency_to_pitch)
            .map(|pitch| DetectedNote {
                tuning: pitch.tuning_status(self.config.in_tune_tolerance_cents),
                pitch,
            })
            .collect()
    }

    /// Lays the history out in lines of at most `max_per_line` chords.
    ///
    /// An open segment is shown provisionally closed at `now`.
    pub fn notation_lines(&self, max_per_line: usize, now: Option<f64>) -> Vec<NotationLine> {
        layout_lines(self.history(), now, max_per_line, &self.quantizer)
    }
}
