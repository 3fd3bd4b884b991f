// chord-core/src/lib.rs

//! The core logic for the chord recognizer.
//! This crate turns spectral or time-domain buffers into pitches, tracks
//! chord changes over time and lays the result out as notation lines. It is
//! completely headless: no audio devices, no file decoding, no drawing.
//!
//! One analysis tick flows like this:
//!
//! ```text
//! buffer -> peaks | pitch -> tuning -> note names -> tracker -> duration -> layout
//! ```
//!
//! ```
//! use chord_core::{AnalysisConfig, Frame, Session};
//!
//! let mut session = Session::new(AnalysisConfig::default())?;
//! session.start();
//!
//! let mut bins = vec![-120.0_f32; 4096];
//! bins[440] = -12.0;
//! session.tick(
//!     Some(Frame::Spectrum { magnitudes_db: &bins, sample_rate: 8192.0, fft_size: 8192 }),
//!     0.0,
//! );
//! session.stop(1.0);
//!
//! assert_eq!(session.history()[0].label, "A");
//! # Ok::<(), chord_core::ChordError>(())
//! ```

pub mod chord;
pub mod config;
pub mod duration;
pub mod error;
pub mod fft;
pub mod layout;
pub mod peaks;
pub mod pitch;
pub mod session;
pub mod tracker;
pub mod tuning;

pub use chord::{ChordNameResolver, ResolverError, TemplateChordResolver, UNKNOWN_CHORD};
pub use config::{AnalysisConfig, AnalysisMode};
pub use duration::{DurationQuantizer, DurationSymbol};
pub use error::{ChordError, Result};
pub use layout::{NotatedChord, NotationLine};
pub use session::{DetectedNote, Frame, Session, SessionState, TickReport};
pub use tracker::{ChordChangeTracker, ChordSegment, Observation};
pub use tuning::{Pitch, TuningStatus};
