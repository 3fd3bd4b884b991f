//! Replays decoded audio through a session, one tick per analysis block.

use anyhow::Result;
use chord_core::fft::SpectrumAnalyzer;
use chord_core::{AnalysisMode, Frame, Session, TickReport};

use crate::wav::{DecodedAudio, block_starts};

/// Builds the per-tick frame for whichever estimator the session uses.
pub struct FrameBuilder {
    mode: AnalysisMode,
    block_len: usize,
    analyzer: Option<SpectrumAnalyzer>,
    scratch: Vec<f32>,
    spectrum: Vec<f32>,
}

impl FrameBuilder {
    pub fn for_session(session: &Session) -> Result<Self> {
        let config = session.config();
        let (block_len, analyzer) = match config.mode {
            AnalysisMode::Spectral => (config.fft_size, Some(SpectrumAnalyzer::new(config.fft_size)?)),
            AnalysisMode::Autocorrelation => (config.frame_size, None),
        };
        Ok(Self {
            mode: config.mode,
            block_len,
            analyzer,
            scratch: Vec::with_capacity(block_len),
            spectrum: Vec::new(),
        })
    }

    /// Samples consumed per tick.
    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Copies `block_len` samples from `start` (zero-padded past the end) and
    /// turns them into a frame.
    pub fn frame<'a>(&'a mut self, samples: &[f32], start: usize, sample_rate: f32) -> Frame<'a> {
        let end = (start + self.block_len).min(samples.len());
        self.scratch.clear();
        self.scratch.extend_from_slice(&samples[start.min(end)..end]);
        self.scratch.resize(self.block_len, 0.0);

        match (&self.mode, &self.analyzer) {
            (AnalysisMode::Spectral, Some(analyzer)) => {
                self.spectrum = analyzer.magnitudes_db(&self.scratch);
                Frame::Spectrum {
                    magnitudes_db: &self.spectrum,
                    sample_rate,
                    fft_size: analyzer.fft_size(),
                }
            }
            _ => Frame::TimeDomain {
                samples: &self.scratch,
                sample_rate,
            },
        }
    }
}

/// Runs a full session over `audio`, ticking every `hop` samples.
///
/// Each tick is stamped with the block's start time. The session is
/// restarted first and stopped at the end of the audio, so calling this twice
/// on the same session replays from scratch.
pub fn replay(session: &mut Session, audio: &DecodedAudio, hop: usize) -> Result<Vec<TickReport>> {
    let mut builder = FrameBuilder::for_session(session)?;
    let sample_rate = audio.sample_rate as f32;
    let mut reports = Vec::new();

    session.start();
    for start in block_starts(audio.samples.len(), builder.block_len(), hop) {
        let timestamp = start as f64 / audio.sample_rate as f64;
        let frame = builder.frame(&audio.samples, start, sample_rate);
        reports.push(session.tick(Some(frame), timestamp));
    }
    session.stop(audio.duration_secs());

    log::info!(
        "replayed {:.2}s of audio in {} ticks, {} segments",
        audio.duration_secs(),
        reports.len(),
        session.history().len()
    );
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chord_core::AnalysisConfig;
    use pretty_assertions::assert_eq;

    fn tone(freqs: &[f32], secs: f32, sample_rate: u32) -> Vec<f32> {
        tone_samples(freqs, (secs * sample_rate as f32) as usize, sample_rate)
    }

    fn tone_samples(freqs: &[f32], len: usize, sample_rate: u32) -> Vec<f32> {
        (0..len)
            .map(|n| {
                freqs
                    .iter()
                    .map(|&f| 0.3 * (2.0 * std::f32::consts::PI * f * n as f32 / sample_rate as f32).sin())
                    .sum()
            })
            .collect()
    }

    #[test]
    fn replays_a_single_note_file() {
        // Twenty-one hops past the first block, so no block needs padding.
        let len = 4096 + 21 * 2048;
        let audio = DecodedAudio {
            samples: tone_samples(&[440.0], len, 44100),
            sample_rate: 44100,
        };
        let mut session = Session::new(AnalysisConfig::default()).unwrap();
        let reports = replay(&mut session, &audio, 2048).unwrap();

        assert!(!reports.is_empty());
        let history = session.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].label, "A");
        assert_eq!(history[0].end_time, Some(len as f64 / 44100.0));
        assert_eq!(reports.len(), 22);
        assert_eq!(reports.last().map(|r| r.timestamp), Some(21.0 * 2048.0 / 44100.0));

        // A second replay starts from a clean history.
        replay(&mut session, &audio, 2048).unwrap();
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn autocorrelation_mode_uses_time_domain_blocks() {
        let config = AnalysisConfig {
            mode: chord_core::AnalysisMode::Autocorrelation,
            ..Default::default()
        };
        let audio = DecodedAudio {
            samples: tone(&[330.0], 0.5, 44100),
            sample_rate: 44100,
        };
        let mut session = Session::new(config).unwrap();
        let reports = replay(&mut session, &audio, 2048).unwrap();
        assert!(reports.iter().all(|r| r.notes.len() <= 1));
        assert_eq!(session.history()[0].note_names, vec!["E4".to_string()]);
    }
}
