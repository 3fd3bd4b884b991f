//! Configuration parameters for a recognition session

use serde::{Deserialize, Serialize};

use crate::error::{ChordError, Result};
use crate::peaks::SpectralConfig;
use crate::pitch::AutocorrelationConfig;

/// Which estimator turns a buffer into pitches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Up to `max_fundamentals` notes from a dB magnitude spectrum.
    #[default]
    Spectral,
    /// A single note from a time-domain buffer.
    Autocorrelation,
}

/// Analysis configuration parameters.
///
/// Every session owns its own copy, so two sessions can run with different
/// thresholds side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Spectral peak extraction
    /// Minimum bin magnitude in dB for a peak (default: -40.0)
    pub amplitude_threshold_db: f32,

    /// Peaks at or above this frequency are ignored (default: 1500.0 Hz)
    pub max_frequency_hz: f32,

    /// Maximum simultaneous fundamentals (default: 3)
    pub max_fundamentals: usize,

    /// Allowed distance of a frequency ratio from 2, 3 or 4 before a peak
    /// counts as a harmonic (default: 0.03)
    pub harmonic_ratio_tolerance: f32,

    // Autocorrelation
    /// Buffers with RMS below this are silent (default: 0.01)
    pub silence_rms_threshold: f32,

    /// Leading/trailing samples below this are trimmed (default: 0.2)
    pub edge_trim_threshold: f32,

    // Tuning and notation
    /// Cents window reported as in tune (default: 5.0)
    pub in_tune_tolerance_cents: f32,

    /// Tempo used to turn seconds into note values (default: 120.0 BPM)
    pub tempo_bpm: f64,

    /// Close the open segment after this many seconds of silence.
    /// `None` keeps the segment open through silence (default: None)
    pub silence_close_after_secs: Option<f64>,

    // Framing, used by drivers that build buffers from raw audio
    /// Estimator selection (default: Spectral)
    pub mode: AnalysisMode,

    /// Transform size for spectral frames (default: 4096)
    pub fft_size: usize,

    /// Buffer length for autocorrelation frames (default: 2048)
    pub frame_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            amplitude_threshold_db: -40.0,
            max_frequency_hz: 1500.0,
            max_fundamentals: 3,
            harmonic_ratio_tolerance: 0.03,
            silence_rms_threshold: 0.01,
            edge_trim_threshold: 0.2,
            in_tune_tolerance_cents: 5.0,
            tempo_bpm: 120.0,
            silence_close_after_secs: None,
            mode: AnalysisMode::Spectral,
            fft_size: 4096,
            frame_size: 2048,
        }
    }
}

impl AnalysisConfig {
    /// Checks every field against its valid range.
    pub fn validate(&self) -> Result<()> {
        if !self.amplitude_threshold_db.is_finite() {
            return Err(ChordError::config("amplitude_threshold_db", "must be finite"));
        }
        if !(self.max_frequency_hz > 0.0) {
            return Err(ChordError::config("max_frequency_hz", "must be positive"));
        }
        if self.max_fundamentals == 0 {
            return Err(ChordError::config("max_fundamentals", "must be at least 1"));
        }
        if !(self.harmonic_ratio_tolerance >= 0.0 && self.harmonic_ratio_tolerance < 0.5) {
            return Err(ChordError::config(
                "harmonic_ratio_tolerance",
                "must be in [0, 0.5)",
            ));
        }
        if !(self.silence_rms_threshold >= 0.0) {
            return Err(ChordError::config("silence_rms_threshold", "must not be negative"));
        }
        if !self.edge_trim_threshold.is_finite() {
            return Err(ChordError::config("edge_trim_threshold", "must be finite"));
        }
        if !(self.in_tune_tolerance_cents >= 0.0) {
            return Err(ChordError::config("in_tune_tolerance_cents", "must not be negative"));
        }
        if !(self.tempo_bpm > 0.0 && self.tempo_bpm.is_finite()) {
            return Err(ChordError::config("tempo_bpm", "must be a positive number"));
        }
        if let Some(secs) = self.silence_close_after_secs {
            if !(secs >= 0.0) {
                return Err(ChordError::config(
                    "silence_close_after_secs",
                    "must not be negative",
                ));
            }
        }
        if self.fft_size < 4 {
            return Err(ChordError::config("fft_size", "must be at least 4"));
        }
        if self.frame_size < 2 {
            return Err(ChordError::config("frame_size", "must be at least 2"));
        }
        Ok(())
    }

    /// The subset consumed by the spectral peak extractor.
    pub fn spectral(&self) -> SpectralConfig {
        SpectralConfig {
            amplitude_threshold_db: self.amplitude_threshold_db,
            max_frequency_hz: self.max_frequency_hz,
            max_fundamentals: self.max_fundamentals,
            harmonic_ratio_tolerance: self.harmonic_ratio_tolerance,
        }
    }

    /// The subset consumed by the autocorrelation estimator.
    pub fn autocorrelation(&self) -> AutocorrelationConfig {
        AutocorrelationConfig {
            silence_rms_threshold: self.silence_rms_threshold,
            edge_trim_threshold: self.edge_trim_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_tempo() {
        let config = AnalysisConfig {
            tempo_bpm: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ChordError::InvalidConfig { ref name, .. }) if name == "tempo_bpm"
        ));
    }

    #[test]
    fn rejects_nan_frequency_ceiling() {
        let config = AnalysisConfig {
            max_frequency_hz: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{ "tempo_bpm": 90.0, "mode": "autocorrelation" }"#).unwrap();
        assert_eq!(config.tempo_bpm, 90.0);
        assert_eq!(config.mode, AnalysisMode::Autocorrelation);
        assert_eq!(config.max_fundamentals, 3);
        assert_eq!(config.silence_close_after_secs, None);
    }
}
