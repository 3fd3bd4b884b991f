//! # Pitch Detection Module
//!
//! Single-fundamental estimation from a time-domain buffer by plain
//! (unnormalised) autocorrelation.
//!
//! ## Features
//! - RMS noise gate to filter out silence
//! - Edge trimming to reduce artifacts at the buffer boundaries
//! - First-dip skipping so the zero-lag peak is never reported

/// Parameters of the autocorrelation estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutocorrelationConfig {
    /// Buffers with RMS below this are treated as silence
    pub silence_rms_threshold: f32,
    /// Leading/trailing samples below this are trimmed off
    pub edge_trim_threshold: f32,
}

impl Default for AutocorrelationConfig {
    fn default() -> Self {
        Self {
            silence_rms_threshold: 0.01,
            edge_trim_threshold: 0.2,
        }
    }
}

/// Root mean square of a buffer; zero for an empty one.
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|&s| s * s).sum::<f32>() / signal.len() as f32).sqrt()
}

/// Trims the quiet start and end of a buffer.
///
/// The start index moves forward while samples are below `threshold`, but not
/// past the middle; the end index moves backward the same way and is
/// exclusive. This is a windowing heuristic, not an onset detector: the
/// comparison is on the signed sample, so the buffer starts at the first
/// sample that rises to the threshold. A buffer that is quiet throughout
/// trims to nothing.
pub fn trim_edges(signal: &[f32], threshold: f32) -> &[f32] {
    let size = signal.len();
    if size == 0 {
        return signal;
    }

    let mut start = 0;
    while 2 * start < size && signal[start] < threshold {
        start += 1;
    }
    let mut end = size - 1;
    while 2 * end > size && signal[end] < threshold {
        end -= 1;
    }
    &signal[start.min(end)..end]
}

/// Unnormalised autocorrelation `c[lag] = Σ_j x[j] * x[j + lag]` for every lag.
pub fn autocorrelation(signal: &[f32]) -> Vec<f32> {
    let size = signal.len();
    (0..size)
        .map(|lag| {
            signal[..size - lag]
                .iter()
                .zip(&signal[lag..])
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

/// Estimates the fundamental frequency of a buffer by autocorrelation.
///
/// 1. Silence gate on RMS
/// 2. Edge trimming (see [`trim_edges`])
/// 3. Autocorrelation over all lags of the trimmed buffer
/// 4. Skip the slope that descends from lag 0
/// 5. Take the lag with the highest correlation from there on as the period
///
/// Cost is O(n²) in the buffer length: a 2048-sample window is about four
/// million multiply-adds per call. Keep analysis windows to a few thousand
/// samples.
///
/// # Arguments
/// * `signal` - Input audio signal
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Silence and trimming thresholds
///
/// # Returns
/// * `Some(frequency)` - Estimated fundamental in Hz
/// * `None` - Silence, or no usable period (degenerate buffer)
pub fn detect_pitch_autocorrelation(
    signal: &[f32],
    sample_rate: f32,
    config: &AutocorrelationConfig,
) -> Option<f32> {
    // --- Noise Gate ---
    let level = rms(signal);
    if signal.is_empty() || level < config.silence_rms_threshold {
        log::trace!("autocorrelation: below silence gate (rms {:.4})", level);
        return None;
    }

    let trimmed = trim_edges(signal, config.edge_trim_threshold);
    if trimmed.len() < 2 {
        return None;
    }

    let correlation = autocorrelation(trimmed);

    // --- Skip the initial descending slope ---
    let mut dip = 0;
    while dip + 1 < correlation.len() && correlation[dip] > correlation[dip + 1] {
        dip += 1;
    }
    if dip + 1 >= correlation.len() {
        // Correlation fell all the way to the last lag: no periodicity.
        return None;
    }

    // --- Strongest lag after the dip ---
    let mut best: Option<(usize, f32)> = None;
    for (lag, &value) in correlation.iter().enumerate().skip(dip) {
        if best.is_none_or(|(_, max)| value > max) {
            best = Some((lag, value));
        }
    }

    let period = match best {
        Some((lag, _)) if lag > 0 => lag,
        _ => return None,
    };

    let frequency = sample_rate / period as f32;
    frequency.is_finite().then_some(frequency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, sample_rate: f32, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn detects_a4_sine() {
        let signal = sine(440.0, 44100.0, 0.5, 2048);
        let freq = detect_pitch_autocorrelation(&signal, 44100.0, &AutocorrelationConfig::default())
            .expect("sine should have a pitch");
        assert!((freq - 440.0).abs() / 440.0 < 0.02, "got {} Hz", freq);
    }

    #[test]
    fn detects_low_e_string() {
        let signal = sine(82.41, 44100.0, 0.8, 4096);
        let freq = detect_pitch_autocorrelation(&signal, 44100.0, &AutocorrelationConfig::default())
            .expect("sine should have a pitch");
        assert!((freq - 82.41).abs() / 82.41 < 0.02, "got {} Hz", freq);
    }

    #[test]
    fn all_zero_buffer_has_no_pitch() {
        let signal = vec![0.0; 2048];
        assert_eq!(
            detect_pitch_autocorrelation(&signal, 44100.0, &AutocorrelationConfig::default()),
            None
        );
    }

    #[test]
    fn quiet_buffer_has_no_pitch() {
        let signal = sine(440.0, 44100.0, 0.005, 2048);
        assert!(rms(&signal) < 0.01);
        assert_eq!(
            detect_pitch_autocorrelation(&signal, 44100.0, &AutocorrelationConfig::default()),
            None
        );
    }

    #[test]
    fn empty_buffer_has_no_pitch() {
        assert_eq!(
            detect_pitch_autocorrelation(&[], 44100.0, &AutocorrelationConfig::default()),
            None
        );
    }

    #[test]
    fn constant_buffer_has_no_period() {
        // Correlation only ever decreases with lag, so no period exists.
        let signal = vec![0.5; 256];
        assert_eq!(
            detect_pitch_autocorrelation(&signal, 44100.0, &AutocorrelationConfig::default()),
            None
        );
    }

    #[test]
    fn trimming_stops_at_the_middle() {
        let signal = [0.0, 0.0, 0.5, 0.1, 0.6, 0.0];
        assert_eq!(trim_edges(&signal, 0.2), &[0.5, 0.1]);
        assert!(trim_edges(&[0.0; 6], 0.2).is_empty());
        assert!(trim_edges(&[0.0; 5], 0.2).is_empty());
        assert!(trim_edges(&[], 0.2).is_empty());
    }

    #[test]
    fn trimming_odd_lengths_can_reach_the_upper_middle() {
        // The start may advance to index 3 of 7; the end bound stays exclusive.
        let signal = [0.0, 0.0, 0.0, 0.9, 0.8, 0.7, 0.0];
        assert_eq!(trim_edges(&signal, 0.2), &[0.9, 0.8]);
    }

    #[test]
    fn autocorrelation_of_impulse_pair() {
        let c = autocorrelation(&[1.0, 0.0, 1.0]);
        assert_eq!(c, vec![2.0, 0.0, 1.0]);
    }
}
