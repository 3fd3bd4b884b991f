//! # Spectral Peak Module
//!
//! Picks up to a handful of fundamentals out of a dB magnitude spectrum,
//! discarding peaks that look like the 2nd, 3rd or 4th harmonic of a louder
//! fundamental that was already accepted.
//!
//! ## Known limitations
//! The acceptance pass is greedy, in descending amplitude order, so it is an
//! approximation:
//! - a harmonic that is louder than its own fundamental is accepted first and
//!   does not reject the quieter fundamental that follows it;
//! - ratios close to, but not within tolerance of, an integer (inharmonic
//!   strings, bin quantisation at low frequencies) can admit spurious
//!   fundamentals;
//! - peaks with equal amplitude are visited in no particular order.

/// A local maximum of the spectrum, alive for one analysis tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchCandidate {
    /// Bin centre frequency in Hz
    pub frequency_hz: f32,
    /// Bin magnitude in dB
    pub amplitude_db: f32,
}

/// Parameters of the peak picker and harmonic rejection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralConfig {
    pub amplitude_threshold_db: f32,
    pub max_frequency_hz: f32,
    pub max_fundamentals: usize,
    pub harmonic_ratio_tolerance: f32,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            amplitude_threshold_db: -40.0,
            max_frequency_hz: 1500.0,
            max_fundamentals: 3,
            harmonic_ratio_tolerance: 0.03,
        }
    }
}

/// Harmonic numbers checked during rejection.
const HARMONICS: [f32; 3] = [2.0, 3.0, 4.0];

/// Finds every local maximum above the threshold and below the frequency
/// ceiling.
///
/// Bin `i` qualifies when it is louder than the threshold and strictly louder
/// than both neighbours, so the first and last bins never do.
///
/// # Arguments
/// * `spectrum_db` - Magnitudes in dB, index = bin
/// * `sample_rate` - Sample rate in Hz
/// * `fft_size` - Transform size the bins came from
/// * `config` - Threshold and ceiling
pub fn find_peak_candidates(
    spectrum_db: &[f32],
    sample_rate: f32,
    fft_size: usize,
    config: &SpectralConfig,
) -> Vec<PitchCandidate> {
    if spectrum_db.len() < 3 || fft_size == 0 {
        return Vec::new();
    }
    let bin_hz = sample_rate / fft_size as f32;

    spectrum_db
        .windows(3)
        .enumerate()
        .filter_map(|(offset, window)| {
            let (left, amp, right) = (window[0], window[1], window[2]);
            let frequency_hz = (offset + 1) as f32 * bin_hz;
            let is_peak = amp > config.amplitude_threshold_db && amp > left && amp > right;
            (is_peak && frequency_hz < config.max_frequency_hz).then_some(PitchCandidate {
                frequency_hz,
                amplitude_db: amp,
            })
        })
        .collect()
}

/// Returns `true` if `freq` sits within `tolerance` of 2x, 3x or 4x `base`.
pub fn is_harmonic_of(freq: f32, base: f32, tolerance: f32) -> bool {
    let ratio = freq / base;
    HARMONICS.iter().any(|&n| (ratio - n).abs() < tolerance)
}

/// Extracts harmonically independent fundamentals from a dB spectrum.
///
/// # Returns
/// * Fundamental frequencies in descending amplitude order, at most
///   `config.max_fundamentals` of them; empty for silence or sub-threshold
///   input
pub fn extract_fundamentals(
    spectrum_db: &[f32],
    sample_rate: f32,
    fft_size: usize,
    config: &SpectralConfig,
) -> Vec<f32> {
    let mut candidates = find_peak_candidates(spectrum_db, sample_rate, fft_size, config);
    candidates.sort_unstable_by(|a, b| b.amplitude_db.total_cmp(&a.amplitude_db));

    let mut fundamentals: Vec<f32> = Vec::with_capacity(config.max_fundamentals);
    for candidate in candidates {
        if fundamentals.len() >= config.max_fundamentals {
            break;
        }
        let harmonic = fundamentals
            .iter()
            .any(|&base| is_harmonic_of(candidate.frequency_hz, base, config.harmonic_ratio_tolerance));
        if harmonic {
            log::trace!("rejected {:.1} Hz as a harmonic", candidate.frequency_hz);
            continue;
        }
        fundamentals.push(candidate.frequency_hz);
    }
    fundamentals
}
