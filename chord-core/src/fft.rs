//! # Fast Fourier Transform (FFT) Module
//!
//! Turns a block of samples into the dB magnitude spectrum the peak extractor
//! consumes. Live and file drivers use this to act as the "sample source";
//! the analysis core itself only ever sees the resulting buffer.
//!
//! ## Features
//! - High-performance FFT using RustFFT, planned once per transform size
//! - DC offset removal and Hann windowing
//! - Magnitudes normalised by the transform size and expressed in dB

use rustfft::{Fft, FftPlanner, num_complex::Complex};
use std::sync::Arc;

use crate::error::{ChordError, Result};

/// Floor applied to magnitudes before taking the logarithm.
pub const MIN_DB: f32 = -160.0;

/// Centres a block on zero.
///
/// A constant offset from the capture leaks through the window into the
/// lowest bins and lifts them above the dB floor the peak threshold is
/// measured against.
fn centre(block: &mut [f32]) {
    if block.is_empty() {
        return;
    }
    let mean = block.iter().sum::<f32>() / block.len() as f32;
    block.iter_mut().for_each(|sample| *sample -= mean);
}

/// Builds a Hann window of length `n`.
fn hann_window(n: usize) -> Vec<f32> {
    if n < 2 {
        return vec![1.0; n];
    }
    let n_minus_1 = (n - 1) as f32;
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n_minus_1).cos()))
        .collect()
}

/// A planned forward transform of a fixed size.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    fft_size: usize,
}

impl std::fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("fft_size", &self.fft_size)
            .finish()
    }
}

impl SpectrumAnalyzer {
    /// Plans a transform of `fft_size` points.
    ///
    /// # Errors
    /// * `ChordError::InvalidInput` for sizes below 4
    pub fn new(fft_size: usize) -> Result<Self> {
        if fft_size < 4 {
            return Err(ChordError::InvalidInput(format!(
                "FFT size {} is too small",
                fft_size
            )));
        }
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        Ok(Self {
            fft,
            window: hann_window(fft_size),
            fft_size,
        })
    }

    /// Transform size in samples.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of bins returned by [`Self::magnitudes_db`].
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Computes the dB magnitude spectrum of one block.
    ///
    /// The block is zero-padded or truncated to the transform size. Bins run
    /// from 0 Hz up to (but excluding) the Nyquist frequency.
    pub fn magnitudes_db(&self, signal: &[f32]) -> Vec<f32> {
        let mut processed: Vec<f32> = signal.iter().take(self.fft_size).copied().collect();
        processed.resize(self.fft_size, 0.0);
        centre(&mut processed);

        let mut buffer: Vec<Complex<f32>> = processed
            .into_iter()
            .zip(&self.window)
            .map(|(sample, w)| Complex {
                re: sample * w,
                im: 0.0,
            })
            .collect();

        self.fft.process(&mut buffer);

        let scale = 1.0 / self.fft_size as f32;
        buffer
            .iter()
            .take(self.bin_count())
            .map(|c| magnitude_to_db(c.norm() * scale))
            .collect()
    }
}

/// Converts a linear magnitude to dB, floored at [`MIN_DB`].
pub fn magnitude_to_db(magnitude: f32) -> f32 {
    if magnitude > 0.0 {
        (20.0 * magnitude.log10()).max(MIN_DB)
    } else {
        MIN_DB
    }
}
