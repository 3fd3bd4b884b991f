//! WAV decoding into mono `f32` samples.

use anyhow::{Context, Result, bail};
use std::io::Read;
use std::path::Path;

/// Decoded mono audio.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Loads a WAV file and mixes it down to mono.
pub fn load_wav(path: &Path) -> Result<DecodedAudio> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    decode(reader).with_context(|| format!("failed to decode {}", path.display()))
}

/// Decodes any WAV stream and mixes it down to mono.
pub fn decode<R: Read>(mut reader: hound::WavReader<R>) -> Result<DecodedAudio> {
    let spec = reader.spec();
    if spec.channels == 0 || spec.sample_rate == 0 || spec.bits_per_sample == 0 {
        bail!("unsupported WAV layout: {} channels at {} Hz", spec.channels, spec.sample_rate);
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let channels = spec.channels as usize;
    let mono = if channels == 1 {
        samples
    } else {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    log::debug!("decoded {} samples at {} Hz", mono.len(), spec.sample_rate);
    Ok(DecodedAudio {
        samples: mono,
        sample_rate: spec.sample_rate,
    })
}

/// Start offsets of analysis blocks of `block_len` samples, `hop` apart.
///
/// Blocks continue until one reaches the end of the audio, so every sample
/// is covered; the last block may run past the end and callers zero-pad it.
/// Audio shorter than one block still yields a single block at 0.
pub fn block_starts(total: usize, block_len: usize, hop: usize) -> impl Iterator<Item = usize> {
    let hop = hop.max(1);
    let mut next = Some(0);
    std::iter::from_fn(move || {
        let start = next?;
        next = (start + block_len < total).then(|| start + hop);
        Some(start)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn wav_bytes(spec: hound::WavSpec, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn stereo_is_mixed_to_mono() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, &[16384, 0, -16384, -16384]);
        let audio = decode(hound::WavReader::new(Cursor::new(bytes)).unwrap()).unwrap();
        assert_eq!(audio.sample_rate, 8000);
        assert_eq!(audio.samples, vec![0.25, -0.5]);
        assert_eq!(audio.duration_secs(), 2.0 / 8000.0);
    }

    #[test]
    fn block_starts_cover_the_audio() {
        assert_eq!(block_starts(10, 4, 2).collect::<Vec<_>>(), vec![0, 2, 4, 6]);
        assert_eq!(block_starts(3, 4, 2).collect::<Vec<_>>(), vec![0]);
        assert_eq!(block_starts(0, 4, 2).collect::<Vec<_>>(), vec![0]);
        assert_eq!(block_starts(8, 4, 0).count(), 5);
    }

    #[test]
    fn last_block_reaches_the_final_sample() {
        assert_eq!(block_starts(11, 4, 3).collect::<Vec<_>>(), vec![0, 3, 6, 9]);
        for (total, block_len, hop) in [(11, 4, 3), (44100, 4096, 2048), (5000, 2048, 1000), (7, 2, 5)] {
            let last = block_starts(total, block_len, hop).last().unwrap();
            assert!(last + block_len >= total, "{} {} {}", total, block_len, hop);
        }
    }
}
