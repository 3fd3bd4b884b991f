//! Microphone capture and the live recognition loop.
//!
//! The input callback runs on the audio thread and hands fixed-size frames to
//! the analysis loop over a bounded channel. Frames that do not fit are dropped.

use anyhow::{Result, anyhow, bail};
use chord_core::{Frame, Session, TickReport};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, after, bounded, select};
use std::time::{Duration, Instant};

use crate::replay::FrameBuilder;

/// Preferred capture rate.
pub const TARGET_SAMPLE_RATE: u32 = 44100;

/// Starts capture from the default input device, sending frames of
/// `frame_len` samples.
pub fn start_audio_capture(sender: Sender<Vec<f32>>, frame_len: usize) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("no input device available"))?;

    log::info!("using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, TARGET_SAMPLE_RATE)
        .ok_or_else(|| anyhow!("no mono f32 input format found"))?;

    let rate = TARGET_SAMPLE_RATE.clamp(supported_config.min_sample_rate().0, supported_config.max_sample_rate().0);
    let config: cpal::StreamConfig = supported_config.with_sample_rate(cpal::SampleRate(rate)).into();
    log::info!("capturing at {} Hz, {} samples per frame", rate, frame_len);

    let err_fn = |err| log::error!("audio stream error: {}", err);

    let mut pending = Vec::with_capacity(frame_len * 2);
    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            pending.extend_from_slice(data);
            while pending.len() >= frame_len {
                let frame = pending[..frame_len].to_vec();
                if sender.try_send(frame).is_err() {
                    log::trace!("analysis loop behind, dropped a frame");
                }
                pending.drain(..frame_len);
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;
    Ok((stream, rate))
}

/// Picks the mono f32 configuration whose range lies closest to `target_rate`.
fn find_supported_config(configs: Vec<SupportedStreamConfigRange>, target_rate: u32) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min = c.min_sample_rate().0;
            let max = c.max_sample_rate().0;
            if (min..=max).contains(&target_rate) {
                0
            } else {
                min.abs_diff(target_rate).min(max.abs_diff(target_rate))
            }
        })
}

/// How long a `listen` run lasts; `seconds` must be finite and not negative.
fn listen_duration(seconds: f64) -> Result<Duration> {
    if !seconds.is_finite() || seconds < 0.0 {
        bail!("listen duration must be a finite number of seconds, got {}", seconds);
    }
    Ok(Duration::from_secs_f64(seconds))
}

/// Runs the session on live input for `seconds`, calling `on_tick` after each
/// analysed frame. Timestamps are seconds since capture started.
pub fn listen<F>(session: &mut Session, seconds: f64, mut on_tick: F) -> Result<()>
where
    F: FnMut(&Session, &TickReport),
{
    let duration = listen_duration(seconds)?;
    let mut builder = FrameBuilder::for_session(session)?;
    let (sender, receiver): (Sender<Vec<f32>>, Receiver<Vec<f32>>) = bounded(8);
    let (_stream, sample_rate) = start_audio_capture(sender, builder.block_len())?;

    let deadline = after(duration);
    let started = Instant::now();
    session.start();

    loop {
        select! {
            recv(receiver) -> msg => {
                let samples = msg?;
                let timestamp = started.elapsed().as_secs_f64();
                let frame = builder.frame(&samples, 0, sample_rate as f32);
                let report = session.tick(Some(frame), timestamp);
                on_tick(session, &report);
            }
            recv(deadline) -> _ => break,
        }
    }

    session.stop(started.elapsed().as_secs_f64());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn listen_duration_rejects_non_finite_values() {
        assert_eq!(listen_duration(1.5).unwrap(), Duration::from_millis(1500));
        assert_eq!(listen_duration(0.0).unwrap(), Duration::ZERO);
        assert!(listen_duration(f64::INFINITY).is_err());
        assert!(listen_duration(f64::NAN).is_err());
        assert!(listen_duration(-1.0).is_err());
    }
}
