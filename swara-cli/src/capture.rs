//! # Microphone Capture Module
//!
//! Records a fixed-length take from the default input device using CPAL and
//! hands it over as one mono [`SampleBuffer`] for live-input analysis.
//!
//! ## Features
//! - Automatic audio device selection
//! - Prefers mono 32-bit float input near 44.1 kHz
//! - Multi-channel input mixed down to mono in the callback

use anyhow::{Result, anyhow, bail};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Receiver;
use std::time::{Duration, Instant};
use swara_core::SampleBuffer;
use tracing::{info, warn};

/// Sample rate requested from the device.
const TARGET_SAMPLE_RATE: u32 = 44100;

/// Longest take accepted from the command line.
const MAX_TAKE_SECONDS: f32 = 600.0;

/// Records `seconds` of audio from the default input device.
///
/// # Returns
/// * `Ok(buffer)` - The captured take, mono
/// * `Err(e)` - Bad take length, no device, no f32 format, or the stream failed to start
pub fn record(seconds: f32) -> Result<SampleBuffer> {
    check_take_length(seconds)?;
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;
    info!(device = %device.name()?, "using audio input device");

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, TARGET_SAMPLE_RATE)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let rate = TARGET_SAMPLE_RATE
        .clamp(supported_config.min_sample_rate().0, supported_config.max_sample_rate().0);
    let config = supported_config.with_sample_rate(cpal::SampleRate(rate));
    let channels = config.channels().max(1) as usize;
    let config: cpal::StreamConfig = config.into();
    info!(sample_rate = rate, channels, "selected input format");

    let (sender, receiver) = crossbeam_channel::unbounded::<Vec<f32>>();
    let err_fn = |err| warn!("an error occurred on the audio stream: {}", err);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            let mono: Vec<f32> = data
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect();
            // The receiver only goes away once recording is over.
            let _ = sender.send(mono);
        },
        err_fn,
        None,
    )?;
    stream.play()?;

    let wanted = (seconds * rate as f32) as usize;
    let samples = collect(&receiver, wanted, Duration::from_secs_f32(seconds + 2.0));
    drop(stream);

    info!(samples = samples.len(), "recording finished");
    Ok(SampleBuffer::new(samples, rate)?)
}

fn check_take_length(seconds: f32) -> Result<()> {
    if !seconds.is_finite() || seconds <= 0.0 {
        bail!("take length must be a positive number of seconds, got {}", seconds);
    }
    if seconds > MAX_TAKE_SECONDS {
        bail!("take length {}s exceeds the {}s limit", seconds, MAX_TAKE_SECONDS);
    }
    Ok(())
}

/// Drains chunks until `wanted` samples arrived or `timeout` passed.
fn collect(receiver: &Receiver<Vec<f32>>, wanted: usize, timeout: Duration) -> Vec<f32> {
    let deadline = Instant::now() + timeout;
    let mut samples = Vec::with_capacity(wanted);
    while samples.len() < wanted {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match receiver.recv_timeout(remaining) {
            Ok(chunk) => samples.extend_from_slice(&chunk),
            Err(_) => break,
        }
    }
    samples.truncate(wanted);
    samples
}

/// Finds the best supported f32 input configuration, preferring mono and
/// the sample rate closest to `target_rate`.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i64 - target_rate as i64).abs();
            let max_diff = (c.max_sample_rate().0 as i64 - target_rate as i64).abs();
            let in_range = c.min_sample_rate().0 <= target_rate && target_rate <= c.max_sample_rate().0;
            let rate_penalty = if in_range { 0 } else { min_diff.min(max_diff) };
            (c.channels() != 1, rate_penalty)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_stops_at_requested_length() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(vec![0.1; 300]).unwrap();
        tx.send(vec![0.2; 300]).unwrap();
        let samples = collect(&rx, 500, Duration::from_millis(50));
        assert_eq!(samples.len(), 500);
        assert_eq!(samples[499], 0.2);
    }

    #[test]
    fn take_length_must_be_positive_and_finite() {
        assert!(check_take_length(5.0).is_ok());
        for seconds in [0.0, -1.0, f32::INFINITY, f32::NAN, 1e30] {
            assert!(check_take_length(seconds).is_err());
        }
    }

    #[test]
    fn collect_gives_up_after_timeout() {
        let (tx, rx) = crossbeam_channel::unbounded::<Vec<f32>>();
        tx.send(vec![0.0; 10]).unwrap();
        let samples = collect(&rx, 1000, Duration::from_millis(20));
        assert_eq!(samples.len(), 10);
    }
}
