//! WAV decoding into a mono [`SampleBuffer`].

use anyhow::{Context, Result, bail};
use hound::{SampleFormat, WavReader};
use std::path::Path;
use swara_core::SampleBuffer;
use tracing::debug;

/// Loads a WAV file, converting integer PCM to `[-1, 1]` floats and mixing
/// every channel down to mono by averaging.
pub fn load(path: &Path) -> Result<SampleBuffer> {
    let mut reader =
        WavReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();
    debug!(
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        "decoding wav"
    );

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .context("failed to decode float samples")?,
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                bail!("unsupported bit depth: {}", spec.bits_per_sample);
            }
            let max_value = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<std::result::Result<_, _>>()
                .context("failed to decode integer samples")?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let mono = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(SampleBuffer::new(mono, spec.sample_rate)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("swara-{}-{}.wav", name, std::process::id()))
    }

    #[test]
    fn stereo_int_file_is_mixed_to_mono() {
        let path = temp_path("stereo");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..4 {
            writer.write_sample(16384_i16).unwrap();
            writer.write_sample(0_i16).unwrap();
        }
        writer.finalize().unwrap();

        let buffer = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(buffer.sample_rate(), 8000);
        assert_eq!(buffer.len(), 4);
        assert!((buffer.samples()[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load(Path::new("/definitely/not/here.wav")).is_err());
    }
}
