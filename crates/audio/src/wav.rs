use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::{AudioError, Result, SAMPLE_RATE};

/// Read a WAV file and return mono f32 samples at 16kHz.
///
/// Multi-channel audio is mixed down by averaging frames; other sample
/// rates are resampled with linear interpolation.
pub fn read_wav_mono_16k(path: impl AsRef<Path>) -> Result<Vec<f32>> {
    let path = path.as_ref();
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(AudioError::UnsupportedLayout(format!(
                    "{} bits per sample",
                    spec.bits_per_sample
                )));
            }
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let mut mono = Vec::with_capacity(interleaved.len() / channels);
    for frame in interleaved.chunks(channels) {
        let sum: f32 = frame.iter().sum();
        mono.push(sum / channels as f32);
    }

    let samples = if spec.sample_rate == SAMPLE_RATE {
        mono
    } else {
        resample_linear(&mono, spec.sample_rate, SAMPLE_RATE)
    };

    tracing::debug!(
        path = %path.display(),
        source_rate = spec.sample_rate,
        channels,
        samples = samples.len(),
        "wav decoded"
    );

    Ok(samples)
}

/// Write mono f32 samples as a 16-bit PCM WAV at 16kHz.
///
/// Mainly used to produce fixtures and to persist synthetic waveforms;
/// samples are clamped to [-1.0, 1.0].
pub fn write_wav_mono_16k(path: impl AsRef<Path>, samples: &[f32]) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path.as_ref(), spec)?;
    for &sample in samples {
        let clamped = (sample * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32);
        writer.write_sample(clamped as i16)?;
    }
    writer.finalize()?;

    Ok(())
}

/// Resample audio using linear interpolation.
fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }
    let ratio = to_rate as f64 / from_rate as f64;
    let new_len = (samples.len() as f64 * ratio) as usize;
    let mut output = Vec::with_capacity(new_len);
    for i in 0..new_len {
        let src_idx = i as f64 / ratio;
        let idx = src_idx.floor() as usize;
        let frac = src_idx.fract() as f32;
        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };
        output.push(sample);
    }
    output
}
