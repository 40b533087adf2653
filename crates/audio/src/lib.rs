mod wav;

pub use wav::{read_wav_mono_16k, write_wav_mono_16k};

/// Standard sample rate for all transcription processing.
pub const SAMPLE_RATE: u32 = 16000;

/// Duration in seconds of a waveform with `sample_count` samples at
/// [`SAMPLE_RATE`].
pub fn duration_secs(sample_count: usize) -> f64 {
    sample_count as f64 / SAMPLE_RATE as f64
}

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported wav layout: {0}")]
    UnsupportedLayout(String),
}

pub type Result<T> = std::result::Result<T, AudioError>;
