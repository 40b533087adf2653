mod engine;
mod options;

#[cfg(feature = "whisper")]
mod whisper;

pub use engine::{Segment, SpeechEngine, TimedWord, Transcription, TranscriptionInfo};
pub use options::{DecodeOptions, Task};

#[cfg(feature = "whisper")]
pub use whisper::WhisperEngine;

#[derive(Debug, thiserror::Error)]
pub enum SttError {
    #[error("model not loaded")]
    ModelNotLoaded,
    #[error("model load failed: {0}")]
    LoadFailed(String),
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
    #[error("invalid audio: {0}")]
    InvalidAudio(String),
}

pub type Result<T> = std::result::Result<T, SttError>;
