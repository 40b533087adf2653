mod batch;
mod buffer;
mod commit;
mod replay;
mod stream;

pub use batch::transcribe_file;
pub use buffer::AudioBuffer;
pub use commit::{CommitTracker, TranscriptSpan};
pub use replay::FileReplay;
pub use stream::StreamSession;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("transcription failed: {0}")]
    Stt(#[from] sotto_stt::SttError),
    #[error("audio error: {0}")]
    Audio(#[from] sotto_audio::AudioError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
