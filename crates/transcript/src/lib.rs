use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TranscriptError>;

/// One emitted piece of a live transcription.
///
/// Times are in milliseconds. `emission_time_ms` is measured from the
/// start of the stream; `segment_start_ms`/`segment_end_ms` locate the
/// text within the audio. The closing flush of a stream sets `is_final`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEvent {
    pub emission_time_ms: f64,
    pub segment_start_ms: f64,
    pub segment_end_ms: f64,
    pub text: String,
    #[serde(rename = "final", default)]
    pub is_final: bool,
}

/// Writes finished transcriptions as timestamped text files.
#[derive(Debug, Clone)]
pub struct TranscriptWriter {
    output_dir: PathBuf,
}

impl TranscriptWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Save a transcription to `transcription_<unix_ts>.txt` inside the
    /// output directory, creating the directory if needed. Returns the
    /// path of the written file.
    pub fn save(&self, text: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let filename = format!("transcription_{}.txt", Utc::now().timestamp());
        let path = self.output_dir.join(filename);
        fs::write(&path, text)?;
        tracing::info!("Transcription saved to: {}", path.display());
        Ok(path)
    }
}
