use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{DecodeOptions, Result, SttError};

/// A word with timing information, in seconds relative to the start of
/// the waveform it was decoded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedWord {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// One contiguous span of decoded speech.
///
/// `no_speech_prob` is the engine's estimate that the span contains no
/// speech at all; callers filter on it before trusting `words`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub no_speech_prob: f32,
    pub text: String,
    pub words: Vec<TimedWord>,
}

/// Decode-level metadata returned alongside the segments. Forwarded to
/// callers, never interpreted by the transcription bookkeeping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptionInfo {
    pub language: Option<String>,
    pub language_probability: Option<f32>,
    /// Duration of the decoded waveform in seconds.
    pub duration: f64,
}

/// Result of one transcription call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    pub segments: Vec<Segment>,
    pub info: TranscriptionInfo,
}

impl Transcription {
    /// Segment texts concatenated in order, exactly as the engine
    /// produced them (segment texts carry their own leading spaces).
    pub fn full_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// A speech-to-text engine.
///
/// Engines are owned exclusively by one session at a time; there is no
/// cross-session sharing, so implementations take `&mut self` and only
/// need to be `Send`.
pub trait SpeechEngine: Send {
    /// Transcribe audio samples (16kHz mono) with the given decoding
    /// options. Options the backend does not support are ignored.
    fn transcribe(&mut self, samples: &[f32], options: &DecodeOptions) -> Result<Transcription>;

    /// Transcribe an audio file directly.
    ///
    /// Default implementation decodes the file to 16kHz mono and calls
    /// `transcribe()`.
    fn transcribe_file(&mut self, path: &Path, options: &DecodeOptions) -> Result<Transcription> {
        let samples = sotto_audio::read_wav_mono_16k(path)
            .map_err(|e| SttError::InvalidAudio(e.to_string()))?;
        self.transcribe(&samples, options)
    }

    /// Model name for logs.
    fn model_name(&self) -> &str;

    /// Release model resources eagerly. Idempotent; dropping the engine
    /// has the same effect.
    fn unload(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingEngine {
        samples_seen: usize,
    }

    impl SpeechEngine for CountingEngine {
        fn transcribe(
            &mut self,
            samples: &[f32],
            _options: &DecodeOptions,
        ) -> Result<Transcription> {
            self.samples_seen = samples.len();
            Ok(Transcription {
                segments: vec![Segment {
                    no_speech_prob: 0.0,
                    text: " ok".to_string(),
                    words: Vec::new(),
                }],
                info: TranscriptionInfo::default(),
            })
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_full_text_concatenates_segments_verbatim() {
        let t = Transcription {
            segments: vec![
                Segment {
                    no_speech_prob: 0.1,
                    text: " Hello".to_string(),
                    words: Vec::new(),
                },
                Segment {
                    no_speech_prob: 0.2,
                    text: " world.".to_string(),
                    words: Vec::new(),
                },
            ],
            info: TranscriptionInfo::default(),
        };
        assert_eq!(t.full_text(), " Hello world.");
    }

    #[test]
    fn test_transcribe_file_decodes_before_calling_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("half_second.wav");
        let samples = vec![0.25f32; 8000];
        sotto_audio::write_wav_mono_16k(&path, &samples).unwrap();

        let mut engine = CountingEngine { samples_seen: 0 };
        let result = engine
            .transcribe_file(&path, &DecodeOptions::default())
            .unwrap();
        assert_eq!(engine.samples_seen, 8000);
        assert_eq!(result.full_text(), " ok");
    }

    #[test]
    fn test_transcribe_file_missing_file_is_invalid_audio() {
        let mut engine = CountingEngine { samples_seen: 0 };
        let err = engine
            .transcribe_file(Path::new("/nonexistent/audio.wav"), &DecodeOptions::default())
            .unwrap_err();
        assert!(matches!(err, SttError::InvalidAudio(_)));
    }
}
