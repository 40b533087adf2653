use std::path::Path;

use sotto_stt::{DecodeOptions, SpeechEngine};

use crate::Result;

/// One-shot transcription of an audio file.
///
/// The VAD pre-filter is always on for batch decodes and word timing is
/// left off; segment texts are concatenated exactly as the engine
/// produced them, leading spaces and all.
pub fn transcribe_file(
    engine: &mut dyn SpeechEngine,
    path: &Path,
    options: &DecodeOptions,
) -> Result<String> {
    let mut options = options.clone();
    options.vad_filter = true;
    options.word_timestamps = false;

    tracing::debug!(model = engine.model_name(), path = %path.display(), "transcribing file");
    let transcription = engine.transcribe_file(path, &options)?;
    Ok(transcription.full_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sotto_stt::{Segment, Transcription, TranscriptionInfo};

    /// Engine stub that records the options it was called with.
    struct RecordingEngine {
        seen_options: Option<DecodeOptions>,
    }

    impl SpeechEngine for RecordingEngine {
        fn transcribe(
            &mut self,
            _samples: &[f32],
            options: &DecodeOptions,
        ) -> sotto_stt::Result<Transcription> {
            self.seen_options = Some(options.clone());
            Ok(Transcription {
                segments: vec![
                    Segment {
                        no_speech_prob: 0.0,
                        text: " Hello".to_string(),
                        words: Vec::new(),
                    },
                    Segment {
                        no_speech_prob: 0.0,
                        text: " world.".to_string(),
                        words: Vec::new(),
                    },
                ],
                info: TranscriptionInfo::default(),
            })
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    fn write_test_wav(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("batch.wav");
        sotto_audio::write_wav_mono_16k(&path, &vec![0.1f32; 16000]).unwrap();
        path
    }

    #[test]
    fn test_segment_texts_joined_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_wav(&dir);

        let mut engine = RecordingEngine { seen_options: None };
        let text = transcribe_file(&mut engine, &path, &DecodeOptions::batch()).unwrap();

        // No separator is inserted; segment texts carry their own
        // leading spaces.
        assert_eq!(text, " Hello world.");
    }

    #[test]
    fn test_vad_filter_forced_on() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_wav(&dir);

        let mut engine = RecordingEngine { seen_options: None };
        let mut options = DecodeOptions::default();
        options.vad_filter = false;
        options.word_timestamps = true;
        transcribe_file(&mut engine, &path, &options).unwrap();

        let seen = engine.seen_options.unwrap();
        assert!(seen.vad_filter);
        assert!(!seen.word_timestamps);
    }
}
