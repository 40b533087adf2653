/// What the decoder should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Task {
    #[default]
    Transcribe,
    Translate,
}

/// Decoding options passed to [`SpeechEngine::transcribe`].
///
/// Defaults follow the upstream Whisper defaults. Backends ignore
/// options they do not support rather than erroring.
///
/// [`SpeechEngine::transcribe`]: crate::SpeechEngine::transcribe
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// ISO 639-1 code, or `None` for auto-detection.
    pub language: Option<String>,
    pub task: Task,
    pub beam_size: usize,
    pub best_of: usize,
    pub patience: f32,
    pub temperature: f32,
    /// Feed the previous window's text back as context for the next.
    pub condition_on_previous_text: bool,
    pub initial_prompt: Option<String>,
    /// Ask the backend for per-word timing in addition to segments.
    pub word_timestamps: bool,
    /// Drop non-speech stretches before decoding, when the backend can.
    pub vad_filter: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            language: None,
            task: Task::Transcribe,
            beam_size: 5,
            best_of: 5,
            patience: 1.0,
            temperature: 0.0,
            condition_on_previous_text: true,
            initial_prompt: None,
            word_timestamps: false,
            vad_filter: false,
        }
    }
}

impl DecodeOptions {
    /// Options used for incremental streaming: word timing on so commits
    /// can be tracked per word.
    pub fn streaming() -> Self {
        Self {
            word_timestamps: true,
            ..Self::default()
        }
    }

    /// Options used for one-shot file transcription: VAD pre-filter on,
    /// segment granularity only.
    pub fn batch() -> Self {
        Self {
            vad_filter: true,
            ..Self::default()
        }
    }
}
