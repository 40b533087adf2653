use sotto_stt::{DecodeOptions, SpeechEngine, TimedWord, Transcription};

use crate::{AudioBuffer, CommitTracker, Result, TranscriptSpan};

/// Segments whose no-speech probability exceeds this are dropped whole,
/// words included, before committing.
const NO_SPEECH_THRESHOLD: f32 = 0.9;

/// Incremental transcription over a growing audio buffer.
///
/// Each [`process`](StreamSession::process) pass re-decodes the entire
/// buffer and replaces the committed words with the fresh hypothesis,
/// so later audio can revise earlier text. The session owns its engine;
/// nothing is shared between concurrent sessions.
pub struct StreamSession {
    engine: Box<dyn SpeechEngine>,
    buffer: AudioBuffer,
    tracker: CommitTracker,
    options: DecodeOptions,
}

impl StreamSession {
    pub fn new(engine: Box<dyn SpeechEngine>) -> Self {
        Self::with_options(engine, DecodeOptions::streaming())
    }

    /// Create a session with custom decoding options. Word timestamps
    /// and previous-text conditioning are forced on: commits are
    /// tracked per word, and every pass re-decodes with the context of
    /// the text before it.
    pub fn with_options(engine: Box<dyn SpeechEngine>, mut options: DecodeOptions) -> Self {
        options.word_timestamps = true;
        options.condition_on_previous_text = true;
        tracing::debug!(model = engine.model_name(), "starting stream session");
        Self {
            engine,
            buffer: AudioBuffer::new(),
            tracker: CommitTracker::new(),
            options,
        }
    }

    /// Append a chunk of 16kHz mono audio to the session buffer.
    pub fn add_audio(&mut self, samples: &[f32]) {
        self.buffer.append(samples);
    }

    pub fn buffer_duration_secs(&self) -> f64 {
        self.buffer.duration_secs()
    }

    pub fn committed_words(&self) -> &[TimedWord] {
        self.tracker.words()
    }

    /// Re-decode the whole buffer and commit the result.
    ///
    /// Returns the cumulative transcript so far, or `None` when there
    /// is nothing to report: the buffer is still empty, or the decode
    /// produced no speech. A no-speech decode leaves the previous
    /// commit in place rather than wiping it.
    pub fn process(&mut self) -> Result<Option<TranscriptSpan>> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        let transcription = self.engine.transcribe(self.buffer.samples(), &self.options)?;
        let words = Self::speech_words(&transcription);

        tracing::debug!(
            buffer_secs = self.buffer_duration_secs(),
            segments = transcription.segments.len(),
            words = words.len(),
            "processed buffer"
        );

        if words.is_empty() {
            return Ok(None);
        }

        self.tracker.replace(words);
        Ok(self.tracker.snapshot())
    }

    /// Final flush: the committed transcript as it stands, without
    /// another decode. Safe to call repeatedly.
    pub fn finish(&self) -> Option<TranscriptSpan> {
        self.tracker.snapshot()
    }

    /// Release the engine's model eagerly. Dropping the session has the
    /// same effect.
    pub fn close(&mut self) {
        self.engine.unload();
    }

    /// Flatten a decode into timed words, dropping segments the engine
    /// scored as silence.
    fn speech_words(transcription: &Transcription) -> Vec<TimedWord> {
        let mut words = Vec::new();
        for segment in &transcription.segments {
            if segment.no_speech_prob > NO_SPEECH_THRESHOLD {
                tracing::trace!(
                    no_speech_prob = segment.no_speech_prob,
                    text = %segment.text,
                    "dropping no-speech segment"
                );
                continue;
            }
            words.extend(segment.words.iter().cloned());
        }
        words
    }
}
