use std::path::Path;

use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, WhisperState,
};

use crate::{
    DecodeOptions, Result, Segment, SpeechEngine, SttError, Task, TimedWord, Transcription,
    TranscriptionInfo,
};

impl From<whisper_rs::WhisperError> for SttError {
    fn from(e: whisper_rs::WhisperError) -> Self {
        SttError::TranscriptionFailed(e.to_string())
    }
}

/// Speech engine backed by whisper.cpp.
///
/// The model is loaded once in [`WhisperEngine::load`] and held until
/// [`SpeechEngine::unload`] or drop. Each transcription call runs on a
/// fresh decoding state, so repeated calls over overlapping audio do
/// not contaminate each other.
pub struct WhisperEngine {
    ctx: Option<WhisperContext>,
    model_name: String,
}

impl WhisperEngine {
    /// Load a GGML model file from disk.
    pub fn load(model_path: &Path) -> Result<Self> {
        if !model_path.exists() {
            return Err(SttError::LoadFailed(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }
        let path_str = model_path.to_str().ok_or_else(|| {
            SttError::LoadFailed(format!("model path is not UTF-8: {}", model_path.display()))
        })?;

        tracing::info!("Loading whisper model from {}", model_path.display());
        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| SttError::LoadFailed(e.to_string()))?;

        let model_name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "whisper".to_string());

        Ok(Self {
            ctx: Some(ctx),
            model_name,
        })
    }

    fn collect_words(
        ctx: &WhisperContext,
        state: &WhisperState,
        segment: i32,
        segment_start: f64,
    ) -> Result<Vec<TimedWord>> {
        let token_count = state.full_n_tokens(segment)?;
        let mut assembler = WordAssembler::new(segment_start);

        for t in 0..token_count {
            let data = state.full_get_token_data(segment, t)?;
            // Timestamp and control tokens sit above EOT in the vocab.
            if data.id >= ctx.token_eot() {
                continue;
            }
            // Raw bytes, not &str: a byte-fallback token can hold a
            // fragment of a multibyte character that is not valid UTF-8
            // on its own.
            let piece = ctx.token_to_bytes(data.id)?;
            assembler.push(
                &piece,
                (data.t0.max(0) as f64) / 100.0,
                (data.t1.max(0) as f64) / 100.0,
            );
        }

        Ok(assembler.finish())
    }
}

/// Joins token pieces into timed words.
///
/// whisper's BPE marks word starts with a leading space. Pieces stay as
/// raw bytes until the word is complete, then the whole word is decoded
/// with lossy UTF-8, so a malformed fragment degrades to a replacement
/// character instead of failing the transcription.
struct WordAssembler {
    words: Vec<TimedWord>,
    pending: Vec<u8>,
    start: f64,
    end: f64,
}

impl WordAssembler {
    fn new(start: f64) -> Self {
        Self {
            words: Vec::new(),
            pending: Vec::new(),
            start,
            end: start,
        }
    }

    fn push(&mut self, piece: &[u8], t0: f64, t1: f64) {
        if piece.starts_with(b" ") && self.has_word() {
            self.flush();
        }
        if self.pending.is_empty() {
            self.start = t0;
        }
        self.pending.extend_from_slice(piece);
        self.end = t1;
    }

    fn has_word(&self) -> bool {
        self.pending.iter().any(|b| !b.is_ascii_whitespace())
    }

    fn flush(&mut self) {
        let text = String::from_utf8_lossy(&self.pending);
        let text = text.trim();
        if !text.is_empty() {
            self.words.push(TimedWord {
                start: self.start,
                end: self.end,
                text: text.to_string(),
            });
        }
        self.pending.clear();
    }

    fn finish(mut self) -> Vec<TimedWord> {
        self.flush();
        self.words
    }
}

impl SpeechEngine for WhisperEngine {
    fn transcribe(&mut self, samples: &[f32], options: &DecodeOptions) -> Result<Transcription> {
        let ctx = self.ctx.as_ref().ok_or(SttError::ModelNotLoaded)?;
        if samples.is_empty() {
            return Err(SttError::InvalidAudio("no samples".to_string()));
        }

        // whisper.cpp skips decoding entirely for inputs shorter than 1s.
        let min_samples = sotto_audio::SAMPLE_RATE as usize;
        let padded;
        let samples = if samples.len() < min_samples {
            let mut v = samples.to_vec();
            v.resize(min_samples, 0.0);
            padded = v;
            &padded[..]
        } else {
            samples
        };

        let strategy = if options.beam_size > 1 {
            SamplingStrategy::BeamSearch {
                beam_size: options.beam_size as i32,
                patience: options.patience,
            }
        } else {
            SamplingStrategy::Greedy {
                best_of: options.best_of as i32,
            }
        };
        let mut params = FullParams::new(strategy);

        let language = options.language.as_deref().unwrap_or("auto");
        params.set_language(Some(language));
        params.set_translate(options.task == Task::Translate);
        params.set_temperature(options.temperature);
        params.set_token_timestamps(options.word_timestamps);
        params.set_no_context(!options.condition_on_previous_text);
        if let Some(prompt) = options.initial_prompt.as_deref() {
            params.set_initial_prompt(prompt);
        }
        // vad_filter has no whisper.cpp equivalent; the decoder's own
        // no-speech scoring covers silence, so the flag is ignored here.
        let threads = std::thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1).max(1))
            .unwrap_or(4);
        params.set_n_threads(threads as i32);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        let mut state = ctx.create_state()?;
        state.full(params, samples)?;

        let segment_count = state.full_n_segments()?;
        let mut segments = Vec::with_capacity(segment_count as usize);
        for s in 0..segment_count {
            let text = state.full_get_segment_text_lossy(s)?;
            let start = state.full_get_segment_t0(s)? as f64 / 100.0;
            let no_speech_prob = state.full_get_segment_no_speech_prob(s)?;
            let words = if options.word_timestamps {
                Self::collect_words(ctx, &state, s, start)?
            } else {
                Vec::new()
            };
            segments.push(Segment {
                no_speech_prob,
                text,
                words,
            });
        }

        tracing::debug!(
            "Decoded {} segments from {:.2}s of audio",
            segments.len(),
            sotto_audio::duration_secs(samples.len())
        );

        Ok(Transcription {
            segments,
            info: TranscriptionInfo {
                language: (language != "auto").then(|| language.to_string()),
                language_probability: None,
                duration: sotto_audio::duration_secs(samples.len()),
            },
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn unload(&mut self) {
        if self.ctx.take().is_some() {
            tracing::debug!("Released whisper model {}", self.model_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_split_on_leading_space_pieces() {
        let mut assembler = WordAssembler::new(0.0);
        assembler.push(b" Hello", 0.0, 0.3);
        assembler.push(b" wor", 0.4, 0.5);
        assembler.push(b"ld", 0.5, 0.7);
        let words = assembler.finish();

        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "Hello");
        assert_eq!(words[1].text, "world");
        assert_eq!(words[1].start, 0.4);
        assert_eq!(words[1].end, 0.7);
    }

    #[test]
    fn test_multibyte_character_split_across_pieces_survives() {
        // Byte fallback can cut "é" (0xC3 0xA9) between tokens; neither
        // half is valid UTF-8 alone.
        let mut assembler = WordAssembler::new(0.0);
        assembler.push(b" caf", 0.0, 0.2);
        assembler.push(&[0xC3], 0.2, 0.25);
        assembler.push(&[0xA9], 0.25, 0.3);
        let words = assembler.finish();

        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "caf\u{e9}");
        assert_eq!(words[0].end, 0.3);
    }

    #[test]
    fn test_stray_invalid_byte_degrades_to_replacement_char() {
        let mut assembler = WordAssembler::new(0.0);
        assembler.push(b" ok", 0.0, 0.1);
        assembler.push(&[0xFF], 0.1, 0.2);
        let words = assembler.finish();

        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "ok\u{FFFD}");
    }
}
