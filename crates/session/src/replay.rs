use std::path::Path;
use std::time::{Duration, Instant};

use sotto_transcript::TranscriptEvent;

use crate::{Result, StreamSession, TranscriptSpan};

/// Default chunk duration for simulated streaming, in seconds.
const DEFAULT_CHUNK_SECS: f64 = 1.0;

#[derive(Debug)]
enum ReplayPhase {
    Streaming,
    Flush,
    Done,
}

/// Replays an audio file against a [`StreamSession`] at real-time pace,
/// yielding transcript events as they become available.
///
/// Each pass waits until the next chunk boundary on the wall clock,
/// feeds everything that has "arrived" since the last pass, and runs
/// one processing iteration. When a decode falls behind real time the
/// following chunk simply covers more audio. After the file is
/// exhausted a closing event with the `final` flag carries the full
/// transcript.
///
/// The iterator fuses on the first decode error.
pub struct FileReplay {
    session: StreamSession,
    audio: Vec<f32>,
    duration: f64,
    chunk_secs: f64,
    started: Option<Instant>,
    /// Stream position (seconds) up to which audio has been fed.
    position: f64,
    phase: ReplayPhase,
}

impl std::fmt::Debug for FileReplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileReplay")
            .field("duration", &self.duration)
            .field("chunk_secs", &self.chunk_secs)
            .field("started", &self.started)
            .field("position", &self.position)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl FileReplay {
    /// Open an audio file for replay. The file is decoded to 16kHz
    /// mono up front; only the feeding is paced.
    pub fn new(session: StreamSession, path: &Path) -> Result<Self> {
        let audio = sotto_audio::read_wav_mono_16k(path)?;
        let duration = sotto_audio::duration_secs(audio.len());
        tracing::debug!(
            path = %path.display(),
            duration_secs = duration,
            "opened file for streaming replay"
        );
        Ok(Self {
            session,
            audio,
            duration,
            chunk_secs: DEFAULT_CHUNK_SECS,
            started: None,
            position: 0.0,
            phase: ReplayPhase::Streaming,
        })
    }

    /// Set the chunk duration in seconds. Non-finite or non-positive
    /// values are ignored and the current duration kept.
    pub fn chunk_secs(mut self, secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            self.chunk_secs = secs;
        } else {
            tracing::warn!(secs, "ignoring invalid chunk duration");
        }
        self
    }

    /// Duration of the replayed file in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration
    }

    /// Wall-clock seconds since the first chunk was fed. The clock
    /// starts on the first call.
    fn elapsed(&mut self) -> f64 {
        self.started
            .get_or_insert_with(Instant::now)
            .elapsed()
            .as_secs_f64()
    }

    fn make_event(span: TranscriptSpan, emission_time_ms: f64, is_final: bool) -> TranscriptEvent {
        TranscriptEvent {
            emission_time_ms,
            segment_start_ms: span.start * 1000.0,
            segment_end_ms: span.end * 1000.0,
            text: span.text,
            is_final,
        }
    }
}

impl Iterator for FileReplay {
    type Item = Result<TranscriptEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.phase {
                ReplayPhase::Done => return None,
                ReplayPhase::Flush => {
                    self.phase = ReplayPhase::Done;
                    let span = self.session.finish()?;
                    let emission_time_ms = self.elapsed() * 1000.0;
                    return Some(Ok(Self::make_event(span, emission_time_ms, true)));
                }
                ReplayPhase::Streaming => {
                    if self.position >= self.duration {
                        self.phase = ReplayPhase::Flush;
                        continue;
                    }

                    let now = self.elapsed();
                    let due = self.position + self.chunk_secs;
                    if now < due {
                        std::thread::sleep(Duration::from_secs_f64(due - now));
                    }

                    let end = self.elapsed().min(self.duration);
                    let begin_idx =
                        ((self.position * sotto_audio::SAMPLE_RATE as f64) as usize)
                            .min(self.audio.len());
                    let chunk_len =
                        ((end - self.position) * sotto_audio::SAMPLE_RATE as f64) as usize;
                    let end_idx = (begin_idx + chunk_len).min(self.audio.len());
                    self.session.add_audio(&self.audio[begin_idx..end_idx]);
                    self.position = end;

                    match self.session.process() {
                        Err(e) => {
                            self.phase = ReplayPhase::Done;
                            return Some(Err(e));
                        }
                        Ok(Some(span)) => {
                            let emission_time_ms = self.elapsed() * 1000.0;
                            return Some(Ok(Self::make_event(span, emission_time_ms, false)));
                        }
                        Ok(None) => continue,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sotto_stt::{DecodeOptions, Segment, SpeechEngine, SttError, TimedWord, Transcription};

    /// Engine stub that returns the same decode on every call.
    struct FixedEngine {
        segments: Vec<Segment>,
    }

    impl SpeechEngine for FixedEngine {
        fn transcribe(
            &mut self,
            _samples: &[f32],
            _options: &DecodeOptions,
        ) -> sotto_stt::Result<Transcription> {
            Ok(Transcription {
                segments: self.segments.clone(),
                info: Default::default(),
            })
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingEngine;

    impl SpeechEngine for FailingEngine {
        fn transcribe(
            &mut self,
            _samples: &[f32],
            _options: &DecodeOptions,
        ) -> sotto_stt::Result<Transcription> {
            Err(SttError::TranscriptionFailed("decode blew up".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    fn write_test_wav(dir: &tempfile::TempDir, secs: f64) -> std::path::PathBuf {
        let path = dir.path().join("replay.wav");
        let samples = vec![0.1f32; (secs * sotto_audio::SAMPLE_RATE as f64) as usize];
        sotto_audio::write_wav_mono_16k(&path, &samples).unwrap();
        path
    }

    fn hello_engine() -> Box<dyn SpeechEngine> {
        Box::new(FixedEngine {
            segments: vec![Segment {
                no_speech_prob: 0.1,
                text: " Hello".to_string(),
                words: vec![TimedWord {
                    start: 0.0,
                    end: 0.2,
                    text: "Hello".to_string(),
                }],
            }],
        })
    }

    #[test]
    fn test_replay_ends_with_final_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_wav(&dir, 0.3);

        let session = StreamSession::new(hello_engine());
        let replay = FileReplay::new(session, &path).unwrap().chunk_secs(0.1);
        assert!((replay.duration_secs() - 0.3).abs() < 1e-9);

        let events: Vec<TranscriptEvent> = replay.map(|e| e.unwrap()).collect();
        assert!(events.len() >= 2, "expected partials plus a final event");

        let (finals, partials): (Vec<_>, Vec<_>) = events.iter().partition(|e| e.is_final);
        assert_eq!(finals.len(), 1);
        assert!(!partials.is_empty());
        assert_eq!(finals[0].text, "Hello");
        // The flush is a snapshot of the last commit, not a new decode.
        assert_eq!(finals[0].text, partials.last().unwrap().text);
    }

    #[test]
    fn test_replay_paces_against_wall_clock() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_wav(&dir, 0.3);

        let session = StreamSession::new(hello_engine());
        let replay = FileReplay::new(session, &path).unwrap().chunk_secs(0.1);

        let begin = Instant::now();
        let events: Vec<TranscriptEvent> = replay.map(|e| e.unwrap()).collect();
        let took = begin.elapsed().as_secs_f64();

        // Feeding 0.3s of audio cannot complete faster than real time.
        assert!(took >= 0.3, "replay finished in {took}s");
        for event in &events {
            assert!(event.emission_time_ms > 0.0);
        }
    }

    #[test]
    fn test_decode_error_fuses_iterator() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_wav(&dir, 0.2);

        let session = StreamSession::new(Box::new(FailingEngine));
        let mut replay = FileReplay::new(session, &path).unwrap().chunk_secs(0.1);

        assert!(replay.next().unwrap().is_err());
        assert!(replay.next().is_none());
    }

    #[test]
    fn test_invalid_chunk_durations_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_wav(&dir, 0.2);

        let session = StreamSession::new(hello_engine());
        let replay = FileReplay::new(session, &path)
            .unwrap()
            .chunk_secs(0.1)
            .chunk_secs(f64::INFINITY)
            .chunk_secs(0.0)
            .chunk_secs(-1.0)
            .chunk_secs(f64::NAN);

        // Every invalid setting falls back to the last valid one, so
        // the replay paces normally and terminates.
        let events: Vec<TranscriptEvent> = replay.map(|e| e.unwrap()).collect();
        assert!(events.iter().any(|e| e.is_final));
    }

    #[test]
    fn test_missing_file_is_an_audio_error() {
        let session = StreamSession::new(hello_engine());
        let err = FileReplay::new(session, Path::new("/nonexistent.wav")).unwrap_err();
        assert!(matches!(err, crate::SessionError::Audio(_)));
    }
}
