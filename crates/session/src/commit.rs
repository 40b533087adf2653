use sotto_stt::TimedWord;

/// A committed stretch of transcript, located in absolute stream time.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSpan {
    /// Start of the first committed word, in seconds.
    pub start: f64,
    /// End of the last committed word, in seconds.
    pub end: f64,
    /// Committed words joined with single spaces.
    pub text: String,
}

/// Holds the words committed so far and maps their buffer-relative
/// times into absolute stream time.
#[derive(Debug, Default)]
pub struct CommitTracker {
    words: Vec<TimedWord>,
    /// Absolute time (seconds) of the start of the audio buffer.
    /// Stays at zero as long as the buffer is never trimmed; every
    /// time mapping goes through it regardless.
    buffer_time_offset: f64,
}

impl CommitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the committed words wholesale with a fresh decode.
    pub fn replace(&mut self, words: Vec<TimedWord>) {
        self.words = words;
    }

    pub fn words(&self) -> &[TimedWord] {
        &self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The committed transcript as one span in absolute time, or
    /// `None` when nothing has been committed yet.
    pub fn snapshot(&self) -> Option<TranscriptSpan> {
        let first = self.words.first()?;
        let last = self.words.last()?;
        let text = self
            .words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Some(TranscriptSpan {
            start: first.start + self.buffer_time_offset,
            end: last.end + self.buffer_time_offset,
            text,
        })
    }

    #[cfg(test)]
    fn set_buffer_time_offset(&mut self, offset: f64) {
        self.buffer_time_offset = offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_word(text: &str, start: f64, end: f64) -> TimedWord {
        TimedWord {
            start,
            end,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_snapshot_empty_is_none() {
        let tracker = CommitTracker::new();
        assert!(tracker.is_empty());
        assert!(tracker.snapshot().is_none());
    }

    #[test]
    fn test_snapshot_spans_first_to_last_word() {
        let mut tracker = CommitTracker::new();
        tracker.replace(vec![
            make_word("Hello", 0.5, 1.0),
            make_word("world", 1.2, 1.8),
        ]);

        let span = tracker.snapshot().unwrap();
        assert_eq!(span.start, 0.5);
        assert_eq!(span.end, 1.8);
        assert_eq!(span.text, "Hello world");
    }

    #[test]
    fn test_replace_is_wholesale() {
        let mut tracker = CommitTracker::new();
        tracker.replace(vec![make_word("first", 0.0, 0.4)]);
        tracker.replace(vec![
            make_word("second", 0.0, 0.5),
            make_word("pass", 0.5, 0.9),
        ]);

        let span = tracker.snapshot().unwrap();
        assert_eq!(span.text, "second pass");
        assert_eq!(tracker.words().len(), 2);
    }

    #[test]
    fn test_time_offset_applies_to_both_ends() {
        let mut tracker = CommitTracker::new();
        tracker.set_buffer_time_offset(10.0);
        tracker.replace(vec![make_word("late", 1.0, 2.0)]);

        let span = tracker.snapshot().unwrap();
        assert_eq!(span.start, 11.0);
        assert_eq!(span.end, 12.0);
    }
}
