/// Append-only audio accumulator for one streaming session.
///
/// The buffer holds everything heard since the session started; each
/// processing pass re-decodes it from the beginning. Nothing is ever
/// trimmed, so buffer-relative times stay valid for the whole session.
#[derive(Debug, Default)]
pub struct AudioBuffer {
    samples: Vec<f32>,
}

impl AudioBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append samples (16kHz mono) to the end of the buffer.
    pub fn append(&mut self, samples: &[f32]) {
        self.samples.extend_from_slice(samples);
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        sotto_audio::duration_secs(self.samples.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_grows_buffer() {
        let mut buffer = AudioBuffer::new();
        assert!(buffer.is_empty());

        buffer.append(&[0.1, 0.2]);
        buffer.append(&[0.3]);

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.samples(), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_duration_tracks_sample_count() {
        let mut buffer = AudioBuffer::new();
        buffer.append(&vec![0.0; 16000]);
        assert!((buffer.duration_secs() - 1.0).abs() < f64::EPSILON);

        buffer.append(&vec![0.0; 8000]);
        assert!((buffer.duration_secs() - 1.5).abs() < f64::EPSILON);
    }
}
