//! Energy-based silence detection
//!
//! A simple RMS threshold check over a finished buffer, used by the session
//! validation pass before transcription. This is not voice activity
//! detection; it only guards against transcribing an empty room.

/// RMS energy of the sample buffer.
pub fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Whether the buffer's energy falls below `threshold`.
pub fn is_silent(samples: &[f32], threshold: f32) -> bool {
    rms_energy(samples) < threshold
}
