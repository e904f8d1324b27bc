//! Transcription capability contract
//!
//! The neural model itself lives outside this crate. The pipeline only needs
//! the two calls below: a whole-buffer pass for single-pass sessions, and a
//! context-primed call for chunked sessions. A failed call is recoverable in
//! chunked mode (the worker skips the window) and fatal in single-pass mode.

use anyhow::Result;

/// Speech-to-text capability consumed by the pipeline
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a complete audio buffer (single-pass mode).
    ///
    /// `samples` is f32 mono PCM at the configured sample rate.
    async fn transcribe(&self, samples: &[f32], language: &str, vad_enabled: bool)
        -> Result<String>;

    /// Transcribe one window of audio with a continuity prompt (chunked mode).
    ///
    /// `context` is a short trailing substring of the transcript accumulated
    /// so far, used to bias the model toward a coherent continuation across
    /// the chunk seam. May be empty for the first window.
    async fn transcribe_with_context(&self, samples: &[f32], context: &str) -> Result<String>;
}

/// Trailing continuity context for the next chunked call.
///
/// Takes at most `max_chars` characters from the end of `transcript`,
/// respecting char boundaries, trimmed.
pub fn continuity_context(transcript: &str, max_chars: usize) -> String {
    let trimmed = transcript.trim();
    let char_count = trimmed.chars().count();
    if char_count <= max_chars {
        return trimmed.to_string();
    }

    trimmed
        .chars()
        .skip(char_count - max_chars)
        .collect::<String>()
        .trim()
        .to_string()
}
