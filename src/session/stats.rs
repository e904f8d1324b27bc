use crate::state::RecordingState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about a dictation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Session identifier
    pub session_id: String,

    /// Current lifecycle state
    pub state: RecordingState,

    /// When the current (or last) recording started, if any
    pub started_at: Option<DateTime<Utc>>,

    /// Seconds of audio captured so far
    pub captured_secs: f64,

    /// Samples captured so far
    pub samples_captured: usize,

    /// Samples already covered by chunked transcription
    pub samples_processed: usize,

    /// Characters of transcript accumulated so far
    pub transcript_chars: usize,
}

/// How the session's audio was (or will be) transcribed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscriptionMode {
    /// One blocking transcription over the whole buffer after stop
    SinglePass,
    /// Incremental windowed transcription while recording
    Chunked,
}

/// Why a session produced no transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// No audio data was recorded
    NoAudio,
    /// Recording was shorter than the configured minimum
    TooShort,
    /// Audio energy stayed below the silence threshold
    Silent,
    /// Transcription produced no text
    EmptyTranscript,
}

impl RejectReason {
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::NoAudio => "no audio data recorded",
            RejectReason::TooShort => "recording too short",
            RejectReason::Silent => "no speech detected",
            RejectReason::EmptyTranscript => "no text transcribed",
        }
    }
}

/// Result of a completed stop() call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionOutcome {
    /// The session produced a transcript
    Transcript {
        text: String,
        mode: TranscriptionMode,
        duration_secs: f64,
    },
    /// The session was aborted cleanly with a specific reason
    Rejected(RejectReason),
}
