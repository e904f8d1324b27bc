pub mod audio;
pub mod config;
pub mod session;
pub mod state;
pub mod transcribe;

pub use audio::{
    is_silent, rms_energy, write_wav, AudioAccumulator, AudioCapture, AudioFile, AudioFrame,
    CaptureConfig, WavCapture,
};
pub use config::Config;
pub use session::{
    DictationSession, RejectReason, SessionConfig, SessionEvent, SessionOutcome, SessionStats,
    TranscriptionMode, TriggerSource,
};
pub use state::{RecordingState, StateMachine};
pub use transcribe::{continuity_context, Transcriber};
