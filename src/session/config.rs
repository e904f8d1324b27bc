use crate::config::Config;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a dictation session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identifier
    pub session_id: String,

    /// Sample rate for captured audio (Whisper-family models expect 16kHz)
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Sessions shorter than this are rejected
    pub min_duration_secs: f64,

    /// Hard cap on captured samples; the ingest task stops appending past it
    pub max_samples: usize,

    /// Whether UI-triggered sessions transcribe incrementally
    pub chunked_enabled: bool,

    /// Cursor advance per window, in samples
    pub chunk_size: usize,

    /// Seam overlap, in samples; strictly less than `chunk_size`
    pub overlap: usize,

    /// Worker backoff when no new audio is available
    pub poll_interval: Duration,

    /// How long stop() waits for the worker before proceeding without it
    pub worker_stop_timeout: Duration,

    /// Whether to reject silent sessions before transcription
    pub silence_detection: bool,

    /// RMS energy below which a buffer counts as silent
    pub energy_threshold: f32,

    /// Language hint for single-pass transcription
    pub language: String,

    /// Whether the model applies its own voice activity filter
    pub vad_filter: bool,

    /// Optional path to dump the session's captured audio as WAV
    pub dump_path: Option<PathBuf>,
}

impl SessionConfig {
    /// Derive a session configuration from the application config.
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            sample_rate: cfg.audio.sample_rate,
            channels: cfg.audio.channels,
            min_duration_secs: cfg.recording.min_duration_secs,
            max_samples: cfg.max_samples(),
            chunked_enabled: cfg.chunking.enabled,
            chunk_size: cfg.chunk_size(),
            overlap: cfg.overlap(),
            poll_interval: Duration::from_millis(cfg.chunking.poll_interval_ms),
            worker_stop_timeout: Duration::from_secs(cfg.chunking.worker_stop_timeout_secs),
            silence_detection: cfg.silence.enabled,
            energy_threshold: cfg.silence.energy_threshold,
            language: cfg.transcription.language.clone(),
            vad_filter: cfg.transcription.vad_filter,
            dump_path: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
