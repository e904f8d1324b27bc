use anyhow::{bail, Context, Result};
use serde::Deserialize;

const ALLOWED_SAMPLE_RATES: &[u32] = &[8000, 16000, 22050, 44100, 48000];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub silence: SilenceConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Capture sample rate in Hz (Whisper-family models expect 16kHz)
    pub sample_rate: u32,
    /// Channel count (1 = mono, 2 = stereo)
    pub channels: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordingConfig {
    /// Sessions shorter than this are rejected, in seconds
    pub min_duration_secs: f64,
    /// Hard cap on captured audio, in seconds
    pub max_duration_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkingConfig {
    /// Whether UI-triggered sessions transcribe incrementally
    pub enabled: bool,
    /// Chunk duration in seconds (cursor advance per window)
    pub chunk_duration_secs: u64,
    /// Overlap in seconds re-included around each chunk seam; must be
    /// strictly less than the chunk duration
    pub overlap_secs: u64,
    /// Worker backoff when no new audio is available, in milliseconds
    pub poll_interval_ms: u64,
    /// How long stop() waits for the worker before proceeding, in seconds
    pub worker_stop_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SilenceConfig {
    /// Whether to reject silent sessions before transcription
    pub enabled: bool,
    /// RMS energy below which a buffer counts as silent
    pub energy_threshold: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionConfig {
    /// Language hint passed to single-pass transcription
    pub language: String,
    /// Whether the model applies its own voice activity filter
    pub vad_filter: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: 0.5,
            max_duration_secs: 300, // 5 minutes
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chunk_duration_secs: 5,
            overlap_secs: 3,
            poll_interval_ms: 1000,
            worker_stop_timeout_secs: 10,
        }
    }
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            energy_threshold: 0.01,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            vad_filter: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            recording: RecordingConfig::default(),
            chunking: ChunkingConfig::default(),
            silence: SilenceConfig::default(),
            transcription: TranscriptionConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an optional file plus `VOICESCRIBE_`-prefixed
    /// environment overrides (e.g. `VOICESCRIBE_AUDIO__SAMPLE_RATE=16000`).
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("VOICESCRIBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let cfg: Config = settings
            .try_deserialize()
            .context("Failed to parse configuration")?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Enforce configuration-time invariants.
    pub fn validate(&self) -> Result<()> {
        if !ALLOWED_SAMPLE_RATES.contains(&self.audio.sample_rate) {
            bail!("Invalid sample rate: {}", self.audio.sample_rate);
        }
        if !(1..=2).contains(&self.audio.channels) {
            bail!("Invalid number of channels: {}", self.audio.channels);
        }
        if self.recording.max_duration_secs == 0 {
            bail!("Max recording duration must be positive");
        }
        if self.recording.min_duration_secs <= 0.0 {
            bail!("Min recording duration must be positive");
        }
        if self.chunking.chunk_duration_secs == 0 {
            bail!("Chunk duration must be positive");
        }
        if self.chunking.overlap_secs >= self.chunking.chunk_duration_secs {
            bail!(
                "Chunk overlap ({}s) must be less than chunk duration ({}s)",
                self.chunking.overlap_secs,
                self.chunking.chunk_duration_secs
            );
        }
        if self.chunking.poll_interval_ms == 0 {
            bail!("Poll interval must be positive");
        }
        Ok(())
    }

    /// Chunk size in samples (cursor advance per window).
    pub fn chunk_size(&self) -> usize {
        self.chunking.chunk_duration_secs as usize * self.audio.sample_rate as usize
    }

    /// Overlap in samples.
    pub fn overlap(&self) -> usize {
        self.chunking.overlap_secs as usize * self.audio.sample_rate as usize
    }

    /// Maximum session length in samples.
    pub fn max_samples(&self) -> usize {
        self.recording.max_duration_secs as usize * self.audio.sample_rate as usize
    }
}
