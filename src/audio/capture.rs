use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A block of captured audio samples (f32 PCM, mono unless noted)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Audio samples in the -1.0..=1.0 range
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for an audio capture source
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Target sample rate (16kHz for Whisper-family models)
    pub sample_rate: u32,
    /// Target channel count (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Block size in milliseconds (affects delivery latency)
    pub block_duration_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            block_duration_ms: 100,
        }
    }
}

/// Audio capture trait
///
/// Implementations push sample blocks at the configured rate; the pipeline
/// never pulls from the device directly. Microphone capture lives outside
/// this crate; [`WavCapture`] provides a file-backed source for demos, batch
/// transcription, and tests.
#[async_trait::async_trait]
pub trait AudioCapture: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive audio frames
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing audio
    async fn stop(&mut self) -> Result<()>;

    /// Check if the source is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get source name for logging
    fn name(&self) -> &str;
}

/// File-backed audio capture source
///
/// Reads a WAV file, converts it to f32 mono, and emits it in fixed-size
/// blocks. With `realtime` set it paces delivery at the block duration so the
/// consumer sees the same arrival pattern as a live microphone.
pub struct WavCapture {
    path: PathBuf,
    config: CaptureConfig,
    /// Pace block delivery at wall-clock speed instead of as fast as possible
    realtime: bool,
    task: Option<JoinHandle<()>>,
    capturing: bool,
}

impl WavCapture {
    pub fn new(path: impl Into<PathBuf>, config: CaptureConfig) -> Self {
        Self {
            path: path.into(),
            config,
            realtime: false,
            task: None,
            capturing: false,
        }
    }

    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }
}

#[async_trait::async_trait]
impl AudioCapture for WavCapture {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        let audio = super::file::AudioFile::open(&self.path)
            .with_context(|| format!("Failed to open capture source {:?}", self.path))?;

        let samples = audio.to_mono();
        let sample_rate = audio.sample_rate;
        let block_ms = self.config.block_duration_ms.max(1);
        let block_samples = ((sample_rate as u64 * block_ms) / 1000).max(1) as usize;
        let realtime = self.realtime;

        info!(
            "Starting WAV capture: {:?} ({:.1}s, {}Hz, {} samples/block)",
            self.path, audio.duration_seconds, sample_rate, block_samples
        );

        let (tx, rx) = mpsc::channel(64);

        let task = tokio::spawn(async move {
            let mut timestamp_ms = 0u64;

            for block in samples.chunks(block_samples) {
                let frame = AudioFrame {
                    samples: block.to_vec(),
                    sample_rate,
                    channels: 1,
                    timestamp_ms,
                };
                timestamp_ms += block_ms;

                if tx.send(frame).await.is_err() {
                    debug!("WAV capture receiver dropped, stopping delivery");
                    break;
                }

                if realtime {
                    tokio::time::sleep(std::time::Duration::from_millis(block_ms)).await;
                }
            }

            debug!("WAV capture finished");
        });

        self.task = Some(task);
        self.capturing = true;

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "wav-file"
    }
}
