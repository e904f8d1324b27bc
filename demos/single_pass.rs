// Single-Pass Demo: whole-buffer transcription after recording stops
//
// A hotkey-triggered session buffers everything and makes one blocking
// transcription call at stop time. No partial output appears while the
// recording runs.
//
// Usage: cargo run --example single_pass

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use voicescribe::{
    write_wav, DictationSession, SessionConfig, SessionOutcome, Transcriber, TriggerSource,
    WavCapture,
};

struct LabelingTranscriber;

#[async_trait::async_trait]
impl Transcriber for LabelingTranscriber {
    async fn transcribe(&self, samples: &[f32], language: &str, vad: bool) -> Result<String> {
        Ok(format!(
            "(transcribed {} samples, language={language}, vad={vad})",
            samples.len()
        ))
    }

    async fn transcribe_with_context(&self, samples: &[f32], _: &str) -> Result<String> {
        Ok(format!("[{} samples]", samples.len()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // One second of a 220Hz tone at 16kHz.
    let tone: Vec<f32> = (0..16_000)
        .map(|i| (i as f32 * 220.0 * 2.0 * std::f32::consts::PI / 16000.0).sin() * 0.3)
        .collect();
    let dir = std::env::temp_dir().join("voicescribe-demo");
    std::fs::create_dir_all(&dir)?;
    let wav_path = dir.join("tone-short.wav");
    write_wav(&wav_path, &tone, 16000)?;

    let mut config = SessionConfig::default();
    config.min_duration_secs = 0.1;

    let (session, _events) = DictationSession::new(config, Arc::new(LabelingTranscriber));

    let capture = Box::new(WavCapture::new(&wav_path, Default::default()));
    session.start(capture, TriggerSource::Hotkey).await?;

    // Non-realtime capture drains the file almost immediately.
    tokio::time::sleep(Duration::from_millis(300)).await;

    match session.stop().await? {
        SessionOutcome::Transcript {
            text, duration_secs, ..
        } => println!("final ({duration_secs:.1}s): {text}"),
        SessionOutcome::Rejected(reason) => println!("rejected: {}", reason.label()),
    }

    Ok(())
}
