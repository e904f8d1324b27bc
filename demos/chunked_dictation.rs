// Chunked Dictation Demo: incremental transcription from a WAV file
//
// Generates a short tone file, plays it through the file-backed capture
// source, and runs a chunked session with a stub transcriber that labels each
// window. Partial transcripts and progress stream over the event channel
// while recording is still in progress.
//
// Usage: cargo run --example chunked_dictation

use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use voicescribe::{
    write_wav, DictationSession, SessionConfig, SessionEvent, SessionOutcome, Transcriber,
    TriggerSource, WavCapture,
};

/// Stub transcriber that names each window instead of running a model.
struct LabelingTranscriber {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl Transcriber for LabelingTranscriber {
    async fn transcribe(&self, samples: &[f32], _: &str, _: bool) -> Result<String> {
        Ok(format!("(whole buffer: {} samples)", samples.len()))
    }

    async fn transcribe_with_context(&self, samples: &[f32], context: &str) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "[window {} of {} samples, context {:?}]",
            n,
            samples.len(),
            context
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // Three seconds of a 440Hz tone at 16kHz.
    let tone: Vec<f32> = (0..48_000)
        .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 16000.0).sin() * 0.3)
        .collect();
    let dir = tempdir()?;
    let wav_path = dir.join("tone.wav");
    write_wav(&wav_path, &tone, 16000)?;

    // Small windows so several chunks fit into three seconds of audio.
    let mut config = SessionConfig::default();
    config.chunk_size = 16_000; // 1s
    config.overlap = 4_000; // 0.25s
    config.poll_interval = Duration::from_millis(100);
    config.min_duration_secs = 0.1;

    let transcriber = Arc::new(LabelingTranscriber {
        calls: AtomicUsize::new(0),
    });
    let (session, mut events) = DictationSession::new(config, transcriber);

    // Drain events on our own schedule, like a display would.
    let event_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::StateChanged(state) => println!("state: {}", state.label()),
                SessionEvent::PartialTranscript(text) => println!("partial: {text}"),
                SessionEvent::Progress { processed, total } => {
                    println!("progress: {processed}/{total} samples")
                }
                SessionEvent::Status(message) => println!("status: {message}"),
            }
        }
    });

    let capture = Box::new(WavCapture::new(&wav_path, Default::default()).realtime(true));
    session.start(capture, TriggerSource::Ui).await?;

    // Let the file play out, then stop and reconcile.
    tokio::time::sleep(Duration::from_secs(4)).await;
    let outcome = session.stop().await?;

    match outcome {
        SessionOutcome::Transcript {
            text,
            mode,
            duration_secs,
        } => println!("\nfinal ({mode:?}, {duration_secs:.1}s):\n{text}"),
        SessionOutcome::Rejected(reason) => println!("\nrejected: {}", reason.label()),
    }

    drop(session);
    event_task.abort();
    Ok(())
}

fn tempdir() -> Result<std::path::PathBuf> {
    let dir = std::env::temp_dir().join("voicescribe-demo");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
