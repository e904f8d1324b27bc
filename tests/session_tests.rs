// End-to-end tests for the session orchestrator
//
// A scripted capture source and transcriber drive full
// Idle -> Recording -> Processing -> Idle cycles through both transcription
// modes, the validation ladder, and the tail reconciliation pass.

use anyhow::{anyhow, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use voicescribe::{
    AudioCapture, AudioFrame, DictationSession, RecordingState, RejectReason, SessionConfig,
    SessionEvent, SessionOutcome, Transcriber, TranscriptionMode, TriggerSource,
};

/// Capture source that delivers scripted frames immediately, then holds the
/// channel open until stopped (like a microphone with no more input).
struct ScriptedCapture {
    frames: Vec<Vec<f32>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl ScriptedCapture {
    fn new(frames: Vec<Vec<f32>>) -> Box<Self> {
        Box::new(Self { frames, task: None })
    }

    /// `count` frames of constant-amplitude (clearly non-silent) audio.
    fn speech(count: usize, frame_len: usize) -> Box<Self> {
        Self::new(vec![vec![0.2; frame_len]; count])
    }
}

#[async_trait::async_trait]
impl AudioCapture for ScriptedCapture {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        let frames = std::mem::take(&mut self.frames);
        let (tx, rx) = mpsc::channel(64);

        self.task = Some(tokio::spawn(async move {
            for (i, samples) in frames.into_iter().enumerate() {
                let frame = AudioFrame {
                    samples,
                    sample_rate: 16000,
                    channels: 1,
                    timestamp_ms: i as u64 * 100,
                };
                if tx.send(frame).await.is_err() {
                    return;
                }
            }
            // Keep the channel open until stop() aborts us.
            loop {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.task.is_some()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Transcriber that replays scripted results and counts calls per entry point.
struct ScriptedTranscriber {
    replies: Mutex<VecDeque<Result<String, String>>>,
    single_pass_calls: AtomicUsize,
    chunked_calls: AtomicUsize,
}

impl ScriptedTranscriber {
    fn new(replies: Vec<Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            single_pass_calls: AtomicUsize::new(0),
            chunked_calls: AtomicUsize::new(0),
        })
    }

    fn next_reply(&self) -> Result<String> {
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(msg)) => Err(anyhow!(msg)),
            None => Ok(String::new()),
        }
    }
}

#[async_trait::async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, _: &[f32], _: &str, _: bool) -> Result<String> {
        self.single_pass_calls.fetch_add(1, Ordering::SeqCst);
        self.next_reply()
    }

    async fn transcribe_with_context(&self, _: &[f32], _: &str) -> Result<String> {
        self.chunked_calls.fetch_add(1, Ordering::SeqCst);
        self.next_reply()
    }
}

/// Fast session config: 100-sample chunks, 30-sample overlap, 5ms poll,
/// permissive minimum duration.
fn test_config() -> SessionConfig {
    let mut cfg = SessionConfig::default();
    cfg.session_id = "test-session".to_string();
    cfg.chunk_size = 100;
    cfg.overlap = 30;
    cfg.poll_interval = Duration::from_millis(5);
    cfg.worker_stop_timeout = Duration::from_secs(2);
    cfg.min_duration_secs = 0.001;
    cfg
}

/// Let the ingest and worker tasks catch up.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn hotkey_session_runs_single_pass() -> Result<()> {
    let transcriber = ScriptedTranscriber::new(vec![Ok("hello from single pass".to_string())]);
    let (session, _events) = DictationSession::new(test_config(), transcriber.clone());

    session
        .start(ScriptedCapture::speech(5, 160), TriggerSource::Hotkey)
        .await?;
    assert!(session.is_recording());

    settle().await;
    let outcome = session.stop().await?;

    assert_eq!(
        outcome,
        SessionOutcome::Transcript {
            text: "hello from single pass".to_string(),
            mode: TranscriptionMode::SinglePass,
            duration_secs: 800.0 / 16000.0,
        }
    );
    assert_eq!(transcriber.single_pass_calls.load(Ordering::SeqCst), 1);
    assert_eq!(transcriber.chunked_calls.load(Ordering::SeqCst), 0);
    assert!(session.is_idle());

    Ok(())
}

#[tokio::test]
async fn ui_session_runs_chunked_with_tail_reconciliation() -> Result<()> {
    let transcriber = ScriptedTranscriber::new(vec![
        Ok("one".to_string()),
        Ok("two".to_string()),
        Ok("tail".to_string()),
    ]);
    let (session, _events) = DictationSession::new(test_config(), transcriber.clone());

    // 250 samples: worker covers two 100-sample chunks, 50 remain for the
    // final reconciliation pass.
    session
        .start(ScriptedCapture::speech(5, 50), TriggerSource::Ui)
        .await?;

    // Wait for the worker to process both full chunks.
    for _ in 0..200 {
        if session.stats().samples_processed >= 200 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let outcome = session.stop().await?;

    match outcome {
        SessionOutcome::Transcript { text, mode, .. } => {
            assert_eq!(text, "one two tail");
            assert_eq!(mode, TranscriptionMode::Chunked);
        }
        other => panic!("expected transcript, got {other:?}"),
    }
    assert_eq!(transcriber.chunked_calls.load(Ordering::SeqCst), 3);
    assert_eq!(transcriber.single_pass_calls.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test]
async fn chunked_session_with_no_worker_progress_still_covers_the_tail() -> Result<()> {
    let transcriber = ScriptedTranscriber::new(vec![Ok("short tail".to_string())]);
    let (session, _events) = DictationSession::new(test_config(), transcriber.clone());

    // Less than one chunk of audio: the worker never gets a window and the
    // tail pass must pick up everything.
    session
        .start(ScriptedCapture::speech(1, 60), TriggerSource::Ui)
        .await?;
    settle().await;

    let outcome = session.stop().await?;

    match outcome {
        SessionOutcome::Transcript { text, mode, .. } => {
            assert_eq!(text, "short tail");
            assert_eq!(mode, TranscriptionMode::Chunked);
        }
        other => panic!("expected transcript, got {other:?}"),
    }
    assert_eq!(transcriber.chunked_calls.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn ui_trigger_falls_back_to_single_pass_when_chunking_disabled() -> Result<()> {
    let transcriber = ScriptedTranscriber::new(vec![Ok("plain".to_string())]);
    let mut cfg = test_config();
    cfg.chunked_enabled = false;
    let (session, _events) = DictationSession::new(cfg, transcriber.clone());

    session
        .start(ScriptedCapture::speech(3, 100), TriggerSource::Ui)
        .await?;
    settle().await;
    let outcome = session.stop().await?;

    match outcome {
        SessionOutcome::Transcript { mode, .. } => {
            assert_eq!(mode, TranscriptionMode::SinglePass)
        }
        other => panic!("expected transcript, got {other:?}"),
    }
    assert_eq!(transcriber.single_pass_calls.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn session_with_no_audio_is_rejected() -> Result<()> {
    let transcriber = ScriptedTranscriber::new(vec![]);
    let (session, _events) = DictationSession::new(test_config(), transcriber.clone());

    session
        .start(ScriptedCapture::new(vec![]), TriggerSource::Hotkey)
        .await?;
    settle().await;
    let outcome = session.stop().await?;

    assert_eq!(outcome, SessionOutcome::Rejected(RejectReason::NoAudio));
    assert_eq!(transcriber.single_pass_calls.load(Ordering::SeqCst), 0);
    assert!(session.is_idle());

    Ok(())
}

#[tokio::test]
async fn too_short_session_is_rejected() -> Result<()> {
    let transcriber = ScriptedTranscriber::new(vec![]);
    let mut cfg = test_config();
    cfg.min_duration_secs = 10.0;
    let (session, _events) = DictationSession::new(cfg, transcriber.clone());

    session
        .start(ScriptedCapture::speech(2, 160), TriggerSource::Hotkey)
        .await?;
    settle().await;
    let outcome = session.stop().await?;

    assert_eq!(outcome, SessionOutcome::Rejected(RejectReason::TooShort));

    Ok(())
}

#[tokio::test]
async fn silent_session_is_rejected_before_transcription() -> Result<()> {
    let transcriber = ScriptedTranscriber::new(vec![Ok("should not appear".to_string())]);
    let (session, _events) = DictationSession::new(test_config(), transcriber.clone());

    session
        .start(
            ScriptedCapture::new(vec![vec![0.0; 160]; 5]),
            TriggerSource::Hotkey,
        )
        .await?;
    settle().await;
    let outcome = session.stop().await?;

    assert_eq!(outcome, SessionOutcome::Rejected(RejectReason::Silent));
    assert_eq!(transcriber.single_pass_calls.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test]
async fn empty_transcription_result_is_rejected() -> Result<()> {
    let transcriber = ScriptedTranscriber::new(vec![Ok("   ".to_string())]);
    let (session, _events) = DictationSession::new(test_config(), transcriber.clone());

    session
        .start(ScriptedCapture::speech(3, 160), TriggerSource::Hotkey)
        .await?;
    settle().await;
    let outcome = session.stop().await?;

    assert_eq!(
        outcome,
        SessionOutcome::Rejected(RejectReason::EmptyTranscript)
    );

    Ok(())
}

#[tokio::test]
async fn single_pass_failure_propagates_and_returns_to_idle() -> Result<()> {
    let transcriber = ScriptedTranscriber::new(vec![Err("model exploded".to_string())]);
    let (session, _events) = DictationSession::new(test_config(), transcriber.clone());

    session
        .start(ScriptedCapture::speech(3, 160), TriggerSource::Hotkey)
        .await?;
    settle().await;

    let result = session.stop().await;
    assert!(result.is_err(), "single-pass failure must propagate");
    assert!(session.is_idle(), "session must still return to Idle");

    Ok(())
}

#[tokio::test]
async fn starting_while_recording_fails_without_disturbing_the_session() -> Result<()> {
    let transcriber = ScriptedTranscriber::new(vec![Ok("first".to_string())]);
    let (session, _events) = DictationSession::new(test_config(), transcriber.clone());

    session
        .start(ScriptedCapture::speech(3, 160), TriggerSource::Hotkey)
        .await?;

    let second = session
        .start(ScriptedCapture::speech(1, 160), TriggerSource::Hotkey)
        .await;
    assert!(second.is_err());
    assert!(session.is_recording());

    settle().await;
    let outcome = session.stop().await?;
    assert!(matches!(outcome, SessionOutcome::Transcript { .. }));

    Ok(())
}

#[tokio::test]
async fn stopping_an_idle_session_fails() {
    let transcriber = ScriptedTranscriber::new(vec![]);
    let (session, _events) = DictationSession::new(test_config(), transcriber);

    assert!(session.stop().await.is_err());
    assert!(session.is_idle());
}

#[tokio::test]
async fn per_session_state_is_cleared_between_sessions() -> Result<()> {
    let transcriber =
        ScriptedTranscriber::new(vec![Ok("first".to_string()), Ok("second".to_string())]);
    let (session, _events) = DictationSession::new(test_config(), transcriber.clone());

    session
        .start(ScriptedCapture::speech(3, 160), TriggerSource::Hotkey)
        .await?;
    settle().await;
    session.stop().await?;
    assert_eq!(session.last_transcription(), "first");

    let stats = session.stats();
    assert_eq!(stats.samples_captured, 0);
    assert_eq!(stats.samples_processed, 0);
    assert_eq!(stats.transcript_chars, 0);
    assert_eq!(stats.state, RecordingState::Idle);

    // Second full cycle on the same session object.
    session
        .start(ScriptedCapture::speech(3, 160), TriggerSource::Hotkey)
        .await?;
    settle().await;
    let outcome = session.stop().await?;

    match outcome {
        SessionOutcome::Transcript { text, .. } => assert_eq!(text, "second"),
        other => panic!("expected transcript, got {other:?}"),
    }
    assert_eq!(session.last_transcription(), "second");

    session.clear_transcription();
    assert_eq!(session.last_transcription(), "");

    Ok(())
}

#[tokio::test]
async fn max_duration_caps_the_accumulator() -> Result<()> {
    let transcriber = ScriptedTranscriber::new(vec![Ok("capped".to_string())]);
    let mut cfg = test_config();
    cfg.max_samples = 400;
    let (session, _events) = DictationSession::new(cfg, transcriber.clone());

    session
        .start(ScriptedCapture::speech(20, 160), TriggerSource::Hotkey)
        .await?;
    settle().await;

    // The cap is checked per block, so at most one extra block lands.
    assert!(session.stats().samples_captured <= 400 + 160);

    session.stop().await?;
    Ok(())
}

#[tokio::test]
async fn session_emits_lifecycle_events() -> Result<()> {
    let transcriber = ScriptedTranscriber::new(vec![Ok("hello".to_string())]);
    let (session, mut events) = DictationSession::new(test_config(), transcriber.clone());

    session
        .start(ScriptedCapture::speech(3, 160), TriggerSource::Hotkey)
        .await?;
    settle().await;
    session.stop().await?;

    let mut states = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::StateChanged(state) = event {
            states.push(state);
        }
    }

    assert_eq!(
        states,
        vec![
            RecordingState::Recording,
            RecordingState::Processing,
            RecordingState::Idle
        ]
    );

    Ok(())
}

#[tokio::test]
async fn rejection_reason_is_reported_on_the_event_channel() -> Result<()> {
    let transcriber = ScriptedTranscriber::new(vec![]);
    let (session, mut events) = DictationSession::new(test_config(), transcriber);

    session
        .start(ScriptedCapture::new(vec![]), TriggerSource::Hotkey)
        .await?;
    settle().await;
    session.stop().await?;

    let mut statuses = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Status(message) = event {
            statuses.push(message);
        }
    }

    assert_eq!(statuses, vec!["no audio data recorded".to_string()]);

    Ok(())
}
