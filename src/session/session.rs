use super::config::SessionConfig;
use super::events::{event_channel, EventSender, SessionEvent};
use super::stats::{RejectReason, SessionOutcome, SessionStats, TranscriptionMode};
use super::worker::{self, WorkerContext, CONTEXT_CHARS};
use crate::audio::{is_silent, write_wav, AudioAccumulator, AudioCapture};
use crate::state::{RecordingState, StateMachine};
use crate::transcribe::{continuity_context, Transcriber};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// What started the session. UI-driven sessions transcribe incrementally
/// (when chunking is enabled); hotkey sessions run a single blocking pass
/// over the whole buffer after recording stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Hotkey,
    Ui,
}

/// A dictation session that manages audio capture, chunked transcription,
/// and final transcript reconciliation
///
/// Owns one accumulator and one accumulated transcript per
/// Idle -> Recording -> Processing -> Idle cycle. Only one worker runs per
/// session; starting a new session requires the previous one to have fully
/// returned to Idle.
pub struct DictationSession {
    config: SessionConfig,

    /// Transcription capability (the model lives outside this crate)
    transcriber: Arc<dyn Transcriber>,

    /// Lifecycle state machine gating start/stop
    state: Arc<StateMachine>,

    /// Shared sample buffer: capture appends, worker extracts windows
    accumulator: Arc<AudioAccumulator>,

    /// Transcript accumulated across chunks, single-writer (the worker)
    transcript: Arc<std::sync::Mutex<String>>,

    /// Cooperative stop signal for the worker
    stop_flag: Arc<AtomicBool>,

    /// Handle for the chunked transcription worker task
    worker_handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,

    /// Handle for the audio ingest task
    ingest_handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,

    /// Active capture source, held for the session's duration
    capture: tokio::sync::Mutex<Option<Box<dyn AudioCapture>>>,

    events: EventSender,

    started_at: std::sync::Mutex<Option<DateTime<Utc>>>,

    /// Mode decided at start() from the trigger source
    mode: std::sync::Mutex<TranscriptionMode>,

    /// Most recent final transcript, kept across sessions
    last_transcription: std::sync::Mutex<String>,
}

impl DictationSession {
    /// Create a session and the event channel its consumer drains.
    pub fn new(
        config: SessionConfig,
        transcriber: Arc<dyn Transcriber>,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (events, rx) = event_channel(128);

        let session = Self {
            config,
            transcriber,
            state: Arc::new(StateMachine::new()),
            accumulator: Arc::new(AudioAccumulator::new()),
            transcript: Arc::new(std::sync::Mutex::new(String::new())),
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker_handle: tokio::sync::Mutex::new(None),
            ingest_handle: tokio::sync::Mutex::new(None),
            capture: tokio::sync::Mutex::new(None),
            events,
            started_at: std::sync::Mutex::new(None),
            mode: std::sync::Mutex::new(TranscriptionMode::SinglePass),
            last_transcription: std::sync::Mutex::new(String::new()),
        };

        (session, rx)
    }

    /// Start recording from the given capture source.
    pub async fn start(
        &self,
        mut capture: Box<dyn AudioCapture>,
        trigger: TriggerSource,
    ) -> Result<()> {
        if !self.state.transition_to(RecordingState::Recording) {
            bail!(
                "cannot start session {} while {}",
                self.config.session_id,
                self.state.current().label()
            );
        }

        // Fresh per-session state
        self.accumulator.reset();
        self.transcript
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.stop_flag.store(false, Ordering::Relaxed);
        *self.started_at.lock().unwrap_or_else(|e| e.into_inner()) = Some(Utc::now());

        let mode = if trigger == TriggerSource::Ui && self.config.chunked_enabled {
            TranscriptionMode::Chunked
        } else {
            TranscriptionMode::SinglePass
        };
        *self.mode.lock().unwrap_or_else(|e| e.into_inner()) = mode;

        info!(
            "Starting session {} ({:?} trigger, {:?} mode, capture: {})",
            self.config.session_id,
            trigger,
            mode,
            capture.name()
        );

        let mut audio_rx = match capture.start().await {
            Ok(rx) => rx,
            Err(e) => {
                self.state.transition_to(RecordingState::Idle);
                return Err(e).context("Failed to start audio capture");
            }
        };

        *self.capture.lock().await = Some(capture);

        // Ingest task: the producer side. Appends blocks without ever waiting
        // on transcription, and stops appending past the session cap.
        let accumulator = Arc::clone(&self.accumulator);
        let max_samples = self.config.max_samples;
        let ingest = tokio::spawn(async move {
            let mut cap_reached = false;
            while let Some(frame) = audio_rx.recv().await {
                if accumulator.total_samples() >= max_samples {
                    if !cap_reached {
                        warn!("Max recording duration reached; dropping further audio");
                        cap_reached = true;
                    }
                    continue;
                }
                accumulator.append(frame.samples);
            }
            debug!("Audio ingest task stopped");
        });
        *self.ingest_handle.lock().await = Some(ingest);

        if mode == TranscriptionMode::Chunked {
            let ctx = WorkerContext {
                accumulator: Arc::clone(&self.accumulator),
                transcript: Arc::clone(&self.transcript),
                transcriber: Arc::clone(&self.transcriber),
                stop: Arc::clone(&self.stop_flag),
                events: self.events.clone(),
                chunk_size: self.config.chunk_size,
                overlap: self.config.overlap,
                poll_interval: self.config.poll_interval,
            };
            *self.worker_handle.lock().await = Some(tokio::spawn(worker::run(ctx)));
        }

        self.events
            .send(SessionEvent::StateChanged(RecordingState::Recording));

        Ok(())
    }

    /// Stop recording, reconcile the transcript, and return the outcome.
    ///
    /// Single-pass transcription failures propagate to the caller; chunked
    /// tail failures are absorbed like any other per-window failure. The
    /// session returns to Idle either way.
    pub async fn stop(&self) -> Result<SessionOutcome> {
        if !self.state.transition_to(RecordingState::Processing) {
            bail!(
                "no active recording to stop in session {}",
                self.config.session_id
            );
        }
        self.events
            .send(SessionEvent::StateChanged(RecordingState::Processing));

        // Stop the capture source; the ingest task drains and exits once the
        // frame channel closes.
        if let Some(mut capture) = self.capture.lock().await.take() {
            if let Err(e) = capture.stop().await {
                warn!("Failed to stop audio capture: {:#}", e);
            }
        }
        if let Some(handle) = self.ingest_handle.lock().await.take() {
            if let Err(e) = handle.await {
                error!("Audio ingest task panicked: {}", e);
            }
        }

        // Raise the stop signal and join the worker with a bounded wait.
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.worker_handle.lock().await.take() {
            match tokio::time::timeout(self.config.worker_stop_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Transcription worker panicked: {}", e),
                Err(_) => {
                    // Known race: a window still mid-call may land after the
                    // tail pass below, or be lost with it.
                    warn!(
                        "Transcription worker did not stop within {:?}; proceeding without it",
                        self.config.worker_stop_timeout
                    );
                }
            }
        }

        let mode = *self.mode.lock().unwrap_or_else(|e| e.into_inner());
        let result = self.finalize(mode).await;

        match &result {
            Ok(SessionOutcome::Transcript { text, .. }) => {
                *self
                    .last_transcription
                    .lock()
                    .unwrap_or_else(|e| e.into_inner()) = text.clone();
                info!(
                    "Session {} complete: {} chars ({:?})",
                    self.config.session_id,
                    text.chars().count(),
                    mode
                );
            }
            Ok(SessionOutcome::Rejected(reason)) => {
                info!("Session {} rejected: {}", self.config.session_id, reason.label());
            }
            Err(e) => {
                error!("Session {} failed: {:#}", self.config.session_id, e);
            }
        }

        // Per-session cleanup runs on every path so the next session starts
        // from a clean Idle.
        self.accumulator.reset();
        self.transcript
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.state.transition_to(RecordingState::Idle);
        self.events
            .send(SessionEvent::StateChanged(RecordingState::Idle));

        result
    }

    /// Produce the session's final transcript or rejection.
    async fn finalize(&self, mode: TranscriptionMode) -> Result<SessionOutcome> {
        let samples = self.accumulator.all_samples().unwrap_or_default();
        let duration_secs = samples.len() as f64 / self.config.sample_rate as f64;

        if !samples.is_empty() {
            info!("Recorded {:.2}s of audio", duration_secs);
            if let Some(path) = &self.config.dump_path {
                if let Err(e) = write_wav(path, &samples, self.config.sample_rate) {
                    warn!("Failed to dump session audio: {:#}", e);
                }
            }
        }

        let text = match mode {
            TranscriptionMode::Chunked => {
                // Final reconciliation: cover the tail the worker never got
                // to, then validate what we accumulated.
                if let Some(tail) = self.accumulator.remaining_tail(self.config.overlap) {
                    if !tail.is_empty() {
                        let context = {
                            let transcript =
                                self.transcript.lock().unwrap_or_else(|e| e.into_inner());
                            continuity_context(&transcript, CONTEXT_CHARS)
                        };
                        match self
                            .transcriber
                            .transcribe_with_context(&tail, &context)
                            .await
                        {
                            Ok(text) => {
                                worker::append_chunk(&self.transcript, &text);
                            }
                            Err(e) => {
                                warn!("Tail transcription failed (tail skipped): {:#}", e);
                            }
                        }
                    }
                }

                if let Some(reason) = self.validate_buffer(&samples, duration_secs) {
                    return self.reject(reason);
                }

                self.transcript
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .clone()
            }
            TranscriptionMode::SinglePass => {
                if let Some(reason) = self.validate_buffer(&samples, duration_secs) {
                    return self.reject(reason);
                }

                // Fatal before any output exists: propagate to the caller.
                self.transcriber
                    .transcribe(&samples, &self.config.language, self.config.vad_filter)
                    .await
                    .context("Transcription failed")?
            }
        };

        let text = text.trim().to_string();
        if text.is_empty() {
            return self.reject(RejectReason::EmptyTranscript);
        }

        Ok(SessionOutcome::Transcript {
            text,
            mode,
            duration_secs,
        })
    }

    /// Session-level validation ladder: no audio, too short, silent.
    fn validate_buffer(&self, samples: &[f32], duration_secs: f64) -> Option<RejectReason> {
        if samples.is_empty() {
            return Some(RejectReason::NoAudio);
        }
        if duration_secs < self.config.min_duration_secs {
            return Some(RejectReason::TooShort);
        }
        if self.config.silence_detection && is_silent(samples, self.config.energy_threshold) {
            return Some(RejectReason::Silent);
        }
        None
    }

    fn reject(&self, reason: RejectReason) -> Result<SessionOutcome> {
        self.events
            .send(SessionEvent::Status(reason.label().to_string()));
        Ok(SessionOutcome::Rejected(reason))
    }

    /// Current session statistics.
    pub fn stats(&self) -> SessionStats {
        let samples_captured = self.accumulator.total_samples();
        SessionStats {
            session_id: self.config.session_id.clone(),
            state: self.state.current(),
            started_at: *self.started_at.lock().unwrap_or_else(|e| e.into_inner()),
            captured_secs: samples_captured as f64 / self.config.sample_rate as f64,
            samples_captured,
            samples_processed: self.accumulator.processed_samples(),
            transcript_chars: self
                .transcript
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .chars()
                .count(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.state.is_recording()
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    /// Most recent final transcript, empty if none yet.
    pub fn last_transcription(&self) -> String {
        self.last_transcription
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Clear the stored transcript (caller-initiated).
    pub fn clear_transcription(&self) {
        self.last_transcription
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}
