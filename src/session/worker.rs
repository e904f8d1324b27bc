// Background chunked-transcription worker
//
// Polls the accumulator for overlapping windows of newly-arrived audio,
// transcribes each with a continuity prompt, and appends results to the
// shared transcript. One worker runs per session; cancellation is
// cooperative via the shared stop flag, checked once per iteration, so
// shutdown latency is bounded by the poll interval.

use crate::audio::AudioAccumulator;
use crate::session::events::{EventSender, SessionEvent};
use crate::transcribe::{continuity_context, Transcriber};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Characters of accumulated transcript passed back as continuity context.
pub const CONTEXT_CHARS: usize = 100;

/// Everything the worker task needs, cloned out of the session at spawn time.
pub struct WorkerContext {
    pub accumulator: Arc<AudioAccumulator>,
    pub transcript: Arc<Mutex<String>>,
    pub transcriber: Arc<dyn Transcriber>,
    pub stop: Arc<AtomicBool>,
    pub events: EventSender,
    pub chunk_size: usize,
    pub overlap: usize,
    pub poll_interval: Duration,
}

/// Worker loop. Runs until the stop flag is raised.
///
/// A failed window is logged, skipped, and never retried; previously
/// accumulated text survives. The transcription call always happens outside
/// the accumulator and transcript locks.
pub async fn run(ctx: WorkerContext) {
    debug!("Chunked transcription worker started");
    let mut windows = 0usize;
    let mut failures = 0usize;

    loop {
        if ctx.stop.load(Ordering::Relaxed) {
            break;
        }

        let window = ctx.accumulator.next_window(ctx.chunk_size, ctx.overlap);

        let Some(window) = window else {
            // Not enough new audio yet; back off for one poll interval.
            tokio::time::sleep(ctx.poll_interval).await;
            continue;
        };

        let context = {
            let transcript = ctx.transcript.lock().unwrap_or_else(|e| e.into_inner());
            continuity_context(&transcript, CONTEXT_CHARS)
        };

        match ctx
            .transcriber
            .transcribe_with_context(&window, &context)
            .await
        {
            Ok(text) => {
                let snapshot = append_chunk(&ctx.transcript, &text);
                if let Some(snapshot) = snapshot {
                    ctx.events.send(SessionEvent::PartialTranscript(snapshot));
                }
            }
            Err(e) => {
                // Recoverable: skip this window, keep what we have.
                failures += 1;
                warn!("Chunk transcription failed (window skipped): {:#}", e);
            }
        }

        // Advance past the failed window too; only the availability poll
        // retries, never a transcription call.
        ctx.accumulator.mark_processed(ctx.chunk_size);
        windows += 1;

        ctx.events.send(SessionEvent::Progress {
            processed: ctx.accumulator.processed_samples(),
            total: ctx.accumulator.total_samples(),
        });
    }

    debug!(
        "Chunked transcription worker stopped ({} windows, {} failures)",
        windows, failures
    );
}

/// Append a chunk's text to the shared transcript with a single separating
/// space. Empty results contribute nothing. Returns a snapshot of the
/// transcript when it changed.
pub fn append_chunk(transcript: &Mutex<String>, text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let mut transcript = transcript.lock().unwrap_or_else(|e| e.into_inner());
    if !transcript.is_empty() {
        transcript.push(' ');
    }
    transcript.push_str(text);
    Some(transcript.clone())
}
