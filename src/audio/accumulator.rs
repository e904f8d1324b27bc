// Thread-safe growable sample buffer for the chunked transcription pipeline
//
// The capture callback appends blocks at the tail while the transcription
// worker extracts overlapping windows from the front. A single processed
// cursor separates "new" audio from audio already covered by a window. All
// operations are whole-operation critical sections behind one mutex; nothing
// inside the lock ever calls into transcription, so a slow model call can
// never stall the producer.

use std::sync::Mutex;

struct Inner {
    /// Appended sample blocks, in arrival order. Never mutated in place.
    blocks: Vec<Vec<f32>>,
    /// Sum of block lengths, cached so `total_samples` is O(1).
    total: usize,
    /// Samples already marked processed. Monotone within a session,
    /// reset to 0 only by `reset`.
    processed: usize,
}

/// Append-only audio buffer with a processed-sample cursor and windowed
/// extraction.
pub struct AudioAccumulator {
    inner: Mutex<Inner>,
}

impl AudioAccumulator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                blocks: Vec::new(),
                total: 0,
                processed: 0,
            }),
        }
    }

    /// Append a sample block at the tail. Never waits on anything but the
    /// buffer mutex itself; safe to call from the capture callback.
    pub fn append(&self, block: Vec<f32>) {
        if block.is_empty() {
            return;
        }
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.total += block.len();
        inner.blocks.push(block);
    }

    /// Total samples appended so far.
    pub fn total_samples(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).total
    }

    /// Samples already marked processed.
    pub fn processed_samples(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .processed
    }

    /// Extract the next overlapping window of unprocessed audio.
    ///
    /// Returns None while fewer than `chunk_size` new samples have arrived
    /// (not an error; the caller polls). Otherwise returns the slice
    /// `[max(0, processed - overlap), min(total, start + chunk_size + overlap))`.
    ///
    /// The window is `chunk_size + overlap` long, not `chunk_size`: the
    /// trailing overlap samples are included as lookahead and will be covered
    /// again by the next window's lookback, so every chunk seam gets two-sided
    /// context even though the cursor only advances by `chunk_size` per call.
    pub fn next_window(&self, chunk_size: usize, overlap: usize) -> Option<Vec<f32>> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if inner.total - inner.processed < chunk_size {
            return None;
        }

        let start = inner.processed.saturating_sub(overlap);
        let end = (start + chunk_size + overlap).min(inner.total);
        Some(copy_range(&inner.blocks, start, end))
    }

    /// Advance the processed cursor by `n` samples.
    ///
    /// Callers pass `chunk_size`, not the full window length, so the
    /// unconsumed trailing overlap stays available as the next window's
    /// lookback.
    pub fn mark_processed(&self, n: usize) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.processed = (inner.processed + n).min(inner.total);
    }

    /// All never-fully-processed audio plus `overlap` samples of lookback,
    /// for the final reconciliation pass after recording stops. None when the
    /// cursor has already reached the end.
    pub fn remaining_tail(&self, overlap: usize) -> Option<Vec<f32>> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if inner.processed >= inner.total {
            return None;
        }

        let start = inner.processed.saturating_sub(overlap);
        Some(copy_range(&inner.blocks, start, inner.total))
    }

    /// Copy the whole buffer as one contiguous vector (single-pass mode and
    /// post-stop validation). Returns None when nothing was captured.
    pub fn all_samples(&self) -> Option<Vec<f32>> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.total == 0 {
            return None;
        }
        Some(copy_range(&inner.blocks, 0, inner.total))
    }

    /// Clear all blocks and reset the cursor to 0. Only called at session
    /// boundaries, never concurrently with a window extraction.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.blocks.clear();
        inner.total = 0;
        inner.processed = 0;
    }
}

impl Default for AudioAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy the contiguous sample range `[start, end)` out of the block list.
fn copy_range(blocks: &[Vec<f32>], start: usize, end: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(end.saturating_sub(start));
    let mut offset = 0usize;

    for block in blocks {
        let block_end = offset + block.len();
        if block_end > start && offset < end {
            let from = start.saturating_sub(offset);
            let to = block.len().min(end - offset);
            out.extend_from_slice(&block[from..to]);
        }
        offset = block_end;
        if offset >= end {
            break;
        }
    }

    out
}
