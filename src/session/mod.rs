//! Dictation session management
//!
//! This module provides the `DictationSession` orchestrator that manages:
//! - Audio capture ingest into the shared accumulator
//! - The chunked transcription worker and its stop signal
//! - Final tail reconciliation after recording stops
//! - Session validation (duration, silence, empty transcript)
//! - Typed event delivery to the consuming side

mod config;
mod events;
mod session;
mod stats;
pub mod worker;

pub use config::SessionConfig;
pub use events::{event_channel, EventSender, SessionEvent};
pub use session::{DictationSession, TriggerSource};
pub use stats::{RejectReason, SessionOutcome, SessionStats, TranscriptionMode};
