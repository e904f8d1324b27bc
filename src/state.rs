use std::sync::Mutex;
use tracing::{debug, warn};

/// Recording lifecycle states
///
/// A session moves through exactly one Idle -> Recording -> Processing -> Idle
/// cycle (or Recording -> Idle when aborted before processing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RecordingState {
    Idle,
    Recording,
    Processing,
}

impl RecordingState {
    pub fn label(&self) -> &'static str {
        match self {
            RecordingState::Idle => "idle",
            RecordingState::Recording => "recording",
            RecordingState::Processing => "processing",
        }
    }
}

/// Thread-safe recording state machine
///
/// Valid transitions:
/// - Idle -> Recording
/// - Recording -> Processing
/// - Recording -> Idle (aborted session)
/// - Processing -> Idle
///
/// Anything else is rejected and leaves the state unchanged. The check-and-set
/// is atomic under a single lock so two callers can never both observe a
/// successful transition out of the same state.
pub struct StateMachine {
    state: Mutex<RecordingState>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RecordingState::Idle),
        }
    }

    /// Get the current state
    pub fn current(&self) -> RecordingState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Attempt a transition. Returns true if it was valid and applied.
    pub fn transition_to(&self, new_state: RecordingState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let allowed = matches!(
            (*state, new_state),
            (RecordingState::Idle, RecordingState::Recording)
                | (RecordingState::Recording, RecordingState::Processing)
                | (RecordingState::Recording, RecordingState::Idle)
                | (RecordingState::Processing, RecordingState::Idle)
        );

        if allowed {
            debug!("State transition: {} -> {}", state.label(), new_state.label());
            *state = new_state;
        } else {
            warn!(
                "Invalid state transition: {} -> {}",
                state.label(),
                new_state.label()
            );
        }

        allowed
    }

    pub fn is_idle(&self) -> bool {
        self.current() == RecordingState::Idle
    }

    pub fn is_recording(&self) -> bool {
        self.current() == RecordingState::Recording
    }

    pub fn is_processing(&self) -> bool {
        self.current() == RecordingState::Processing
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
