use crate::stats::ScanStats;
use serde::Serialize;

/// Engine lifecycle.
///
/// `Uninitialized → Initializing → Initialized`, with `Terminated` reachable
/// from any state and never left. A failed scan returns to `Uninitialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Initialized,
    Terminated,
}

impl EngineState {
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Initialized)
    }

    #[must_use]
    pub const fn is_terminated(self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Whether incoming notifications must wait for the initial scan.
    #[must_use]
    pub const fn gates_notifications(self) -> bool {
        matches!(self, Self::Uninitialized | Self::Initializing)
    }
}

/// What the update loop last reported about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoopReport {
    pub pending_notifications: usize,
    pub applied_notifications: u64,
    pub last_scan: Option<ScanStats>,
    pub last_error: Option<String>,
}

/// Point-in-time view of the engine for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub state: EngineState,
    pub generation: u64,
    pub documents: usize,
    pub identifiers: usize,
    pub pending_notifications: usize,
    pub applied_notifications: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_scan: Option<ScanStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::EngineState;

    #[test]
    fn only_pre_ready_states_gate_notifications() {
        assert!(EngineState::Uninitialized.gates_notifications());
        assert!(EngineState::Initializing.gates_notifications());
        assert!(!EngineState::Initialized.gates_notifications());
        assert!(!EngineState::Terminated.gates_notifications());
    }
}
