use serde::{Deserialize, Serialize};

/// Outcome of one initial scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub documents: usize,
    pub documents_with_occurrences: usize,
    pub occurrences: usize,
    pub identifiers: usize,
    pub duration_ms: u64,
}

impl ScanStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Per-state counts of a validated view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSummary {
    pub success: usize,
    pub warning: usize,
    pub error: usize,
}

impl StateSummary {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.success + self.warning + self.error
    }

    #[must_use]
    pub const fn has_errors(&self) -> bool {
        self.error > 0
    }
}
