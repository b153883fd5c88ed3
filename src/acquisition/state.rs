use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AcquisitionStatus {
    Idle,
    /// First attempt is scheduled after the initial delay.
    Waiting,
    /// Retrying on change notifications and the fallback interval.
    Polling,
    Done,
    TimedOut,
    /// A validation or presentation error was surfaced; no result this cycle.
    Failed,
}

impl Default for AcquisitionStatus {
    fn default() -> Self {
        AcquisitionStatus::Idle
    }
}

/// Per-controller acquisition state. `calculated` flips to true exactly once
/// per page lifetime unless a user retry resets it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquisitionSession {
    pub status: AcquisitionStatus,
    calculated: bool,
    /// Attempts made since the last reset, for logging.
    pub attempts: u32,
}

impl AcquisitionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_calculated(&self) -> bool {
        self.calculated
    }

    pub fn begin_waiting(&mut self) {
        self.status = AcquisitionStatus::Waiting;
    }

    pub fn begin_polling(&mut self) {
        self.status = AcquisitionStatus::Polling;
    }

    pub fn record_attempt(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }

    pub fn mark_calculated(&mut self) {
        self.calculated = true;
        self.status = AcquisitionStatus::Done;
    }

    pub fn finish(&mut self, status: AcquisitionStatus) {
        self.status = status;
    }

    /// User-initiated retry: forget the previous result entirely.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
