use serde::{Deserialize, Serialize};

/// Exit status used when a run ends with overruns (EPIPE).
pub const EXIT_OVERRUN: i32 = 32;

/// Why a session was told to stop before reaching its frame target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// SIGINT / SIGTERM or an equivalent user interrupt.
    Signal,
    /// The realtime host went away.
    HostShutdown,
    /// `PipelineSession::stop` was called.
    Requested,
}

/// Final outcome of a bridge run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunStatus {
    /// Frame target reached with no samples dropped.
    Completed,
    /// Samples were dropped because the ring buffer was full.
    Overrun { overruns: u64 },
    /// Stopped early by a termination request.
    Terminated { reason: TerminationReason },
    /// The consumer or teardown failed.
    Failed { message: String },
}

/// Accounting and status for a finished session.
///
/// Serializable for the JSON report sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub id: String,
    pub status: RunStatus,
    pub device_id: String,
    pub channels: u16,
    pub ring_frames: u32,
    pub frames_drained: u64,
    pub samples_produced: u64,
    pub samples_consumed: u64,
    pub samples_dropped: u64,
    /// Samples still queued when draining ended.
    pub samples_pending: u64,
    pub started_at: String,
    pub finished_at: String,
    pub duration_secs: f64,
    pub output_checksum: Option<String>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            RunStatus::Completed
                | RunStatus::Terminated {
                    reason: TerminationReason::Signal | TerminationReason::Requested
                }
        )
    }

    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self.status {
            RunStatus::Completed => 0,
            RunStatus::Terminated {
                reason: TerminationReason::Signal | TerminationReason::Requested,
            } => 0,
            RunStatus::Terminated {
                reason: TerminationReason::HostShutdown,
            } => 1,
            RunStatus::Overrun { .. } => EXIT_OVERRUN,
            RunStatus::Failed { .. } => 1,
        }
    }

    /// Human-readable failure explanation, if the run did not succeed.
    pub fn diagnostic(&self) -> Option<String> {
        match &self.status {
            RunStatus::Overrun { overruns } => Some(format!(
                "bridge failed with {} overruns; try a bigger buffer than --ring-frames {}",
                overruns, self.ring_frames
            )),
            RunStatus::Terminated {
                reason: TerminationReason::HostShutdown,
            } => Some("realtime host shut down, exiting".into()),
            RunStatus::Failed { message } => Some(format!("bridge failed: {}", message)),
            _ => None,
        }
    }

    /// Every produced sample was drained, dropped, or is still queued.
    pub fn is_conserved(&self) -> bool {
        self.samples_produced == self.samples_consumed + self.samples_dropped + self.samples_pending
    }
}
