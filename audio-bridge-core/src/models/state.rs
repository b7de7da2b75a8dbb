use super::error::BridgeError;
use super::run_report::RunReport;

/// Bridge session state machine.
///
/// State transitions:
/// ```text
/// idle → opening → ready → draining → stopping → stopped
///          ↓                   ↓
///        failed             (termination)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    /// Output device opened, consumer thread starting.
    Opening,
    /// Consumer holds the gate and `can_capture` is latched.
    Ready,
    /// Realtime client active and `can_process` is latched.
    Draining,
    Stopping,
    Stopped(Box<RunReport>),
    Failed(BridgeError),
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Consumer thread is running (opening, ready, or draining).
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Opening | Self::Ready | Self::Draining)
    }

    pub fn is_draining(&self) -> bool {
        matches!(self, Self::Draining)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped(_) | Self::Failed(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Opening => "opening",
            Self::Ready => "ready",
            Self::Draining => "draining",
            Self::Stopping => "stopping",
            Self::Stopped(_) => "stopped",
            Self::Failed(_) => "failed",
        }
    }
}
