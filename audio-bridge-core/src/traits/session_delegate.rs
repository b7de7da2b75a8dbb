use crate::models::error::BridgeError;
use crate::models::run_report::RunReport;
use crate::models::state::SessionState;

/// Event delegate for bridge session notifications.
///
/// Called from whichever thread drives the session (never the realtime
/// thread).
pub trait SessionDelegate: Send + Sync {
    fn on_state_changed(&self, state: &SessionState);

    fn on_error(&self, error: &BridgeError);

    /// Called once with the final report, after the device is closed.
    fn on_finished(&self, report: &RunReport);
}
