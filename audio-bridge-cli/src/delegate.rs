use audio_bridge_core::{BridgeError, RunReport, SessionDelegate, SessionState};

/// SessionDelegate that reports session events through the log.
pub struct LogDelegate;

impl SessionDelegate for LogDelegate {
    fn on_state_changed(&self, state: &SessionState) {
        log::debug!("state → {}", state.name());
    }

    fn on_error(&self, error: &BridgeError) {
        log::error!("{}", error);
    }

    fn on_finished(&self, report: &RunReport) {
        log::info!(
            "{} frames in {:.2}s: {} samples produced, {} consumed, {} dropped, {} pending",
            report.frames_drained,
            report.duration_secs,
            report.samples_produced,
            report.samples_consumed,
            report.samples_dropped,
            report.samples_pending
        );
        if let Some(ref checksum) = report.output_checksum {
            log::info!("output sha256 {}", checksum);
        }
    }
}
