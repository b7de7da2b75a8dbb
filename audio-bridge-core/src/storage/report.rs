use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::BridgeError;
use crate::models::run_report::RunReport;

/// Sidecar location for a run that wrote `output_path`: `{output}.report.json`.
pub fn sidecar_path(output_path: &Path) -> PathBuf {
    output_path.with_extension("report.json")
}

/// Write a run report as pretty-printed JSON.
pub fn write_report(report: &RunReport, path: &Path) -> Result<(), BridgeError> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| BridgeError::StorageError(format!("failed to serialize report: {}", e)))?;
    fs::write(path, json)
        .map_err(|e| BridgeError::StorageError(format!("failed to write report: {}", e)))?;
    log::debug!("Run report written to {}", path.display());
    Ok(())
}

/// Read a run report written by [`write_report`].
pub fn read_report(path: &Path) -> Result<RunReport, BridgeError> {
    let json = fs::read_to_string(path)
        .map_err(|e| BridgeError::StorageError(format!("failed to read report: {}", e)))?;
    serde_json::from_str(&json)
        .map_err(|e| BridgeError::StorageError(format!("failed to parse report: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::run_report::{RunStatus, TerminationReason};

    fn temp_file_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}_{}", uuid::Uuid::new_v4(), name))
    }

    #[test]
    fn report_survives_a_round_trip_on_disk() {
        let report = RunReport {
            id: uuid::Uuid::new_v4().to_string(),
            status: RunStatus::Terminated {
                reason: TerminationReason::Signal,
            },
            device_id: "out.wav".into(),
            channels: 2,
            ring_frames: 9600,
            frames_drained: 480,
            samples_produced: 1000,
            samples_consumed: 960,
            samples_dropped: 0,
            samples_pending: 40,
            started_at: chrono::Utc::now().to_rfc3339(),
            finished_at: chrono::Utc::now().to_rfc3339(),
            duration_secs: 0.01,
            output_checksum: Some("ab".repeat(32)),
        };
        let path = temp_file_path("report.json");

        write_report(&report, &path).unwrap();
        let loaded = read_report(&path).unwrap();
        assert_eq!(loaded, report);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_report_is_a_storage_error() {
        let path = temp_file_path("missing.json");
        assert!(matches!(read_report(&path), Err(BridgeError::StorageError(_))));
    }

    #[test]
    fn sidecar_sits_next_to_output() {
        let path = sidecar_path(Path::new("/tmp/take1.wav"));
        assert_eq!(path, PathBuf::from("/tmp/take1.report.json"));
    }
}
