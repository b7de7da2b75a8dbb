use std::thread;
use std::time::Duration;

use crate::models::config::DeviceConfig;
use crate::models::device_info::{EndpointInfo, EndpointKind};
use crate::models::error::BridgeError;
use crate::traits::output_device::OutputDevice;

/// Output device that discards everything it is given.
///
/// With pacing enabled each write sleeps for the frames' playback time,
/// which makes the consumer block the way it would on real hardware.
#[derive(Debug, Default)]
pub struct NullDevice {
    paced: bool,
    sample_rate: u32,
    open: bool,
    frames_written: u64,
    bytes_written: u64,
}

impl NullDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// A null device that blocks for `frames / sample_rate` per write.
    pub fn paced() -> Self {
        Self {
            paced: true,
            ..Self::default()
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl OutputDevice for NullDevice {
    fn open(&mut self, config: &DeviceConfig) -> Result<(), BridgeError> {
        if config.sample_rate == 0 {
            return Err(BridgeError::DeviceOpenFailed("sample rate must be positive".into()));
        }
        self.sample_rate = config.sample_rate;
        self.open = true;
        log::debug!("Null output opened (paced: {})", self.paced);
        Ok(())
    }

    fn write(&mut self, data: &[u8], frames: usize) -> Result<usize, BridgeError> {
        if !self.open {
            return Err(BridgeError::DeviceWriteFailed("device is not open".into()));
        }
        if self.paced && frames > 0 {
            thread::sleep(Duration::from_secs_f64(frames as f64 / self.sample_rate as f64));
        }
        self.frames_written += frames as u64;
        self.bytes_written += data.len() as u64;
        Ok(data.len())
    }

    fn close(&mut self) -> Result<(), BridgeError> {
        self.open = false;
        Ok(())
    }

    fn device_info(&self) -> EndpointInfo {
        EndpointInfo::new("null", "Null output", EndpointKind::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::sample_format::SampleFormat;
    use std::time::Instant;

    fn config() -> DeviceConfig {
        DeviceConfig {
            device_id: "null".into(),
            sample_rate: 1000,
            channels: 1,
            buffer_frames: 10,
            sample_format: SampleFormat::S16Le,
        }
    }

    #[test]
    fn counts_and_discards() {
        let mut device = NullDevice::new();
        assert!(device.write(&[0; 4], 2).is_err());

        device.open(&config()).unwrap();
        assert_eq!(device.write(&[0; 4], 2).unwrap(), 4);
        assert_eq!(device.frames_written(), 2);
        assert_eq!(device.bytes_written(), 4);

        device.close().unwrap();
        assert!(!device.is_open());
    }

    #[test]
    fn paced_write_blocks_for_playback_time() {
        let mut device = NullDevice::paced();
        device.open(&config()).unwrap();

        let start = Instant::now();
        device.write(&[0; 40], 20).unwrap();
        // 20 frames at 1 kHz
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
