use crate::models::config::DeviceConfig;
use crate::models::device_info::EndpointInfo;
use crate::models::error::BridgeError;

/// Blocking sink for converted audio, driven only by the consumer thread.
///
/// Implemented by:
/// - `WavFileDevice` (native-format PCM into a WAV file)
/// - `NullDevice` (discards, optionally paced like hardware)
pub trait OutputDevice: Send {
    /// Open with the session's format. Called once, before the consumer starts.
    fn open(&mut self, config: &DeviceConfig) -> Result<(), BridgeError>;

    /// Write `frames` whole frames of interleaved native-format samples.
    ///
    /// May block for as long as the hardware needs. Returns bytes accepted;
    /// anything short of `data.len()` is treated as a failure by the caller.
    fn write(&mut self, data: &[u8], frames: usize) -> Result<usize, BridgeError>;

    /// Flush and release the device. No writes follow.
    fn close(&mut self) -> Result<(), BridgeError>;

    fn device_info(&self) -> EndpointInfo;

    /// Hex digest of everything written, for devices that keep one.
    fn checksum(&self) -> Option<String> {
        None
    }
}
