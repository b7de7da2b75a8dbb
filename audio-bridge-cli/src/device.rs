use std::path::Path;

use audio_bridge_core::{
    BridgeError, DeviceConfig, EndpointInfo, NullDevice, OutputDevice, WavFileDevice,
};

/// Output devices selectable from the command line.
pub enum CliDevice {
    Wav(WavFileDevice),
    Null(NullDevice),
}

impl CliDevice {
    /// Resolve a `--device` address: `null`, or a path ending in `.wav`.
    pub fn from_address(address: &str) -> Result<Self, BridgeError> {
        if address.eq_ignore_ascii_case("null") {
            return Ok(Self::Null(NullDevice::paced()));
        }
        let is_wav = Path::new(address)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
        if is_wav {
            return Ok(Self::Wav(WavFileDevice::new(address)));
        }
        Err(BridgeError::DeviceOpenFailed(format!(
            "unsupported output device '{}': use a .wav path or 'null'",
            address
        )))
    }
}

impl OutputDevice for CliDevice {
    fn open(&mut self, config: &DeviceConfig) -> Result<(), BridgeError> {
        match self {
            Self::Wav(device) => device.open(config),
            Self::Null(device) => device.open(config),
        }
    }

    fn write(&mut self, data: &[u8], frames: usize) -> Result<usize, BridgeError> {
        match self {
            Self::Wav(device) => device.write(data, frames),
            Self::Null(device) => device.write(data, frames),
        }
    }

    fn close(&mut self) -> Result<(), BridgeError> {
        match self {
            Self::Wav(device) => device.close(),
            Self::Null(device) => device.close(),
        }
    }

    fn device_info(&self) -> EndpointInfo {
        match self {
            Self::Wav(device) => device.device_info(),
            Self::Null(device) => device.device_info(),
        }
    }

    fn checksum(&self) -> Option<String> {
        match self {
            Self::Wav(device) => device.checksum(),
            Self::Null(device) => device.checksum(),
        }
    }
}
