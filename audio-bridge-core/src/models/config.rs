use std::time::Duration;

use crate::pipeline::frame_block::MAX_CHANNELS;
use crate::processing::sample_format::SampleFormat;

/// Ring buffer size in frames used when none is given (200 ms at 48 kHz).
pub const DEFAULT_RING_FRAMES: u32 = 9600;

/// Configuration for a bridge session.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfiguration {
    /// Output device address, e.g. `hw:0,0` or a file path (default: `hw:0,0`).
    pub device_id: String,

    /// Sample rate in Hz shared by the host and the device (default: 48000).
    pub sample_rate: u32,

    /// Interleaved channel count (default: 2).
    pub channels: u16,

    /// Device period in frames; also the consumer's maximum write batch (default: 480).
    pub buffer_frames: u32,

    /// Ring buffer capacity in frames (default: 9600).
    pub ring_frames: u32,

    /// Native sample representation of the output device (default: S16Le).
    pub sample_format: SampleFormat,

    /// Number of frames to drain before stopping (None = run until terminated).
    pub duration_frames: Option<u64>,

    /// How long teardown waits for the consumer thread before detaching it.
    pub join_timeout: Duration,
}

impl BridgeConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.device_id.trim().is_empty() {
            return Err("device id must not be empty".into());
        }
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.channels == 0 || self.channels as usize > MAX_CHANNELS {
            return Err(format!(
                "unsupported channel count: {} (1..={})",
                self.channels, MAX_CHANNELS
            ));
        }
        if self.buffer_frames == 0 {
            return Err("buffer frames must be positive".into());
        }
        if self.ring_frames == 0 {
            return Err("ring buffer must hold at least one frame".into());
        }
        if self.duration_frames == Some(0) {
            return Err("duration must cover at least one frame".into());
        }
        if self.join_timeout.is_zero() {
            return Err("join timeout must be positive".into());
        }
        Ok(())
    }

    /// Ring buffer capacity in interleaved samples.
    pub fn ring_capacity_samples(&self) -> usize {
        self.ring_frames as usize * self.channels as usize
    }

    /// Number of frames covering `duration` at the configured rate.
    pub fn frames_for(&self, duration: Duration) -> u64 {
        (duration.as_secs_f64() * self.sample_rate as f64).round() as u64
    }

    /// Device parameters handed to `OutputDevice::open`.
    pub fn device_config(&self) -> DeviceConfig {
        DeviceConfig {
            device_id: self.device_id.clone(),
            sample_rate: self.sample_rate,
            channels: self.channels,
            buffer_frames: self.buffer_frames,
            sample_format: self.sample_format,
        }
    }
}

impl Default for BridgeConfiguration {
    fn default() -> Self {
        Self {
            device_id: "hw:0,0".into(),
            sample_rate: 48000,
            channels: 2,
            buffer_frames: 480,
            ring_frames: DEFAULT_RING_FRAMES,
            sample_format: SampleFormat::S16Le,
            duration_frames: None,
            join_timeout: Duration::from_secs(2),
        }
    }
}

/// Parameters an output device is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub device_id: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub buffer_frames: u32,
    pub sample_format: SampleFormat,
}
