use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};

use audio_bridge_core::{BridgeConfiguration, SampleFormat, DEFAULT_RING_FRAMES};
use audio_bridge_jack::DEFAULT_CLIENT_NAME;

/// Where frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Built-in sine generator paced like a realtime host.
    Tone,
    /// A JACK client with one input port per channel.
    Jack,
}

#[derive(Debug, Parser, Clone)]
#[command(name = "audio-bridge", version)]
#[command(about = "Bridge a realtime audio graph to a blocking output device")]
pub struct Cli {
    /// Output device: a `.wav` path, or `null` to discard at the hardware rate.
    #[arg(short, long, default_value = "null")]
    pub device: String,

    /// Sample rate in Hz.
    #[arg(short = 'r', long, default_value_t = 48000)]
    pub sample_rate: u32,

    /// Number of channels to bridge.
    #[arg(short, long, default_value_t = 2)]
    pub channels: u16,

    /// Device period in frames (largest single device write).
    #[arg(long, default_value_t = 480)]
    pub buffer_frames: u32,

    /// Ring buffer capacity in frames.
    #[arg(short = 'B', long, default_value_t = DEFAULT_RING_FRAMES)]
    pub ring_frames: u32,

    /// Stop after this many seconds (default: run until interrupted).
    #[arg(long)]
    pub duration: Option<f64>,

    /// Device sample format: f32, s16, s24 or s32.
    #[arg(short, long, default_value = "s16")]
    pub format: SampleFormat,

    #[arg(long, value_enum, default_value_t = SourceKind::Tone)]
    pub source: SourceKind,

    /// Tone frequency in Hz (tone source only).
    #[arg(long, default_value_t = 440.0)]
    pub tone_hz: f32,

    /// JACK client name (jack source only).
    #[arg(long, default_value = DEFAULT_CLIENT_NAME)]
    pub client_name: String,

    /// Write the run report as JSON to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// How long shutdown waits for the consumer thread, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    pub join_timeout_ms: u64,
}

impl Cli {
    /// Session configuration described by these arguments.
    pub fn configuration(&self) -> Result<BridgeConfiguration> {
        let mut config = BridgeConfiguration {
            device_id: self.device.clone(),
            sample_rate: self.sample_rate,
            channels: self.channels,
            buffer_frames: self.buffer_frames,
            ring_frames: self.ring_frames,
            sample_format: self.format,
            duration_frames: None,
            join_timeout: Duration::from_millis(self.join_timeout_ms),
        };

        if let Some(secs) = self.duration {
            if !secs.is_finite() || secs <= 0.0 {
                bail!("--duration must be a positive number of seconds");
            }
            config.duration_frames = Some(config.frames_for(Duration::from_secs_f64(secs)).max(1));
        }

        if let Err(message) = config.validate() {
            bail!("invalid configuration: {}", message);
        }
        Ok(config)
    }
}
