//! # audio-bridge-jack
//!
//! JACK frame source for audio-bridge.
//!
//! Provides:
//! - `JackSource` — a JACK client with one input port per channel whose
//!   process callback feeds the bridge's `ProducerCallback`
//! - port naming helpers shared with the CLI
//!
//! ## Platform Requirements
//! - Linux with a running JACK (or PipeWire JACK) server
//! - the `jack-backend` cargo feature
//!
//! ## Usage
//! ```ignore
//! use audio_bridge_core::{BridgeConfiguration, PipelineSession, WavFileDevice};
//! use audio_bridge_jack::JackSource;
//!
//! let config = BridgeConfiguration::default();
//! let source = JackSource::open(audio_bridge_jack::DEFAULT_CLIENT_NAME, config.channels as usize)?;
//! let mut session = PipelineSession::new(source, WavFileDevice::new("take.wav"), config)?;
//! let report = session.run()?;
//! ```

#[cfg(all(target_os = "linux", feature = "jack-backend"))]
pub mod jack_source;

#[cfg(all(target_os = "linux", feature = "jack-backend"))]
pub use jack_source::JackSource;

/// Client name registered with the JACK server when none is given.
pub const DEFAULT_CLIENT_NAME: &str = "audio-bridge";

/// Short name of the input port for zero-based channel `index`: `in_1`, `in_2`, ...
pub fn input_port_name(index: usize) -> String {
    format!("in_{}", index + 1)
}

/// Fully qualified port name as other JACK clients see it (`client:port`).
pub fn full_port_name(client_name: &str, port_name: &str) -> String {
    format!("{}:{}", client_name, port_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ports_are_numbered_from_one() {
        assert_eq!(input_port_name(0), "in_1");
        assert_eq!(input_port_name(7), "in_8");
    }

    #[test]
    fn qualified_names() {
        assert_eq!(
            full_port_name(DEFAULT_CLIENT_NAME, &input_port_name(0)),
            "audio-bridge:in_1"
        );
    }
}
