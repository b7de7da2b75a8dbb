//! # audio-bridge-core
//!
//! Bridges a realtime audio-graph callback to a blocking output device.
//!
//! The producer side runs on the host's realtime thread and never blocks,
//! allocates, or performs I/O: it copies interleaved samples into a
//! lock-free ring buffer and opportunistically signals the consumer. The
//! consumer thread drains whole frames, converts them to the device's
//! native format, and writes them synchronously. A full ring drops the
//! newest samples and counts them as overruns.
//!
//! Hosts implement [`FrameSource`], devices implement [`OutputDevice`],
//! and [`PipelineSession`] wires them together.
//!
//! ## Architecture
//!
//! ```text
//! audio-bridge-core (this crate)
//! ├── traits/       ← FrameSource, OutputDevice, SessionDelegate
//! ├── models/       ← BridgeError, SessionState, BridgeConfiguration, RunReport
//! ├── processing/   ← RingBuffer, SampleFormat conversion, WAV header generation
//! ├── pipeline/     ← ProducerCallback, consumer drain loop, SynchronizationGate, OverrunCounter
//! ├── session/      ← PipelineSession, TerminationHandle
//! ├── output/       ← WavFileDevice, NullDevice
//! ├── sources/      ← ToneSource
//! └── storage/      ← JSON run report sidecar
//! ```

pub mod models;
pub mod output;
pub mod pipeline;
pub mod processing;
pub mod session;
pub mod sources;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::{BridgeConfiguration, DeviceConfig, DEFAULT_RING_FRAMES};
pub use models::device_info::{EndpointInfo, EndpointKind};
pub use models::error::BridgeError;
pub use models::run_report::{RunReport, RunStatus, TerminationReason, EXIT_OVERRUN};
pub use models::state::SessionState;
pub use output::null_device::NullDevice;
pub use output::wav_device::WavFileDevice;
pub use pipeline::frame_block::{FrameBlock, MAX_CHANNELS};
pub use pipeline::gate::{SynchronizationGate, WaitOutcome};
pub use pipeline::overrun::OverrunCounter;
pub use pipeline::producer::{BlockOutcome, ProducerCallback};
pub use processing::ring_buffer::{RingBuffer, RingConsumer, RingProducer};
pub use processing::sample_format::SampleFormat;
pub use session::pipeline::PipelineSession;
pub use session::termination::TerminationHandle;
pub use sources::tone::ToneSource;
pub use traits::frame_source::FrameSource;
pub use traits::output_device::OutputDevice;
pub use traits::session_delegate::SessionDelegate;
