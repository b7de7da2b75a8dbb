use crate::models::device_info::EndpointInfo;
use crate::models::error::BridgeError;
use crate::pipeline::producer::ProducerCallback;
use crate::session::termination::TerminationHandle;

/// A realtime audio-graph host that delivers blocks of frames.
///
/// The source owns the realtime thread. After `activate` it calls
/// [`ProducerCallback::process`] once per block from that thread, and
/// reports its own death through `termination` with
/// `TerminationReason::HostShutdown`.
pub trait FrameSource: Send {
    /// Register ports and start delivering blocks.
    fn activate(
        &mut self,
        callback: ProducerCallback,
        termination: TerminationHandle,
    ) -> Result<(), BridgeError>;

    /// Stop delivering blocks and release the host client. Idempotent.
    fn deactivate(&mut self) -> Result<(), BridgeError>;

    /// Rate imposed by the host, if it dictates one.
    fn sample_rate(&self) -> Option<u32>;

    fn name(&self) -> &str;

    fn info(&self) -> EndpointInfo;
}
