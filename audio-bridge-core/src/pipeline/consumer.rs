//! The consumer thread: waits on the gate, drains whole frames, converts
//! them to the device format, and writes them to the output device.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;

use super::gate::WaitOutcome;
use super::shared::PipelineShared;
use crate::models::error::BridgeError;
use crate::processing::ring_buffer::RingConsumer;
use crate::processing::sample_format::SampleFormat;
use crate::traits::output_device::OutputDevice;

pub const CONSUMER_THREAD_NAME: &str = "audio-bridge-consumer";

/// How the consumer drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainPlan {
    pub channels: usize,
    pub format: SampleFormat,
    /// Most frames handed to the device in one write.
    pub batch_frames: usize,
    /// Stop after this many frames (None = until terminated).
    pub target_frames: Option<u64>,
    /// Longest single wait on the gate before the shutdown flag is
    /// re-checked. A terminator that finds the gate held does not wake
    /// the consumer, so this bounds how late shutdown is noticed.
    pub wake_interval: Duration,
}

impl DrainPlan {
    fn remaining(&self, drained: u64) -> Option<u64> {
        self.target_frames.map(|target| target.saturating_sub(drained))
    }
}

/// Why the drain loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumerExit {
    TargetReached,
    Terminated,
    DeviceError(BridgeError),
}

/// Everything the consumer thread hands back when it finishes.
pub struct ConsumerOutcome<D> {
    pub device: D,
    pub ring: RingConsumer,
    pub frames_drained: u64,
    pub exit: ConsumerExit,
}

/// Messages from the consumer thread to the session.
pub enum ConsumerEvent<D> {
    /// Gate held and `can_capture` latched.
    Ready,
    Finished(ConsumerOutcome<D>),
}

/// Run the drain loop on the calling thread until the target, termination,
/// or a device error.
///
/// Holds the gate's lock throughout except while waiting. Waits are
/// bounded by `plan.wake_interval`; an idle wakeup touches neither the ring
/// nor the device. `on_ready` runs once, right after `can_capture` is
/// latched.
pub fn drain<D: OutputDevice>(
    device: &mut D,
    ring: &mut RingConsumer,
    shared: &PipelineShared,
    plan: &DrainPlan,
    on_ready: impl FnOnce(),
) -> (u64, ConsumerExit) {
    let channels = plan.channels;
    let batch_frames = plan.batch_frames.max(1);

    let mut samples = vec![0f32; batch_frames * plan.channels];
    let mut native = vec![0u8; batch_frames * plan.channels * plan.format.bytes_per_sample()];
    let mut drained = 0u64;

    let mut gate = shared.gate.enter();
    shared.flags.latch_capture();
    on_ready();

    if plan.remaining(drained) == Some(0) {
        return (drained, ConsumerExit::TargetReached);
    }

    loop {
        while shared.flags.can_capture() && ring.available_to_read() >= channels {
            if shared.is_shutdown() {
                return (drained, ConsumerExit::Terminated);
            }

            let mut frames = (ring.available_to_read() / channels).min(batch_frames);
            if let Some(remaining) = plan.remaining(drained) {
                frames = frames.min(remaining as usize);
            }

            let count = ring.read(&mut samples[..frames * channels]);
            let frames = count / channels;
            let out_len = plan.format.convert_into(&samples[..count], &mut native);

            match device.write(&native[..out_len], frames) {
                Ok(written) if written == out_len => {}
                Ok(written) => {
                    let error = BridgeError::DeviceWriteFailed(format!(
                        "short write: {} of {} bytes",
                        written, out_len
                    ));
                    log::error!("Output device write failed: {}", error);
                    return (drained, ConsumerExit::DeviceError(error));
                }
                Err(e) => {
                    log::error!("Output device write failed: {}", e);
                    return (drained, ConsumerExit::DeviceError(e));
                }
            }

            drained += frames as u64;
            shared.set_frames_drained(drained);

            if plan.remaining(drained) == Some(0) {
                log::info!("Frame target reached after {} frames", drained);
                return (drained, ConsumerExit::TargetReached);
            }
        }

        if shared.is_shutdown() {
            return (drained, ConsumerExit::Terminated);
        }

        log::trace!("Consumer waiting, {} frames drained", drained);
        if gate.wait_for_data(plan.wake_interval) == Some(WaitOutcome::Closed) {
            return (drained, ConsumerExit::Terminated);
        }
    }
}

/// The consumer thread could not be started. The device comes back so the
/// caller can close it.
pub struct SpawnFailure<D> {
    pub error: BridgeError,
    pub device: D,
}

impl<D> fmt::Debug for SpawnFailure<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnFailure")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// Start the consumer thread.
///
/// The thread sends [`ConsumerEvent::Ready`] once it holds the gate, then
/// [`ConsumerEvent::Finished`] with the device and ring handed back.
/// `stopped` is latched before the outcome is sent.
pub fn spawn<D: OutputDevice + 'static>(
    device: D,
    ring: RingConsumer,
    shared: Arc<PipelineShared>,
    plan: DrainPlan,
    events: Sender<ConsumerEvent<D>>,
) -> Result<thread::JoinHandle<()>, SpawnFailure<D>> {
    spawn_with(
        thread::Builder::new().name(CONSUMER_THREAD_NAME.into()),
        device,
        ring,
        shared,
        plan,
        events,
    )
}

fn spawn_with<D: OutputDevice + 'static>(
    builder: thread::Builder,
    device: D,
    ring: RingConsumer,
    shared: Arc<PipelineShared>,
    plan: DrainPlan,
    events: Sender<ConsumerEvent<D>>,
) -> Result<thread::JoinHandle<()>, SpawnFailure<D>> {
    // device and ring follow only once the thread exists
    let (handoff_tx, handoff_rx) = crossbeam_channel::bounded::<(D, RingConsumer)>(1);

    let spawned = builder.spawn(move || {
        let Ok((mut device, mut ring)) = handoff_rx.recv() else {
            return;
        };

        let ready = events.clone();
        let (frames_drained, exit) = drain(&mut device, &mut ring, &shared, &plan, move || {
            let _ = ready.send(ConsumerEvent::Ready);
        });
        shared.flags.latch_stopped();

        log::debug!("Consumer finished: {:?} ({} frames)", exit, frames_drained);
        let _ = events.send(ConsumerEvent::Finished(ConsumerOutcome {
            device,
            ring,
            frames_drained,
            exit,
        }));
    });

    match spawned {
        Ok(thread) => match handoff_tx.send((device, ring)) {
            Ok(()) => Ok(thread),
            Err(crossbeam_channel::SendError((device, _ring))) => Err(SpawnFailure {
                error: BridgeError::ThreadSpawn("consumer thread exited before start".into()),
                device,
            }),
        },
        Err(e) => Err(SpawnFailure {
            error: BridgeError::ThreadSpawn(e.to_string()),
            device,
        }),
    }
}
