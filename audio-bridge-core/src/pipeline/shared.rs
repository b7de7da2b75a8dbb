use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use super::gate::SynchronizationGate;
use super::overrun::OverrunCounter;
use crate::models::run_report::TerminationReason;

/// Readiness latches read by both pipeline threads without locking.
///
/// Each flag goes from `false` to `true` once and never back.
#[derive(Debug, Default)]
pub struct SessionFlags {
    can_process: AtomicBool,
    can_capture: AtomicBool,
    stopped: AtomicBool,
}

impl SessionFlags {
    /// Realtime client is active and its ports are registered.
    pub fn can_process(&self) -> bool {
        self.can_process.load(Ordering::Acquire)
    }

    /// Consumer has the device open and is ready to drain.
    pub fn can_capture(&self) -> bool {
        self.can_capture.load(Ordering::Acquire)
    }

    /// Draining has ended (frame target, termination, or device failure).
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// The producer should queue samples.
    #[inline]
    pub fn is_streaming(&self) -> bool {
        self.can_process() && self.can_capture() && !self.is_stopped()
    }

    pub(crate) fn latch_process(&self) {
        self.can_process.store(true, Ordering::Release);
    }

    pub(crate) fn latch_capture(&self) {
        self.can_capture.store(true, Ordering::Release);
    }

    pub(crate) fn latch_stopped(&self) {
        self.stopped.store(true, Ordering::Release);
    }
}

/// State shared by the session, the producer callback, and the consumer thread.
#[derive(Debug, Default)]
pub struct PipelineShared {
    pub flags: SessionFlags,
    pub gate: SynchronizationGate,
    pub overruns: OverrunCounter,
    samples_produced: AtomicU64,
    frames_drained: AtomicU64,
    shutdown: AtomicBool,
    /// First termination reason, encoded by `reason_code` (0 = none).
    termination: AtomicU8,
}

fn reason_code(reason: TerminationReason) -> u8 {
    match reason {
        TerminationReason::Signal => 1,
        TerminationReason::HostShutdown => 2,
        TerminationReason::Requested => 3,
    }
}

fn reason_from_code(code: u8) -> Option<TerminationReason> {
    match code {
        1 => Some(TerminationReason::Signal),
        2 => Some(TerminationReason::HostShutdown),
        3 => Some(TerminationReason::Requested),
        _ => None,
    }
}

impl PipelineShared {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples_produced(&self) -> u64 {
        self.samples_produced.load(Ordering::Relaxed)
    }

    pub fn frames_drained(&self) -> u64 {
        self.frames_drained.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn add_produced(&self, samples: u64) {
        self.samples_produced.fetch_add(samples, Ordering::Relaxed);
    }

    pub(crate) fn set_frames_drained(&self, frames: u64) {
        self.frames_drained.store(frames, Ordering::Relaxed);
    }

    /// Record the first termination request and latch `stopped`.
    ///
    /// Lock-free, so it may run on a host notification thread. Returns
    /// `false` if termination was already requested.
    pub(crate) fn request_termination(&self, reason: TerminationReason) -> bool {
        let first = self
            .termination
            .compare_exchange(0, reason_code(reason), Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        self.shutdown.store(true, Ordering::Release);
        self.flags.latch_stopped();
        first
    }

    pub fn termination(&self) -> Option<TerminationReason> {
        reason_from_code(self.termination.load(Ordering::Acquire))
    }

    /// Termination was requested (checked by the consumer before each write).
    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}
