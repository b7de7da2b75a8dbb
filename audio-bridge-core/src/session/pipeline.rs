use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use parking_lot::Mutex;

use super::termination::TerminationHandle;
use crate::models::config::BridgeConfiguration;
use crate::models::error::BridgeError;
use crate::models::run_report::{RunReport, RunStatus, TerminationReason};
use crate::models::state::SessionState;
use crate::pipeline::consumer::{self, ConsumerEvent, ConsumerExit, ConsumerOutcome, DrainPlan, SpawnFailure};
use crate::pipeline::producer::ProducerCallback;
use crate::pipeline::shared::PipelineShared;
use crate::processing::ring_buffer::{RingBuffer, RingProducer};
use crate::traits::frame_source::FrameSource;
use crate::traits::output_device::OutputDevice;
use crate::traits::session_delegate::SessionDelegate;

/// Longest single wait on the consumer's event channel.
const EVENT_POLL: Duration = Duration::from_millis(50);

/// Bounds for the consumer's idle wait (one device period, clamped).
const MIN_WAKE_INTERVAL: Duration = Duration::from_millis(1);
const MAX_WAKE_INTERVAL: Duration = Duration::from_millis(100);

/// The running consumer thread and its event channel.
struct ConsumerHandle<D> {
    thread: thread::JoinHandle<()>,
    events: Receiver<ConsumerEvent<D>>,
}

/// Bridges a realtime frame source to a blocking output device.
///
/// Owns the ring buffer, the gate, the counters and the consumer thread.
/// Generic over the host and the device via [`FrameSource`] and
/// [`OutputDevice`]:
/// ```text
/// [FrameSource] → ProducerCallback → [RingBuffer] → consumer thread → [OutputDevice]
///                        └──── try_signal ──→ [gate] ──→ wait_for_data ──┘
/// ```
///
/// State transitions:
/// `open()` idle → opening → ready, `start()` ready → draining,
/// `wait()`/`stop()` draining → stopping → stopped.
pub struct PipelineSession<S: FrameSource, D: OutputDevice + 'static> {
    source: S,
    device: Option<D>,
    config: BridgeConfiguration,
    state: Arc<Mutex<SessionState>>,
    delegate: Option<Arc<dyn SessionDelegate>>,
    shared: Arc<PipelineShared>,
    producer: Option<RingProducer>,
    consumer: Option<ConsumerHandle<D>>,
    /// Outcome received before `wait()` asked for it.
    finished: Option<ConsumerOutcome<D>>,
    source_active: bool,
    started_at: Option<DateTime<Utc>>,
    started: Option<Instant>,
}

impl<S: FrameSource, D: OutputDevice + 'static> PipelineSession<S, D> {
    /// Build an idle session. Fails if `config` does not validate.
    pub fn new(source: S, device: D, config: BridgeConfiguration) -> Result<Self, BridgeError> {
        config.validate().map_err(BridgeError::ConfigurationFailed)?;
        Ok(Self {
            source,
            device: Some(device),
            config,
            state: Arc::new(Mutex::new(SessionState::Idle)),
            delegate: None,
            shared: Arc::new(PipelineShared::new()),
            producer: None,
            consumer: None,
            finished: None,
            source_active: false,
            started_at: None,
            started: None,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn SessionDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> SessionState {
        self.state.lock().clone()
    }

    pub fn config(&self) -> &BridgeConfiguration {
        &self.config
    }

    /// Samples dropped so far because the ring buffer was full.
    pub fn overruns(&self) -> u64 {
        self.shared.overruns.total()
    }

    pub fn frames_drained(&self) -> u64 {
        self.shared.frames_drained()
    }

    /// Handle for stopping this session from another thread.
    pub fn termination_handle(&self) -> TerminationHandle {
        TerminationHandle::new(Arc::clone(&self.shared))
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The output device, while the session (not the consumer thread) holds it.
    pub fn device(&self) -> Option<&D> {
        self.device.as_ref()
    }

    /// Open the device, allocate the ring buffer and start the consumer.
    /// Transitions: idle → opening → ready.
    pub fn open(&mut self) -> Result<(), BridgeError> {
        if !self.state.lock().is_idle() {
            return Err(BridgeError::InvalidState("can only open from idle state".into()));
        }
        self.set_state(SessionState::Opening);

        let mut device = self
            .device
            .take()
            .ok_or_else(|| BridgeError::InvalidState("output device already consumed".into()))?;

        let device_config = self.config.device_config();
        if let Err(e) = device.open(&device_config) {
            log::error!("Failed to open output device {}: {}", device_config.device_id, e);
            self.device = Some(device);
            return Err(self.fail(e));
        }
        log::info!(
            "Output device {} opened: {} Hz, {} ch, period {} frames, {}",
            device.device_info().id,
            device_config.sample_rate,
            device_config.channels,
            device_config.buffer_frames,
            device_config.sample_format
        );

        let ring = match RingBuffer::new(self.config.ring_capacity_samples()) {
            Ok(ring) => ring,
            Err(e) => {
                Self::close_device(&mut device);
                self.device = Some(device);
                return Err(self.fail(e));
            }
        };
        log::debug!(
            "Ring buffer: {} samples ({} frames x {} ch)",
            ring.capacity(),
            self.config.ring_frames,
            self.config.channels
        );
        let (producer, ring_consumer) = ring.split();

        let plan = DrainPlan {
            channels: self.config.channels as usize,
            format: self.config.sample_format,
            batch_frames: self.config.buffer_frames as usize,
            target_frames: self.config.duration_frames,
            wake_interval: self.wake_interval(),
        };
        let (events_tx, events_rx) = crossbeam_channel::bounded(2);
        let thread = match consumer::spawn(device, ring_consumer, Arc::clone(&self.shared), plan, events_tx) {
            Ok(thread) => thread,
            Err(SpawnFailure { error, mut device }) => {
                Self::close_device(&mut device);
                self.device = Some(device);
                return Err(self.fail(error));
            }
        };
        self.consumer = Some(ConsumerHandle {
            thread,
            events: events_rx,
        });
        self.producer = Some(producer);

        match self.await_ready() {
            Ok(()) => {
                self.set_state(SessionState::Ready);
                Ok(())
            }
            Err(e) => {
                self.shutdown_consumer();
                Err(self.fail(e))
            }
        }
    }

    /// Activate the frame source; `can_process` is latched only after it
    /// succeeds. Transitions: ready → draining.
    pub fn start(&mut self) -> Result<(), BridgeError> {
        if !matches!(*self.state.lock(), SessionState::Ready) {
            return Err(BridgeError::InvalidState("can only start from ready state".into()));
        }
        let producer = self
            .producer
            .take()
            .ok_or_else(|| BridgeError::InvalidState("ring buffer not allocated".into()))?;

        if let Some(rate) = self.source.sample_rate() {
            if rate != self.config.sample_rate {
                log::warn!(
                    "{} runs at {} Hz but the device was opened at {} Hz",
                    self.source.name(),
                    rate,
                    self.config.sample_rate
                );
            }
        }

        let callback = ProducerCallback::new(
            producer,
            Arc::clone(&self.shared),
            self.config.channels as usize,
        );
        if let Err(e) = self.source.activate(callback, self.termination_handle()) {
            log::error!("Failed to activate {}: {}", self.source.name(), e);
            if let Err(e) = self.source.deactivate() {
                log::warn!("Releasing {} failed: {}", self.source.name(), e);
            }
            self.shutdown_consumer();
            return Err(self.fail(e));
        }
        self.source_active = true;

        self.shared.flags.latch_process();
        self.started_at = Some(Utc::now());
        self.started = Some(Instant::now());
        log::info!(
            "Bridging {} → {} ({} frame ring)",
            self.source.name(),
            self.config.device_id,
            self.config.ring_frames
        );
        self.set_state(SessionState::Draining);
        Ok(())
    }

    /// Block until the consumer stops (frame target, termination, or device
    /// failure), then tear down. Transitions: draining → stopping → stopped.
    pub fn wait(&mut self) -> Result<RunReport, BridgeError> {
        if !self.state.lock().is_running() {
            return Err(BridgeError::InvalidState("session is not running".into()));
        }

        let mut deadline: Option<Instant> = None;
        let outcome = loop {
            if let Some(outcome) = self.finished.take() {
                break Some(outcome);
            }
            let Some(consumer) = self.consumer.as_ref() else {
                break None;
            };

            match consumer.events.recv_timeout(EVENT_POLL) {
                Ok(ConsumerEvent::Finished(outcome)) => break Some(outcome),
                Ok(ConsumerEvent::Ready) => {}
                Err(RecvTimeoutError::Timeout) => {
                    if self.shared.is_shutdown() {
                        let deadline = *deadline.get_or_insert_with(|| {
                            if let Some(reason) = self.shared.termination() {
                                log::info!("Termination requested: {:?}", reason);
                            }
                            Instant::now() + self.config.join_timeout
                        });
                        if Instant::now() >= deadline {
                            break None;
                        }
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    log::error!("Consumer thread exited without reporting");
                    break None;
                }
            }
        };

        let deadline = deadline.unwrap_or_else(|| Instant::now() + self.config.join_timeout);
        Ok(self.teardown(outcome, deadline))
    }

    /// Request termination and tear down.
    pub fn stop(&mut self) -> Result<RunReport, BridgeError> {
        if !self.state.lock().is_running() {
            return Err(BridgeError::InvalidState("session is not running".into()));
        }
        self.termination_handle().terminate(TerminationReason::Requested);
        self.wait()
    }

    /// `open()`, `start()`, `wait()`.
    pub fn run(&mut self) -> Result<RunReport, BridgeError> {
        self.open()?;
        self.start()?;
        self.wait()
    }

    // --- Internal helpers ---

    /// One device period, clamped: how long the consumer sleeps before
    /// re-checking the shutdown flag.
    fn wake_interval(&self) -> Duration {
        let period = self.config.buffer_frames as f64 / self.config.sample_rate as f64;
        Duration::from_secs_f64(period).clamp(MIN_WAKE_INTERVAL, MAX_WAKE_INTERVAL)
    }

    fn set_state(&self, new_state: SessionState) {
        {
            let mut state = self.state.lock();
            *state = new_state.clone();
        }
        log::debug!("Session state: {}", new_state.name());
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&new_state);
        }
    }

    fn fail(&self, error: BridgeError) -> BridgeError {
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(&error);
        }
        self.set_state(SessionState::Failed(error.clone()));
        error
    }

    /// Wait for the consumer to hold the gate.
    fn await_ready(&mut self) -> Result<(), BridgeError> {
        let consumer = self
            .consumer
            .as_ref()
            .ok_or_else(|| BridgeError::InvalidState("consumer not started".into()))?;
        match consumer.events.recv_timeout(self.config.join_timeout) {
            Ok(ConsumerEvent::Ready) => Ok(()),
            Ok(ConsumerEvent::Finished(outcome)) => {
                // already stopped, e.g. terminated before it got going
                self.finished = Some(outcome);
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => Err(BridgeError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(BridgeError::ThreadSpawn(
                "consumer thread exited during startup".into(),
            )),
        }
    }

    /// Stop the consumer after a startup failure and close the device.
    fn shutdown_consumer(&mut self) {
        self.termination_handle().terminate(TerminationReason::Requested);
        let deadline = Instant::now() + self.config.join_timeout;
        if let Some(mut outcome) = self.collect_outcome(deadline) {
            Self::close_device(&mut outcome.device);
            self.device = Some(outcome.device);
        }
    }

    /// Wait until `deadline` for the consumer's outcome; joins the thread
    /// if it arrives, detaches it otherwise.
    fn collect_outcome(&mut self, deadline: Instant) -> Option<ConsumerOutcome<D>> {
        if let Some(outcome) = self.finished.take() {
            self.join_consumer();
            return Some(outcome);
        }
        let consumer = self.consumer.as_ref()?;
        let outcome = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match consumer.events.recv_timeout(remaining) {
                Ok(ConsumerEvent::Finished(outcome)) => break Some(outcome),
                Ok(ConsumerEvent::Ready) => continue,
                Err(_) => break None,
            }
        };
        if outcome.is_some() {
            self.join_consumer();
        } else {
            log::warn!("Consumer did not stop within {:?}, detaching it", self.config.join_timeout);
            self.consumer = None;
        }
        outcome
    }

    fn join_consumer(&mut self) {
        if let Some(consumer) = self.consumer.take() {
            if consumer.thread.join().is_err() {
                log::error!("Consumer thread panicked");
            }
        }
    }

    fn close_device(device: &mut D) -> Option<BridgeError> {
        match device.close() {
            Ok(()) => None,
            Err(e) => {
                log::error!("Failed to close output device: {}", e);
                Some(e)
            }
        }
    }

    fn teardown(&mut self, outcome: Option<ConsumerOutcome<D>>, deadline: Instant) -> RunReport {
        self.set_state(SessionState::Stopping);

        // no more producer calls once the source is down
        self.shared.flags.latch_stopped();
        if self.source_active {
            if let Err(e) = self.source.deactivate() {
                log::warn!("Deactivating {} failed: {}", self.source.name(), e);
            }
            self.source_active = false;
        }

        let outcome = match outcome {
            Some(outcome) => {
                self.join_consumer();
                Some(outcome)
            }
            None => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                self.shared.gate.close(remaining.min(self.wake_interval()));
                self.collect_outcome(deadline)
            }
        };

        let channels = self.config.channels as u64;
        let samples_produced = self.shared.samples_produced();
        let samples_dropped = self.shared.overruns.total();

        let (status, frames_drained, samples_pending, checksum) = match outcome {
            Some(mut outcome) => {
                let pending = outcome.ring.available_to_read() as u64;
                let close_error = Self::close_device(&mut outcome.device);
                let checksum = outcome.device.checksum();
                let status = self.final_status(&outcome.exit, close_error, samples_dropped);
                self.device = Some(outcome.device);
                (status, outcome.frames_drained, pending, checksum)
            }
            None => {
                let drained = self.shared.frames_drained();
                let pending = samples_produced
                    .saturating_sub(drained * channels)
                    .saturating_sub(samples_dropped);
                let status = RunStatus::Failed {
                    message: BridgeError::Timeout.to_string(),
                };
                self.report_error(&BridgeError::Timeout);
                (status, drained, pending, None)
            }
        };

        let finished_at = Utc::now();
        let report = RunReport {
            id: uuid::Uuid::new_v4().to_string(),
            status,
            device_id: self.config.device_id.clone(),
            channels: self.config.channels,
            ring_frames: self.config.ring_frames,
            frames_drained,
            samples_produced,
            samples_consumed: frames_drained * channels,
            samples_dropped,
            samples_pending,
            started_at: self.started_at.unwrap_or(finished_at).to_rfc3339(),
            finished_at: finished_at.to_rfc3339(),
            duration_secs: self.started.map(|s| s.elapsed().as_secs_f64()).unwrap_or(0.0),
            output_checksum: checksum,
        };

        if samples_dropped > 0 {
            log::warn!("{} samples dropped to overruns", samples_dropped);
        }
        log::info!(
            "Session stopped: {} frames drained, status {:?}",
            report.frames_drained,
            report.status
        );

        self.set_state(SessionState::Stopped(Box::new(report.clone())));
        if let Some(ref delegate) = self.delegate {
            delegate.on_finished(&report);
        }
        report
    }

    fn final_status(
        &self,
        exit: &ConsumerExit,
        close_error: Option<BridgeError>,
        overruns: u64,
    ) -> RunStatus {
        if let ConsumerExit::DeviceError(e) = exit {
            self.report_error(e);
            return RunStatus::Failed {
                message: e.to_string(),
            };
        }
        if let Some(e) = close_error {
            self.report_error(&e);
            return RunStatus::Failed {
                message: e.to_string(),
            };
        }
        if *exit == ConsumerExit::Terminated {
            let reason = self.shared.termination().unwrap_or(TerminationReason::Requested);
            return RunStatus::Terminated { reason };
        }
        if overruns > 0 {
            return RunStatus::Overrun { overruns };
        }
        RunStatus::Completed
    }

    fn report_error(&self, error: &BridgeError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(error);
        }
    }
}

impl<S: FrameSource, D: OutputDevice + 'static> Drop for PipelineSession<S, D> {
    fn drop(&mut self) {
        if self.consumer.is_none() && !self.source_active {
            return;
        }
        self.shared.flags.latch_stopped();
        if self.source_active {
            let _ = self.source.deactivate();
        }
        if self.consumer.is_some() {
            self.termination_handle().terminate(TerminationReason::Requested);
            let deadline = Instant::now() + self.config.join_timeout;
            if let Some(mut outcome) = self.collect_outcome(deadline) {
                Self::close_device(&mut outcome.device);
            }
        }
    }
}
