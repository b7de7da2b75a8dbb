use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::models::device_info::{EndpointInfo, EndpointKind};
use crate::models::error::BridgeError;
use crate::pipeline::frame_block::{FrameBlock, MAX_CHANNELS};
use crate::pipeline::producer::ProducerCallback;
use crate::session::termination::TerminationHandle;
use crate::traits::frame_source::FrameSource;

/// Frame source that plays a sine wave from its own "host" thread.
///
/// Stands in for a realtime audio graph: the thread fills pre-allocated
/// per-channel buffers and calls the producer once per block, sleeping
/// for the block period between calls when paced.
pub struct ToneSource {
    sample_rate: u32,
    channels: usize,
    block_frames: usize,
    frequency: f32,
    amplitude: f32,
    paced: bool,
    block_limit: Option<u64>,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ToneSource {
    pub fn new(sample_rate: u32, channels: usize, block_frames: usize, frequency: f32) -> Self {
        Self {
            sample_rate,
            channels: channels.clamp(1, MAX_CHANNELS),
            block_frames: block_frames.max(1),
            frequency,
            amplitude: 0.5,
            paced: true,
            block_limit: None,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Deliver blocks back to back instead of at the block period.
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }

    /// Stop delivering after `blocks` blocks.
    pub fn with_block_limit(mut self, blocks: u64) -> Self {
        self.block_limit = Some(blocks);
        self
    }

    pub fn block_period(&self) -> Duration {
        Duration::from_secs_f64(self.block_frames as f64 / self.sample_rate as f64)
    }

    pub fn is_active(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl FrameSource for ToneSource {
    fn activate(
        &mut self,
        mut callback: ProducerCallback,
        _termination: TerminationHandle,
    ) -> Result<(), BridgeError> {
        if self.handle.is_some() {
            return Err(BridgeError::InvalidState("tone source already active".into()));
        }
        if self.sample_rate == 0 {
            return Err(BridgeError::ClientFailed("sample rate must be positive".into()));
        }

        let running = Arc::clone(&self.running);
        running.store(true, Ordering::Release);

        let channels = self.channels;
        let block_frames = self.block_frames;
        let step = TAU * self.frequency / self.sample_rate as f32;
        let amplitude = self.amplitude;
        let period = self.paced.then(|| self.block_period());
        let block_limit = self.block_limit;

        let handle = thread::Builder::new()
            .name("tone-source".into())
            .spawn(move || {
                let mut buffers = vec![vec![0f32; block_frames]; channels];
                let mut phase = 0f32;
                let mut blocks = 0u64;
                let mut next_block = Instant::now();

                while running.load(Ordering::Acquire) {
                    if block_limit.is_some_and(|limit| blocks >= limit) {
                        break;
                    }

                    for i in 0..block_frames {
                        let sample = amplitude * phase.sin();
                        for buffer in buffers.iter_mut() {
                            buffer[i] = sample;
                        }
                        phase = (phase + step) % TAU;
                    }

                    let mut slices: [&[f32]; MAX_CHANNELS] = [&[]; MAX_CHANNELS];
                    for (slot, buffer) in slices.iter_mut().zip(&buffers) {
                        *slot = buffer.as_slice();
                    }
                    callback.process(&FrameBlock::new(&slices[..channels], block_frames));
                    blocks += 1;

                    if let Some(period) = period {
                        next_block += period;
                        let now = Instant::now();
                        if next_block > now {
                            thread::sleep(next_block - now);
                        } else {
                            next_block = now;
                        }
                    }
                }
                log::debug!("Tone source delivered {} blocks", blocks);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::Release);
                BridgeError::ThreadSpawn(e.to_string())
            })?;

        self.handle = Some(handle);
        log::info!(
            "Tone source active: {} Hz sine, {} ch, {} frame blocks",
            self.frequency,
            self.channels,
            self.block_frames
        );
        Ok(())
    }

    fn deactivate(&mut self) -> Result<(), BridgeError> {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| BridgeError::ClientFailed("tone thread panicked".into()))?;
        }
        Ok(())
    }

    fn sample_rate(&self) -> Option<u32> {
        Some(self.sample_rate)
    }

    fn name(&self) -> &str {
        "tone"
    }

    fn info(&self) -> EndpointInfo {
        EndpointInfo::new(
            format!("tone:{}", self.frequency),
            "Sine generator",
            EndpointKind::Generator,
        )
    }
}

impl Drop for ToneSource {
    fn drop(&mut self) {
        let _ = self.deactivate();
    }
}
