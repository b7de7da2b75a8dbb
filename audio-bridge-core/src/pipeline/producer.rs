use std::sync::Arc;

use super::frame_block::{FrameBlock, MAX_CHANNELS};
use super::shared::PipelineShared;
use crate::processing::ring_buffer::RingProducer;

/// What one `process` call did. Plain counters, no allocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockOutcome {
    /// The block was ignored because the pipeline is not streaming.
    pub skipped: bool,
    pub samples_queued: u64,
    pub samples_dropped: u64,
    /// The consumer was signaled (the gate's lock was free).
    pub signaled: bool,
}

/// Realtime-side half of the pipeline.
///
/// Handed to a [`FrameSource`](crate::traits::frame_source::FrameSource)
/// and invoked on the host's realtime thread once per block. `process`
/// never blocks, allocates, or touches the output device.
pub struct ProducerCallback {
    ring: RingProducer,
    shared: Arc<PipelineShared>,
    channels: usize,
}

impl ProducerCallback {
    pub(crate) fn new(ring: RingProducer, shared: Arc<PipelineShared>, channels: usize) -> Self {
        debug_assert!(channels > 0 && channels <= MAX_CHANNELS);
        Self {
            ring,
            shared,
            channels,
        }
    }

    /// Interleaved channel count this callback queues per frame.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Queue one host block, interleaving it frame by frame.
    ///
    /// A frame that does not fit is dropped whole and counted as one overrun
    /// per sample. After the block the consumer is signaled if the gate's
    /// lock happens to be free.
    pub fn process(&mut self, block: &FrameBlock<'_>) -> BlockOutcome {
        if !self.shared.flags.is_streaming() {
            return BlockOutcome {
                skipped: true,
                ..BlockOutcome::default()
            };
        }

        let mut frame = [0f32; MAX_CHANNELS];
        let frame = &mut frame[..self.channels];
        let mut queued = 0u64;
        let mut dropped = 0u64;

        for i in 0..block.frames() {
            for (ch, slot) in frame.iter_mut().enumerate() {
                *slot = block.sample(ch, i);
            }

            if self.ring.try_write_exact(frame) {
                queued += self.channels as u64;
            } else {
                dropped += self.channels as u64;
            }
        }

        self.shared.add_produced(queued + dropped);
        self.shared.overruns.record(dropped);

        BlockOutcome {
            skipped: false,
            samples_queued: queued,
            samples_dropped: dropped,
            signaled: self.shared.gate.try_signal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::ring_buffer::{RingBuffer, RingConsumer};

    fn producer(
        ring_frames: usize,
        channels: usize,
    ) -> (ProducerCallback, RingConsumer, Arc<PipelineShared>) {
        let (tx, rx) = RingBuffer::new(ring_frames * channels).unwrap().split();
        let shared = Arc::new(PipelineShared::new());
        (ProducerCallback::new(tx, Arc::clone(&shared), channels), rx, shared)
    }

    fn ramp(frames: usize, offset: f32) -> Vec<f32> {
        (0..frames).map(|i| offset + i as f32).collect()
    }

    #[test]
    fn not_ready_is_a_no_op() {
        let (mut cb, rx, shared) = producer(4, 2);
        let left = ramp(2, 0.0);
        let right = ramp(2, 100.0);
        let channels: [&[f32]; 2] = [&left, &right];

        let outcome = cb.process(&FrameBlock::from_channels(&channels));
        assert!(outcome.skipped);
        assert_eq!(rx.available_to_read(), 0);

        // capture alone is not enough
        shared.flags.latch_capture();
        assert!(cb.process(&FrameBlock::from_channels(&channels)).skipped);
        assert_eq!(shared.samples_produced(), 0);
    }

    #[test]
    fn interleaves_channels() {
        let (mut cb, mut rx, shared) = producer(4, 2);
        shared.flags.latch_capture();
        shared.flags.latch_process();

        let left = [0.1f32, 0.2];
        let right = [-0.1f32, -0.2];
        let channels: [&[f32]; 2] = [&left, &right];
        let outcome = cb.process(&FrameBlock::from_channels(&channels));
        assert_eq!(outcome.samples_queued, 4);
        assert!(outcome.signaled);

        let mut samples = [0f32; 4];
        assert_eq!(rx.read(&mut samples), 4);
        assert_eq!(samples, [0.1, -0.1, 0.2, -0.2]);
    }

    #[test]
    fn full_ring_drops_whole_frames() {
        let (mut cb, rx, shared) = producer(3, 2);
        shared.flags.latch_capture();
        shared.flags.latch_process();

        let left = ramp(5, 0.0);
        let right = ramp(5, 10.0);
        let channels: [&[f32]; 2] = [&left, &right];
        let outcome = cb.process(&FrameBlock::from_channels(&channels));

        assert_eq!(outcome.samples_queued, 6);
        assert_eq!(outcome.samples_dropped, 4);
        assert_eq!(shared.overruns.total(), 4);
        assert_eq!(shared.samples_produced(), 10);
        assert_eq!(rx.available_to_read(), 6);
    }

    #[test]
    fn signal_skipped_while_consumer_drains() {
        let (mut cb, _rx, shared) = producer(4, 1);
        shared.flags.latch_capture();
        shared.flags.latch_process();

        let mono = ramp(2, 0.0);
        let channels: [&[f32]; 1] = [&mono];

        let guard = shared.gate.enter();
        let outcome = cb.process(&FrameBlock::from_channels(&channels));
        assert!(!outcome.signaled);
        assert_eq!(outcome.samples_queued, 2);
        drop(guard);
    }

    #[test]
    fn stopped_pipeline_ignores_blocks() {
        let (mut cb, rx, shared) = producer(4, 1);
        shared.flags.latch_capture();
        shared.flags.latch_process();
        shared.flags.latch_stopped();

        let mono = ramp(2, 0.0);
        let channels: [&[f32]; 1] = [&mono];
        assert!(cb.process(&FrameBlock::from_channels(&channels)).skipped);
        assert_eq!(rx.available_to_read(), 0);
        assert_eq!(shared.overruns.total(), 0);
    }

    #[test]
    fn missing_channels_are_padded_with_silence() {
        let (mut cb, mut rx, shared) = producer(4, 2);
        shared.flags.latch_capture();
        shared.flags.latch_process();

        let mono = [0.5f32];
        let channels: [&[f32]; 1] = [&mono];
        cb.process(&FrameBlock::from_channels(&channels));

        let mut samples = [1f32; 2];
        assert_eq!(rx.read(&mut samples), 2);
        assert_eq!(samples, [0.5, 0.0]);
    }
}
