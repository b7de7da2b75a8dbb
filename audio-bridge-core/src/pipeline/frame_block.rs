/// Highest channel count a session accepts.
///
/// Bounds the producer's per-frame scratch space so it can live on the
/// realtime thread's stack.
pub const MAX_CHANNELS: usize = 8;

/// One realtime callback's worth of audio, borrowed from the host.
///
/// Non-interleaved: one slice per channel, each at least `frames()` long.
#[derive(Debug, Clone, Copy)]
pub struct FrameBlock<'a> {
    channels: &'a [&'a [f32]],
    frames: usize,
}

impl<'a> FrameBlock<'a> {
    /// Wrap per-channel slices; `frames` is clamped to the shortest slice.
    pub fn new(channels: &'a [&'a [f32]], frames: usize) -> Self {
        let shortest = channels.iter().map(|c| c.len()).min().unwrap_or(0);
        Self {
            channels,
            frames: frames.min(shortest),
        }
    }

    /// Wrap per-channel slices, using the shortest slice as the frame count.
    pub fn from_channels(channels: &'a [&'a [f32]]) -> Self {
        Self::new(channels, usize::MAX)
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Sample at (`channel`, `frame`); silence for a channel the host did not deliver.
    #[inline]
    pub fn sample(&self, channel: usize, frame: usize) -> f32 {
        match self.channels.get(channel) {
            Some(samples) if frame < self.frames => samples[frame],
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_clamped_to_shortest_channel() {
        let left = [0.1f32, 0.2, 0.3];
        let right = [0.4f32, 0.5];
        let channels: [&[f32]; 2] = [&left, &right];

        let block = FrameBlock::new(&channels, 16);
        assert_eq!(block.frames(), 2);
        assert_eq!(block.channel_count(), 2);
        assert_eq!(block.sample(1, 1), 0.5);
    }

    #[test]
    fn missing_channel_is_silence() {
        let mono = [0.7f32, 0.8];
        let channels: [&[f32]; 1] = [&mono];

        let block = FrameBlock::from_channels(&channels);
        assert_eq!(block.frames(), 2);
        assert_eq!(block.sample(0, 1), 0.8);
        assert_eq!(block.sample(1, 1), 0.0);
        assert_eq!(block.sample(0, 5), 0.0);
    }

    #[test]
    fn empty_block() {
        let block = FrameBlock::from_channels(&[]);
        assert_eq!(block.frames(), 0);
    }
}
