//! Single-producer / single-consumer sample queue between the realtime
//! callback and the drain thread.
//!
//! Wraps `ringbuf::HeapRb<f32>`. The ring is allocated once, then split
//! into a [`RingProducer`] for the realtime callback and a
//! [`RingConsumer`] for the drain thread. Neither half is `Clone`, so at
//! most one writer and one reader exist.

use ringbuf::traits::{Consumer as _, Observer as _, Producer as _, Split as _};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::models::error::BridgeError;

/// Fixed-capacity queue of interleaved `f32` samples.
pub struct RingBuffer {
    inner: HeapRb<f32>,
}

impl RingBuffer {
    /// Allocate a ring holding `capacity` samples.
    pub fn new(capacity: usize) -> Result<Self, BridgeError> {
        if capacity == 0 {
            return Err(BridgeError::ConfigurationFailed(
                "ring capacity must be positive".into(),
            ));
        }
        Ok(Self {
            inner: HeapRb::new(capacity),
        })
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity().get()
    }

    /// Split into the writing and reading halves.
    pub fn split(self) -> (RingProducer, RingConsumer) {
        let (producer, consumer) = self.inner.split();
        (
            RingProducer { inner: producer },
            RingConsumer { inner: consumer },
        )
    }
}

/// Writing half. Never blocks and never allocates.
pub struct RingProducer {
    inner: HeapProd<f32>,
}

impl RingProducer {
    /// Free sample slots. Only grows concurrently (the reader frees space).
    pub fn available_to_write(&self) -> usize {
        self.inner.vacant_len()
    }

    /// Queue as many of `samples` as fit. Returns the count written;
    /// the rest was not queued.
    pub fn try_write(&mut self, samples: &[f32]) -> usize {
        self.inner.push_slice(samples)
    }

    /// Queue all of `samples` or nothing.
    pub fn try_write_exact(&mut self, samples: &[f32]) -> bool {
        if samples.is_empty() || samples.len() > self.available_to_write() {
            return false;
        }
        // free space only grows, so the whole slice fits
        self.try_write(samples) == samples.len()
    }
}

/// Reading half.
pub struct RingConsumer {
    inner: HeapCons<f32>,
}

impl RingConsumer {
    /// Queued samples. Only grows concurrently (the writer adds data).
    pub fn available_to_read(&self) -> usize {
        self.inner.occupied_len()
    }

    /// Pop up to `out.len()` samples in FIFO order. Returns the count read.
    pub fn read(&mut self, out: &mut [f32]) -> usize {
        self.inner.pop_slice(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn ring(capacity: usize) -> (RingProducer, RingConsumer) {
        RingBuffer::new(capacity).unwrap().split()
    }

    #[test]
    fn whole_capacity_is_usable() {
        let (mut tx, rx) = ring(4);
        assert_eq!(tx.available_to_write(), 4);
        assert!(tx.try_write_exact(&[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(tx.available_to_write(), 0);
        assert_eq!(rx.available_to_read(), 4);
    }

    #[test]
    fn try_write_reports_the_shortfall() {
        let (mut tx, mut rx) = ring(4);
        assert_eq!(tx.try_write(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]), 4);
        assert_eq!(tx.try_write(&[7.0]), 0);

        let mut out = [0.0f32; 4];
        assert_eq!(rx.read(&mut out), 4);
        assert_eq!(out, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn write_exact_is_all_or_nothing() {
        let (mut tx, mut rx) = ring(8);
        assert!(tx.try_write_exact(&[1.0; 6]));
        assert!(!tx.try_write_exact(&[2.0; 4]));
        assert_eq!(rx.available_to_read(), 6);
        assert!(tx.try_write_exact(&[3.0, 3.0]));
        assert!(!tx.try_write_exact(&[]));

        let mut out = [0.0f32; 8];
        assert_eq!(rx.read(&mut out), 8);
        assert_eq!(out, [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 3.0, 3.0]);
    }

    #[test]
    fn wraparound_keeps_order() {
        let (mut tx, mut rx) = ring(4);
        assert!(tx.try_write_exact(&[1.0, 2.0, 3.0]));

        let mut out = [0.0f32; 2];
        assert_eq!(rx.read(&mut out), 2);

        assert!(tx.try_write_exact(&[4.0, 5.0, 6.0]));

        let mut out = [0.0f32; 4];
        assert_eq!(rx.read(&mut out), 4);
        assert_eq!(out, [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn read_returns_what_is_queued() {
        let (mut tx, mut rx) = ring(8);
        assert!(tx.try_write_exact(&[0.5; 3]));

        let mut out = [0.0f32; 8];
        assert_eq!(rx.read(&mut out), 3);
        assert_eq!(rx.available_to_read(), 0);
    }

    #[test]
    fn rejects_zero_capacity() {
        assert!(RingBuffer::new(0).is_err());
        assert_eq!(RingBuffer::new(12).unwrap().capacity(), 12);
    }

    #[test]
    fn concurrent_frames_arrive_whole_and_in_order() {
        const FRAMES: u32 = 100_000;
        let (mut tx, mut rx) = ring(64 * 2);

        let writer = thread::spawn(move || {
            let mut next = 0u32;
            while next < FRAMES {
                let value = next as f32;
                if tx.try_write_exact(&[value, -value]) {
                    next += 1;
                } else {
                    thread::yield_now();
                }
            }
        });

        let mut expected = 0u32;
        let mut buf = [0.0f32; 32];
        while expected < FRAMES {
            let n = rx.read(&mut buf);
            assert_eq!(n % 2, 0);
            for frame in buf[..n].chunks_exact(2) {
                assert_eq!(frame, [expected as f32, -(expected as f32)]);
                expected += 1;
            }
            if n == 0 {
                thread::yield_now();
            }
        }

        writer.join().unwrap();
        assert_eq!(rx.available_to_read(), 0);
    }
}
