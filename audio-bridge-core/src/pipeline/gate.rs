//! Producer → consumer wakeup signaling.
//!
//! The gate carries no audio. It only tells the consumer that data may have
//! arrived. The consumer holds the gate's lock for its whole drain loop and
//! releases it only while blocked in [`GateGuard::wait_for_data`]; the
//! producer never blocks on it, it only *tries* the lock.
//!
//! A failed [`SynchronizationGate::try_signal`] loses nothing: it means the
//! consumer is mid-drain, and the consumer re-checks the ring buffer before
//! every wait. A failed [`SynchronizationGate::try_close`] is covered the
//! same way because the consumer's waits are bounded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};

/// Why [`GateGuard::wait_for_data`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Signaled,
    Closed,
}

/// Mutex + condition variable pair used only for signaling.
#[derive(Debug, Default)]
pub struct SynchronizationGate {
    /// "Data became available since the last wait."
    data_ready: Mutex<bool>,
    condvar: Condvar,
    closed: AtomicBool,
}

impl SynchronizationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumer side: take the gate's lock, blocking until it is free.
    pub fn enter(&self) -> GateGuard<'_> {
        GateGuard {
            gate: self,
            data_ready: self.data_ready.lock(),
        }
    }

    /// Producer side: signal the consumer if the lock is free right now.
    ///
    /// Never blocks. Returns `false` when the consumer holds the lock.
    #[inline]
    pub fn try_signal(&self) -> bool {
        match self.data_ready.try_lock() {
            Some(mut data_ready) => {
                *data_ready = true;
                self.condvar.notify_one();
                true
            }
            None => false,
        }
    }

    /// Latch the gate closed and wake the consumer if the lock is free.
    ///
    /// Never blocks. When the consumer holds the lock the wakeup is
    /// skipped; it sees the latch at its next bounded wait.
    pub fn try_close(&self) -> bool {
        self.closed.store(true, Ordering::Release);
        match self.data_ready.try_lock() {
            Some(_data_ready) => {
                self.condvar.notify_all();
                true
            }
            None => false,
        }
    }

    /// Teardown side: latch the gate closed and wake a waiting consumer.
    ///
    /// Waits at most `timeout` for the lock. Returns `false` if the consumer
    /// kept it (it is draining and will observe the shutdown flag itself).
    pub fn close(&self, timeout: Duration) -> bool {
        self.closed.store(true, Ordering::Release);
        match self.data_ready.try_lock_for(timeout) {
            Some(_data_ready) => {
                self.condvar.notify_all();
                true
            }
            None => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// The consumer's hold on the gate. Dropping it releases the lock.
pub struct GateGuard<'a> {
    gate: &'a SynchronizationGate,
    data_ready: MutexGuard<'a, bool>,
}

impl GateGuard<'_> {
    /// Release the lock, block until signaled, closed, or `timeout`
    /// elapses, then re-acquire. Returns `None` when nothing happened, in
    /// which case the caller re-checks its own state and waits again.
    pub fn wait_for_data(&mut self, timeout: Duration) -> Option<WaitOutcome> {
        if let Some(outcome) = self.take_wakeup() {
            return Some(outcome);
        }
        self.gate.condvar.wait_for(&mut self.data_ready, timeout);
        self.take_wakeup()
    }

    fn take_wakeup(&mut self) -> Option<WaitOutcome> {
        if self.gate.is_closed() {
            return Some(WaitOutcome::Closed);
        }
        if *self.data_ready {
            *self.data_ready = false;
            return Some(WaitOutcome::Signaled);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    const LONG: Duration = Duration::from_secs(10);

    #[test]
    fn try_signal_fails_while_consumer_holds_lock() {
        let gate = SynchronizationGate::new();
        let guard = gate.enter();
        assert!(!gate.try_signal());
        drop(guard);
        assert!(gate.try_signal());
    }

    #[test]
    fn pending_signal_returns_immediately() {
        let gate = SynchronizationGate::new();
        assert!(gate.try_signal());

        let mut guard = gate.enter();
        assert_eq!(guard.wait_for_data(LONG), Some(WaitOutcome::Signaled));
        // consumed; a second wait times out
        assert_eq!(guard.wait_for_data(Duration::from_millis(10)), None);
    }

    #[test]
    fn signal_wakes_waiting_consumer() {
        let gate = Arc::new(SynchronizationGate::new());
        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.enter().wait_for_data(LONG))
        };

        // try until the waiter has released the lock inside wait
        let start = Instant::now();
        while !gate.try_signal() {
            assert!(start.elapsed() < Duration::from_secs(5));
            thread::yield_now();
        }
        assert_eq!(waiter.join().unwrap(), Some(WaitOutcome::Signaled));
    }

    #[test]
    fn close_wakes_waiting_consumer() {
        let gate = Arc::new(SynchronizationGate::new());
        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.enter().wait_for_data(LONG))
        };

        thread::sleep(Duration::from_millis(20));
        assert!(gate.close(Duration::from_secs(1)));
        assert_eq!(waiter.join().unwrap(), Some(WaitOutcome::Closed));
        assert!(gate.is_closed());
    }

    #[test]
    fn try_close_never_waits_for_the_holder() {
        let gate = SynchronizationGate::new();
        let mut guard = gate.enter();

        let start = Instant::now();
        assert!(!gate.try_close());
        assert!(start.elapsed() < Duration::from_millis(50));

        assert_eq!(
            guard.wait_for_data(Duration::from_millis(10)),
            Some(WaitOutcome::Closed)
        );
    }

    #[test]
    fn try_close_wakes_waiting_consumer() {
        let gate = Arc::new(SynchronizationGate::new());
        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.enter().wait_for_data(LONG))
        };

        let start = Instant::now();
        while !gate.try_close() {
            assert!(start.elapsed() < Duration::from_secs(5));
            thread::yield_now();
        }
        assert_eq!(waiter.join().unwrap(), Some(WaitOutcome::Closed));
    }

    #[test]
    fn close_times_out_while_lock_is_held() {
        let gate = SynchronizationGate::new();
        let mut guard = gate.enter();
        assert!(!gate.close(Duration::from_millis(10)));
        // the closed latch is still visible to the holder
        assert_eq!(guard.wait_for_data(LONG), Some(WaitOutcome::Closed));
    }
}
