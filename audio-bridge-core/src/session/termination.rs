use std::sync::Arc;

use crate::models::run_report::TerminationReason;
use crate::pipeline::shared::PipelineShared;

/// Cloneable trigger for stopping a session from any thread.
///
/// Handed to frame sources (host shutdown) and signal handlers.
/// Terminating never blocks: it latches the shutdown flag and tries once to
/// wake a waiting consumer. A consumer that is mid-drain, or that holds the
/// gate at that instant, sees the flag before its next write or within its
/// next bounded wait.
#[derive(Debug, Clone)]
pub struct TerminationHandle {
    shared: Arc<PipelineShared>,
}

impl TerminationHandle {
    pub(crate) fn new(shared: Arc<PipelineShared>) -> Self {
        Self { shared }
    }

    /// Request termination. Returns `false` if it was already requested;
    /// the first reason wins.
    pub fn terminate(&self, reason: TerminationReason) -> bool {
        let first = self.shared.request_termination(reason);
        self.shared.gate.try_close();
        first
    }

    pub fn is_terminated(&self) -> bool {
        self.shared.is_shutdown()
    }

    pub fn reason(&self) -> Option<TerminationReason> {
        self.shared.termination()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn first_reason_wins() {
        let shared = Arc::new(PipelineShared::new());
        let handle = TerminationHandle::new(Arc::clone(&shared));
        let other = handle.clone();

        assert!(!handle.is_terminated());
        assert!(handle.terminate(TerminationReason::HostShutdown));
        assert!(!other.terminate(TerminationReason::Signal));

        assert_eq!(other.reason(), Some(TerminationReason::HostShutdown));
        assert!(shared.gate.is_closed());
        assert!(shared.flags.is_stopped());
    }

    #[test]
    fn terminate_returns_while_consumer_holds_the_gate() {
        let shared = Arc::new(PipelineShared::new());
        let handle = TerminationHandle::new(Arc::clone(&shared));

        let (held_tx, held_rx) = crossbeam_channel::bounded(1);
        let holder = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let _guard = shared.gate.enter();
                held_tx.send(()).unwrap();
                // a slow device write
                thread::sleep(Duration::from_millis(500));
            })
        };
        held_rx.recv().unwrap();

        let start = Instant::now();
        assert!(handle.terminate(TerminationReason::HostShutdown));
        assert!(start.elapsed() < Duration::from_millis(100));
        assert!(handle.is_terminated());

        holder.join().unwrap();
    }
}
