//! Event-driven input: a background thread owns the key event service,
//! reduces each key edge to a `Command`, and publishes it on a bounded
//! channel. The run loop is the only consumer.
//!
//! Safety: each `EventListener` spawns exactly one thread that is shut down
//! and joined when the listener is finished or dropped, so the service (and
//! whatever terminal mode it holds) is always released.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use teleop_traits::KeyEventService;

use crate::bindings::{Bindings, Command};
use crate::error::{Result, TeleopError};
use crate::hw_error::{Seam, map_hw_error};
use crate::input::{InputSource, Poll};

/// Bound on a single wait inside the service, so the thread notices shutdown.
pub const SERVICE_WAIT: Duration = Duration::from_millis(50);

pub struct EventListener {
    rx: xch::Receiver<Command>,
    /// Shutdown flag for immediate response (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    /// Join handle; yields the service's close() outcome
    join_handle: Option<std::thread::JoinHandle<Option<TeleopError>>>,
}

impl EventListener {
    pub fn spawn<S: KeyEventService + Send + 'static>(
        mut service: S,
        bindings: Bindings,
        capacity: usize,
    ) -> Self {
        let (tx, rx) = xch::bounded(capacity.max(1));
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("listener thread received shutdown signal");
                    break;
                }

                match service.next_edge(SERVICE_WAIT) {
                    Ok(Some(edge)) => {
                        let Some(cmd) = bindings.on_edge(edge) else {
                            continue;
                        };
                        tracing::debug!(?edge, ?cmd, "key event");
                        // Blocks while the queue is full; the consumer drains
                        // it every tick.
                        if tx.send(cmd).is_err() {
                            tracing::debug!("listener consumer disconnected, exiting thread");
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "key event service ended");
                        break;
                    }
                }
            }
            let closed = service
                .close()
                .err()
                .map(|e| map_hw_error(Seam::Terminal, e.as_ref()));
            tracing::trace!("listener thread exiting cleanly");
            closed
        });

        Self {
            rx,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    fn join(&mut self) -> Option<TeleopError> {
        self.shutdown.store(true, Ordering::Relaxed);
        // Unblock a pending send; after this the thread sends at most once
        // more before it sees the flag, and that send fits.
        while self.rx.try_recv().is_ok() {}
        let handle = self.join_handle.take()?;
        match handle.join() {
            Ok(closed) => {
                tracing::trace!("listener thread joined successfully");
                closed
            }
            Err(e) => {
                tracing::warn!(?e, "listener thread panicked during shutdown");
                Some(TeleopError::Input("listener thread panicked".into()))
            }
        }
    }
}

impl InputSource for EventListener {
    fn poll_next(&mut self, timeout: Duration) -> Result<Poll> {
        match self.rx.recv_timeout(timeout) {
            Ok(cmd) => Ok(Poll::Command(cmd)),
            Err(xch::RecvTimeoutError::Timeout) => Ok(Poll::Idle),
            Err(xch::RecvTimeoutError::Disconnected) => Ok(Poll::Closed),
        }
    }

    fn finish(&mut self) -> Result<()> {
        match self.join() {
            None => Ok(()),
            Some(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "events"
    }

    fn supports_strafe(&self) -> bool {
        false
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        // Exits after the current bounded wait (at most SERVICE_WAIT).
        if let Some(e) = self.join() {
            tracing::error!(error = %e, "input backend failed to release");
        }
    }
}
