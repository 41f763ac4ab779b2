//! # Shutdown
//!
//! Interruptible waits for the control loop.
//!
//! Every wait in the controller (scan retry, inter-update delay, cycle
//! interval) goes through [`Shutdown::sleep`] so a termination signal never
//! has to wait out a backoff window.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Sending half, held by the signal handler
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Request shutdown. Pending and future waits return immediately.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiving half, passed to every component that waits
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    #[must_use]
    pub fn channel() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Shutdown { rx })
    }

    #[must_use]
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Sleep for `duration` unless shutdown is requested first
    ///
    /// Returns `true` if the full duration elapsed, `false` if the wait was
    /// cut short by shutdown.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if *self.rx.borrow_and_update() {
                return false;
            }
            tokio::select! {
                () = tokio::time::sleep_until(deadline) => return true,
                changed = self.rx.changed() => {
                    if changed.is_err() {
                        // Trigger dropped: shutdown can no longer be requested
                        tokio::time::sleep_until(deadline).await;
                        return true;
                    }
                }
            }
        }
    }
}
