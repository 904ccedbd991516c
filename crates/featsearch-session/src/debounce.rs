//! Query debouncer: one delayed message per burst of input.
//!
//! [`Debouncer::schedule`] cancels the previously scheduled message (a real
//! timer cancellation, not a flag) and starts a new delay. Only the message
//! of the last call in a burst is delivered. Receivers should still check the
//! message's tag: a tick already queued when `cancel` runs is not recalled.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<CancellationToken>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Deliver `msg` on `tx` after the delay unless superseded or cancelled.
    pub fn schedule<M: Send + 'static>(&mut self, tx: &mpsc::UnboundedSender<M>, msg: M) {
        self.cancel();
        let token = CancellationToken::new();
        self.pending = Some(token.clone());

        let tx = tx.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(msg);
                }
            }
        });
    }

    /// Cancel the scheduled message, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
