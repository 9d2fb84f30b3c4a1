//! Per-call deadline and cancellation.

use crate::{Error, Result, StoreError};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Bounds the latency of a single cache operation.
///
/// A context is cheap to clone and is threaded through every store request
/// made on behalf of one `find`, `save`, or bucket validation. The cancel
/// signal follows the same `watch::Receiver<bool>` convention used for
/// shutdown elsewhere: the call is abandoned once the value becomes `true`.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

impl CallContext {
    /// Context with no deadline and no cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Abandon the call once `timeout` has elapsed from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Abandon the call at `deadline`. An earlier deadline already set wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// Abandon the call when `cancel` turns `true`.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Drive a store request for `key`, racing it against the deadline and
    /// the cancel signal.
    ///
    /// The outer error is `Timeout` or `Cancelled`; the inner result is the
    /// store's own outcome. A request that loses the race is dropped.
    pub async fn run<F, T>(
        &self,
        key: &str,
        request: F,
    ) -> Result<std::result::Result<T, StoreError>>
    where
        F: Future<Output = std::result::Result<T, StoreError>>,
    {
        let started = Instant::now();

        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        let cancelled = async {
            match self.cancel.clone() {
                Some(mut rx) => loop {
                    if *rx.borrow_and_update() {
                        return;
                    }
                    // Sender gone: the signal can never fire.
                    if rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                },
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(Error::Cancelled { key: key.to_string() }),
            _ = deadline => Err(Error::Timeout {
                key: key.to_string(),
                after: started.elapsed(),
            }),
            outcome = request => Ok(outcome),
        }
    }
}
