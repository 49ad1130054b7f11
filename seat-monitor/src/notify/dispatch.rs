//! Queued alert delivery.
//!
//! The polling loop hands messages to a bounded queue and moves on; a
//! background task drains the queue through a [`Notifier`]. A slow or
//! unreachable messaging API therefore delays alerts, not polls.

use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::Notifier;

/// Default queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Delivery counts reported when the dispatcher shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: usize,
    pub failed: usize,
}

/// Handle to the background delivery task.
pub struct AlertDispatcher {
    tx: mpsc::Sender<String>,
    worker: JoinHandle<DispatchStats>,
}

impl AlertDispatcher {
    /// Start a delivery task for `notifier`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<N>(notifier: N, capacity: usize) -> Self
    where
        N: Notifier + Send + Sync + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<String>(capacity.max(1));

        let worker = tokio::spawn(async move {
            let mut stats = DispatchStats::default();
            while let Some(message) = rx.recv().await {
                match notifier.send(&message).await {
                    Ok(destinations) => {
                        stats.delivered += 1;
                        debug!(destinations, "alert delivered");
                    }
                    Err(e) => {
                        stats.failed += 1;
                        error!(error = %e, "alert delivery failed");
                    }
                }
            }
            stats
        });

        Self { tx, worker }
    }

    /// Queue a message without waiting.
    ///
    /// Returns `false` if the message was dropped because the queue is full
    /// or the worker has stopped.
    pub fn dispatch(&self, message: String) -> bool {
        match self.tx.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("alert queue full, dropping message");
                false
            }
            Err(TrySendError::Closed(_)) => {
                error!("alert worker stopped, dropping message");
                false
            }
        }
    }

    /// Close the queue and wait up to `deadline` for queued messages to go out.
    pub async fn shutdown(self, deadline: Duration) -> Option<DispatchStats> {
        drop(self.tx);
        match tokio::time::timeout(deadline, self.worker).await {
            Ok(Ok(stats)) => Some(stats),
            Ok(Err(e)) => {
                error!(error = %e, "alert worker panicked");
                None
            }
            Err(_) => {
                warn!(?deadline, "timed out draining alert queue");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::notify::NotifyError;

    #[derive(Clone, Default)]
    struct Recorder {
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl Notifier for Recorder {
        async fn send(&self, message: &str) -> Result<usize, NotifyError> {
            self.sent.lock().unwrap().push(message.to_string());
            Ok(1)
        }
    }

    struct Failing;

    impl Notifier for Failing {
        async fn send(&self, _message: &str) -> Result<usize, NotifyError> {
            Err(NotifyError::Undelivered { attempted: 1 })
        }
    }

    struct Slow;

    impl Notifier for Slow {
        async fn send(&self, _message: &str) -> Result<usize, NotifyError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(1)
        }
    }

    #[tokio::test]
    async fn delivers_in_order() {
        let recorder = Recorder::default();
        let dispatcher = AlertDispatcher::spawn(recorder.clone(), 8);

        assert!(dispatcher.dispatch("one".into()));
        assert!(dispatcher.dispatch("two".into()));

        let stats = dispatcher.shutdown(Duration::from_secs(5)).await.unwrap();
        assert_eq!(stats, DispatchStats { delivered: 2, failed: 0 });
        assert_eq!(*recorder.sent.lock().unwrap(), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn failures_are_counted_not_raised() {
        let dispatcher = AlertDispatcher::spawn(Failing, 8);
        assert!(dispatcher.dispatch("one".into()));

        let stats = dispatcher.shutdown(Duration::from_secs(5)).await.unwrap();
        assert_eq!(stats, DispatchStats { delivered: 0, failed: 1 });
    }

    #[tokio::test]
    async fn full_queue_drops_without_blocking() {
        let dispatcher = AlertDispatcher::spawn(Slow, 1);

        // The worker may already hold the first message; either way the
        // queue overflows well before all of these fit.
        let queued = (0..10)
            .filter(|i| dispatcher.dispatch(format!("msg {i}")))
            .count();
        assert!(queued < 10);

        assert!(
            dispatcher
                .shutdown(Duration::from_millis(50))
                .await
                .is_none()
        );
    }
}
