//! Cooperative cancellation shared between a run and its probes

use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable flag that stops a run once raised
///
/// Raising it is idempotent. Futures awaiting [`CancellationHandle::cancelled`]
/// wake up immediately, so in-flight probes raced against it are dropped.
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl CancellationHandle {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once the handle is cancelled
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            // Sender gone without cancelling: never resolve.
            std::future::pending::<()>().await;
        }
    }
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_waiters() {
        let handle = CancellationHandle::new();
        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });

        assert!(!handle.is_cancelled());
        handle.cancel();
        assert!(handle.is_cancelled());
        tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_already_cancelled_resolves_immediately() {
        let handle = CancellationHandle::new();
        handle.cancel();
        handle.cancel();
        tokio::time::timeout(Duration::from_millis(100), handle.cancelled()).await.unwrap();
    }

    #[tokio::test]
    async fn test_uncancelled_stays_pending() {
        let handle = CancellationHandle::new();
        let waited = tokio::time::timeout(Duration::from_millis(50), handle.cancelled()).await;
        assert!(waited.is_err());
    }

    #[test]
    fn test_waiter_is_woken_by_cancel() {
        let handle = CancellationHandle::new();
        let mut waiting = tokio_test::task::spawn(handle.cancelled());

        tokio_test::assert_pending!(waiting.poll());
        handle.cancel();
        assert!(waiting.is_woken());
        tokio_test::assert_ready!(waiting.poll());
    }
}
