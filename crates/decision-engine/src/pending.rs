//! Cancellation for a scheduled alert confirmation

use tokio::sync::watch;

/// Owner side: cancels the confirmation
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Task side: resolves once cancelled
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

/// Create a linked handle and token
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

impl CancelHandle {
    /// Cancel; returns whether this call did it. Repeated calls are no-ops.
    pub fn cancel(&self) -> bool {
        !self.tx.send_replace(true)
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for cancellation. Never resolves if the handle is dropped
    /// without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout, Duration};

    #[test]
    fn test_cancel_is_idempotent() {
        let (handle, token) = cancel_pair();
        assert!(!token.is_cancelled());
        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(handle.is_cancelled());
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_wakes_on_cancel() {
        let (handle, mut token) = cancel_pair();
        let waiter = tokio::spawn(async move { token.cancelled().await });

        sleep(Duration::from_millis(100)).await;
        handle.cancel();
        assert!(timeout(Duration::from_millis(10), waiter).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_never_cancels() {
        let (handle, mut token) = cancel_pair();
        drop(handle);
        assert!(timeout(Duration::from_millis(500), token.cancelled()).await.is_err());
    }
}
