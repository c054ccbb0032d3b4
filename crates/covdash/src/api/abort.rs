//! Cooperative request cancellation.
//!
//! An [`AbortController`] is owned by whoever scopes a request's lifetime
//! (a query observer, a CLI command). Dropping the controller or calling
//! [`AbortController::abort`] fires every [`AbortSignal`] handed out from it.

use tokio::sync::watch;

/// Owner side of an abort signal.
#[derive(Debug)]
pub struct AbortController {
    tx: watch::Sender<bool>,
}

impl AbortController {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// A signal tied to this controller's lifetime.
    #[must_use]
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: self.tx.subscribe(),
        }
    }

    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of an abort signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    /// True once aborted or once the controller has been dropped.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves when the signal fires.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        // An Err means the controller is gone, which counts as aborted.
        let _ = rx.wait_for(|aborted| *aborted).await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn signal_reflects_abort() {
        let controller = AbortController::new();
        let signal = controller.signal();
        assert!(!signal.is_aborted());

        controller.abort();
        assert!(signal.is_aborted());
        assert!(controller.is_aborted());
    }

    #[test]
    fn dropping_controller_aborts_signal() {
        let controller = AbortController::new();
        let signal = controller.signal();
        drop(controller);
        assert!(signal.is_aborted());
    }

    #[tokio::test]
    async fn aborted_future_resolves_after_abort() {
        let controller = AbortController::new();
        let signal = controller.signal();

        let waiter = tokio::spawn(async move { signal.aborted().await });
        controller.abort();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("abort should wake the waiter")
            .expect("waiter task should not panic");
    }
}
