//! Cooperative shutdown signal shared by long-running tasks
//!
//! A [`ShutdownHandle`] owns the sending side of a `watch` channel; any number
//! of cloned [`Shutdown`] receivers can race their work against it.

use tokio::sync::watch;

/// Create a connected handle/receiver pair
pub fn channel() -> (ShutdownHandle, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, Shutdown { rx: Some(rx) })
}

/// Sending side; triggering is idempotent
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Signal every receiver to stop
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Create another receiver bound to this handle
    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: Some(self.tx.subscribe()),
        }
    }
}

/// Receiving side of the shutdown signal
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: Option<watch::Receiver<bool>>,
}

impl Shutdown {
    /// A signal that never fires
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_triggered(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolve once shutdown has been triggered.
    ///
    /// Returns immediately if it already was. If the handle is dropped
    /// without triggering, nobody can stop us any more and this never resolves.
    pub async fn wait(&mut self) {
        match self.rx.as_mut() {
            Some(rx) => {
                let closed = rx.wait_for(|triggered| *triggered).await.is_err();
                if closed {
                    std::future::pending::<()>().await;
                }
            }
            None => std::future::pending::<()>().await,
        }
    }
}
