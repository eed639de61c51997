//! One-shot cancellation signal shared between the engine and its tasks.

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable shutdown signal.
///
/// Once `shutdown` has been called every current and future `wait`
/// resolves immediately.
#[derive(Clone, Debug)]
pub struct Shutdown {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            sender: Arc::new(tx),
        }
    }

    /// Fire the signal. Calling it more than once is harmless.
    pub fn shutdown(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_terminated(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once the signal has fired.
    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.sender.subscribe();
        async move {
            // the sender lives in `self`, so `wait_for` only errors if every clone is gone
            let _ = rx.wait_for(|terminated| *terminated).await;
        }
    }
}
