//! Point-to-point message queue.
//!
//! Carries partial task output to the engine. Backed by flume.

use std::sync::Arc;

/// MPMC queue where every message is consumed by exactly one receiver.
#[derive(Debug)]
pub struct Queue<T> {
    receiver: flume::Receiver<T>,
    sender: flume::Sender<T>,
}

impl<T> Queue<T> {
    /// create a new unbounded queue
    pub fn unbounded() -> Arc<Self> {
        let (tx, rx) = flume::unbounded();

        Arc::new(Self {
            receiver: rx,
            sender: tx,
        })
    }

    /// a sending handle that can outlive the queue
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// take a message if one is waiting
    pub fn try_next(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// receive a message from the queue asynchronously
    pub async fn next_async(&self) -> Option<T> {
        self.receiver.recv_async().await.ok()
    }
}
