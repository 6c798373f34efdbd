//! Broadcast queue for one-to-many event distribution.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{FlowCanvasError, Result};

/// Every subscriber receives every message sent after it subscribed.
/// Backed by tokio's broadcast channel; slow subscribers observe `Lagged`.
#[derive(Clone)]
pub struct BroadcastQueue<T> {
    sender: Arc<broadcast::Sender<T>>,
}

impl<T: Clone> BroadcastQueue<T> {
    /// create a new broadcast queue
    pub fn new(cap: usize) -> Arc<Self> {
        let (tx, _) = broadcast::channel(cap);

        Arc::new(Self {
            sender: Arc::new(tx),
        })
    }

    /// send a message to the queue, failing when nobody is subscribed
    pub fn send(
        &self,
        msg: T,
    ) -> Result<usize> {
        self.sender.send(msg).map_err(|e| FlowCanvasError::Queue(e.to_string()))
    }

    /// subscribe to the queue
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_without_subscribers_fails() {
        let queue = BroadcastQueue::<u8>::new(4);
        assert!(queue.send(1).is_err());
    }

    #[test]
    fn test_all_subscribers_receive() {
        let queue = BroadcastQueue::<u8>::new(4);
        let mut a = queue.subscribe();
        let mut b = queue.subscribe();
        assert_eq!(queue.send(7).unwrap(), 2);
        assert_eq!(a.try_recv().unwrap(), 7);
        assert_eq!(b.try_recv().unwrap(), 7);
    }
}
