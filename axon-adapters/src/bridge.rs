//! Bounded single-producer bridge between a push-style source and a
//! canonical pull-style stream.
//!
//! Some framework SDKs invoke a callback per chunk instead of exposing a
//! stream. The bridge gives such sources a sender handle; the consumer side
//! is an ordinary stream with backpressure from the bounded channel and a
//! per-item receive deadline.

use axon_core::{AxonError, Result};
use futures::Stream;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::mpsc;

/// Producer half of a [`bridge`] channel.
///
/// Dropping the sender (or letting it go out of scope in the producer task)
/// cleanly ends the stream.
#[derive(Debug)]
pub struct BridgeSender<T> {
    tx: mpsc::Sender<T>,
}

impl<T> BridgeSender<T> {
    /// Sends one item, awaiting channel capacity. Fails if the consumer has
    /// gone away.
    pub async fn send(&self, item: T) -> Result<()> {
        self.tx
            .send(item)
            .await
            .map_err(|_| AxonError::Adapter("bridge consumer dropped".to_string()))
    }

    /// Blocking variant for producers running outside the async runtime.
    pub fn send_blocking(&self, item: T) -> Result<()> {
        self.tx
            .blocking_send(item)
            .map_err(|_| AxonError::Adapter("bridge consumer dropped".to_string()))
    }
}

impl<T> Clone for BridgeSender<T> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

/// Creates a bounded bridge. The consumer stream yields items as they
/// arrive; if no item arrives within `recv_timeout` it yields
/// [`AxonError::Timeout`] and ends.
pub fn bridge<T: Send + 'static>(
    capacity: usize,
    recv_timeout: Duration,
) -> (BridgeSender<T>, Pin<Box<dyn Stream<Item = Result<T>> + Send>>) {
    let (tx, mut rx) = mpsc::channel(capacity);
    let stream = async_stream::stream! {
        loop {
            match tokio::time::timeout(recv_timeout, rx.recv()).await {
                Ok(Some(item)) => yield Ok(item),
                Ok(None) => return,
                Err(_) => {
                    yield Err(AxonError::Timeout(format!(
                        "no item received within {}ms",
                        recv_timeout.as_millis()
                    )));
                    return;
                }
            }
        }
    };
    (BridgeSender { tx }, Box::pin(stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_items_flow_and_drop_ends_stream() {
        let (tx, stream) = bridge::<u32>(4, Duration::from_secs(1));
        tokio::spawn(async move {
            for i in 0..3 {
                tx.send(i).await.unwrap();
            }
        });
        let items: Vec<_> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(items, vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_deadline_yields_timeout() {
        let (tx, mut stream) = bridge::<u32>(1, Duration::from_millis(50));
        // keep the sender alive but silent
        let item = stream.next().await.unwrap();
        assert!(matches!(item, Err(AxonError::Timeout(_))));
        assert!(stream.next().await.is_none());
        drop(tx);
    }

    #[tokio::test]
    async fn test_send_fails_after_consumer_drop() {
        let (tx, stream) = bridge::<u32>(1, Duration::from_secs(1));
        drop(stream);
        assert!(matches!(tx.send(1).await, Err(AxonError::Adapter(_))));
    }
}
