//! Per-runtime broker with "replay-last" subscribe.
//!
//! Grounded on the Design Notes' "Per-runtime broker with `subscribe
//! (replay_fn)`" pattern and the teacher's `common/src/futures/select_all.rs`
//! stream-combinator idiom, reimplemented over `tokio::sync::broadcast`
//! instead of the teacher's `futures` 0.1 executor. The replay callback
//! runs while holding the broker's lock, so it must stay O(1): it may push
//! at most one buffered item before the live subscription starts.
use std::sync::Mutex;

use tokio::sync::broadcast;

/// Broadcasts values of type `T` to many subscribers, replaying the most
/// recent value (if any) to each new subscriber before live updates.
///
/// Slow consumers are dropped rather than buffered unboundedly: the
/// underlying channel has a bounded capacity and a lagging receiver's
/// stream resumes from the oldest value still in the buffer, which for a
/// round-keyed stream is equivalent to "catch up via replay before the
/// round currently at the tip" and never blocks the publisher.
pub struct Broker<T: Clone + Send + 'static> {
    sender: broadcast::Sender<T>,
    last: Mutex<Option<T>>,
}

impl<T: Clone + Send + 'static> Broker<T> {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Broker {
            sender,
            last: Mutex::new(None),
        }
    }

    /// Publish a new value. Also recorded as the replay value for any
    /// subscriber that arrives after this call.
    pub fn publish(&self, value: T) {
        let mut last = self.last.lock().unwrap();
        *last = Some(value.clone());
        drop(last);
        // No active subscribers is not an error: the broker just has no one
        // to notify yet, and the next subscriber still gets the replay.
        let _ = self.sender.send(value);
    }

    /// Subscribe, receiving the last published value (if any) first,
    /// followed by every value published afterwards.
    pub fn subscribe(&self) -> BrokerStream<T> {
        // Locking here guarantees the replay value and the subscription
        // point are consistent: no publish can land between reading `last`
        // and registering the receiver from the caller's point of view,
        // because `publish` always updates `last` before sending.
        let last = self.last.lock().unwrap().clone();
        let receiver = self.sender.subscribe();
        BrokerStream {
            replayed: last,
            receiver,
        }
    }
}

/// Handle returned by [`Broker::subscribe`]. Call [`BrokerStream::recv`] in
/// a loop to drain the replayed value followed by live updates.
pub struct BrokerStream<T> {
    replayed: Option<T>,
    receiver: broadcast::Receiver<T>,
}

impl<T: Clone> BrokerStream<T> {
    pub async fn recv(&mut self) -> Option<T> {
        if let Some(value) = self.replayed.take() {
            return Some(value);
        }
        loop {
            match self.receiver.recv().await {
                Ok(value) => return Some(value),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
