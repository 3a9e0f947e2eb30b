// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process publish/subscribe event bus (spec §4.4).
//!
//! Delivery is at-least-once per live subscriber and preserves per-publisher
//! order; a subscriber that falls behind the bus's bound loses its oldest
//! unread events rather than blocking the publisher, and its lag is counted
//! rather than silently swallowed.

use orbitmesh_core::Event;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Default bound on the number of in-flight events a lagging subscriber may
/// miss before its oldest unread event is dropped.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish one event to every live subscriber. Never blocks: a bus with
    /// no subscribers simply drops the event.
    pub fn publish(&self, event: Event) {
        let _ = self.sender.send(event);
    }

    /// Subscribe, optionally filtered to a single topic (`Event::topic()`).
    /// `None` subscribes to every topic.
    pub fn subscribe(&self, topic: Option<&str>) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            topic: topic.map(str::to_string),
            lagged: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// One subscriber's view of the bus.
pub struct Subscription {
    receiver: broadcast::Receiver<Event>,
    topic: Option<String>,
    lagged: Arc<AtomicU64>,
}

impl Subscription {
    /// Await the next event matching this subscription's topic filter.
    /// Returns `None` once the bus itself is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    self.lagged.fetch_add(skipped, Ordering::Relaxed);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Total events dropped under this subscriber due to lag, for the
    /// `SubscriberLagged` counter (spec §4.4).
    pub fn lagged_count(&self) -> u64 {
        self.lagged.load(Ordering::Relaxed)
    }

    fn matches(&self, event: &Event) -> bool {
        match &self.topic {
            Some(topic) => event.topic() == topic,
            None => true,
        }
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
