// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event dispatch fabric
//!
//! Handlers are self-declaring: a pure predicate plus a target queue,
//! walked in registration order. The first match wins and the event is
//! enqueued there; handlers run later, inside the queue workers.

use crate::queue::{QueueName, Queues};
use devloop_core::Event;

/// A routing entry. `matches` must be pure; it sees the event and nothing
/// else.
pub struct Handler {
    pub name: &'static str,
    pub queue: QueueName,
    pub matches: fn(&Event) -> bool,
}

/// Walks the handler registry and enqueues events.
pub struct Dispatcher {
    handlers: Vec<Handler>,
    queues: Queues,
}

impl Dispatcher {
    /// Registration order is the tie-break between overlapping handlers.
    pub fn new(handlers: Vec<Handler>, queues: Queues) -> Self {
        Self { handlers, queues }
    }

    /// Route one event to at most one handler's queue. No match logs a
    /// warning and drops the event.
    pub fn dispatch(&self, event: Event) {
        for handler in &self.handlers {
            if (handler.matches)(&event) {
                tracing::debug!(
                    handler = handler.name,
                    queue = %handler.queue,
                    kind = %event.kind(),
                    "dispatching event"
                );
                self.queues.get(handler.queue).push(event);
                return;
            }
        }
        tracing::warn!(kind = %event.kind(), "no handler matched, dropping event");
    }

    pub fn queues(&self) -> &Queues {
        &self.queues
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
