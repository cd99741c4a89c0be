// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polling bridge for the document store
//!
//! The document store emits no webhooks, so a periodic puller synthesises
//! `page:approved` and `page:comment` events from page snapshots. The
//! comment watermark only advances when a tick completes, and the filter is
//! strictly `created_at > since`, so a comment is either seen this tick or
//! the next, never dropped.

use crate::dispatch::Dispatcher;
use crate::error::EngineError;
use devloop_adapters::DocsApi;
use devloop_core::{design_id_from_title, Clock, Event};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct DocPoller<D: DocsApi, K: Clock> {
    docs: Arc<D>,
    dispatcher: Arc<Dispatcher>,
    clock: K,
    interval: Duration,
    last_since: Mutex<String>,
}

impl<D: DocsApi, K: Clock> DocPoller<D, K> {
    pub fn new(docs: Arc<D>, dispatcher: Arc<Dispatcher>, clock: K, interval: Duration) -> Self {
        let start = clock.iso_now();
        Self {
            docs,
            dispatcher,
            clock,
            interval,
            last_since: Mutex::new(start),
        }
    }

    /// Run until cancelled. Tick errors are absorbed; the next tick runs
    /// regardless.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
            if let Err(e) = self.tick().await {
                tracing::warn!(error = %e, "doc poll tick failed");
            }
        }
        tracing::info!("doc poller stopped");
    }

    /// One poll pass. Returns the number of events dispatched.
    pub async fn tick(&self) -> Result<usize, EngineError> {
        let next_since = self.clock.iso_now();
        let since = self.last_since.lock().clone();
        let mut dispatched = 0;

        let pages = self.docs.pages_in_review().await?;
        for page in pages {
            let Some(design_id) = design_id_from_title(&page.title) else {
                tracing::debug!(title = %page.title, "page without design id, skipping");
                continue;
            };

            // Per-page failures are absorbed so one bad page cannot starve
            // the rest of the listing.
            match self.docs.content_state(&page.id).await {
                Ok(Some(state)) if state.eq_ignore_ascii_case("approved") => {
                    self.dispatcher.dispatch(Event::PageApproved {
                        page_id: page.id.clone(),
                        design_id: design_id.clone(),
                    });
                    dispatched += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(page_id = %page.id, error = %e, "content state fetch failed");
                    continue;
                }
            }

            match self.docs.new_comments(&page.id, &since).await {
                Ok(comments) => {
                    for comment in comments {
                        self.dispatcher.dispatch(Event::PageComment {
                            page_id: page.id.clone(),
                            design_id: design_id.clone(),
                            comments: vec![format!("{}: {}", comment.author, comment.body)],
                        });
                        dispatched += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(page_id = %page.id, error = %e, "comment fetch failed");
                }
            }
        }

        *self.last_since.lock() = next_since;
        Ok(dispatched)
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
