// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat notifications, threaded under the originating intake message

use crate::workers::Orchestrator;
use devloop_adapters::{AgentSpawner, ChatApi, DocsApi, ScmApi, TrackerApi};
use devloop_core::DesignId;

impl<C, T, D, S, R> Orchestrator<C, T, D, S, R>
where
    C: ChatApi,
    T: TrackerApi,
    D: DocsApi,
    S: ScmApi,
    R: AgentSpawner,
{
    /// Post a pipeline notification. Threads under the intake message when
    /// one is recorded. Failures are logged, never raised.
    pub(crate) async fn notify_design(&self, design_id: &DesignId, text: &str) {
        let intake = match self.store.get_intake(design_id) {
            Ok(intake) => intake,
            Err(e) => {
                tracing::warn!(design_id = %design_id, error = %e, "intake lookup failed");
                None
            }
        };
        let result = match &intake {
            Some(intake) => {
                self.chat
                    .post_message(&intake.channel, text, intake.thread_ts.as_deref())
                    .await
            }
            None => self.chat.send(text, None).await,
        };
        if let Err(e) = result {
            tracing::warn!(design_id = %design_id, error = %e, "notification failed");
        }
    }
}
