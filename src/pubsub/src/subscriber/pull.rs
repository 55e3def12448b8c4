// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::flow_control::{FlowController, Permit};
use super::handler::{AckSender, AtLeastOnce, Handler};
use crate::Result;
use crate::model::{Message, PullRequest};
use crate::stub::Stub;
use std::sync::Arc;
use tokio::time::{Duration, sleep};
use tokio_util::sync::CancellationToken;

/// How long to wait before pulling again after an empty response.
pub(super) const EMPTY_PULL_BACKOFF: Duration = Duration::from_millis(100);

/// Pulls batches of messages under flow control.
///
/// Each worker owns a clone. All clones share the flow controller and the
/// sender into the ack loop.
#[derive(Clone, Debug)]
pub(super) struct Puller {
    inner: Arc<dyn Stub>,
    subscription: String,
    flow: FlowController,
    ack_tx: AckSender,
    batch_size: usize,
}

impl Puller {
    pub(super) fn new(
        inner: Arc<dyn Stub>,
        subscription: String,
        flow: FlowController,
        ack_tx: AckSender,
        batch_size: usize,
    ) -> Self {
        Self {
            inner,
            subscription,
            flow,
            ack_tx,
            batch_size,
        }
    }

    /// Returns the next non-empty batch of messages.
    ///
    /// Returns `None` once `shutdown` is cancelled. Errors from the service are
    /// returned as-is, the caller decides how to wrap them.
    pub(super) async fn next_batch(
        &self,
        shutdown: &CancellationToken,
    ) -> Option<Result<Vec<(Message, Handler)>>> {
        loop {
            let mut permits = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return None,
                p = self.flow.acquire(self.batch_size) => p,
            };
            let req = PullRequest::new()
                .set_subscription(&self.subscription)
                .set_max_messages(i32::try_from(permits.len()).unwrap_or(i32::MAX));
            let response = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return None,
                r = self.inner.pull(req) => r,
            };
            let response = match response {
                Ok(r) => r,
                Err(e) => return Some(Err(e)),
            };
            let extra = response
                .received_messages
                .len()
                .saturating_sub(permits.len());
            if extra > 0 {
                tracing::warn!(
                    subscription = %self.subscription,
                    extra,
                    "the service returned more messages than requested"
                );
            }
            let batch: Vec<_> = response
                .received_messages
                .into_iter()
                .filter_map(|rm| {
                    let Some(message) = rm.message else {
                        // The ack ID is ignored, the service redelivers the
                        // message when its lease expires.
                        tracing::debug!(ack_id = %rm.ack_id, "skipping entry without a message");
                        return None;
                    };
                    let permit = permits.pop().unwrap_or_else(Permit::unlimited);
                    let handler = AtLeastOnce::new(rm.ack_id, self.ack_tx.clone(), permit);
                    Some((message, Handler::AtLeastOnce(handler)))
                })
                .collect();
            if !batch.is_empty() {
                return Some(Ok(batch));
            }
            // Nothing to serve, either the response was empty or no entry had
            // a message.
            drop(permits);
            tokio::select! {
                _ = shutdown.cancelled() => return None,
                _ = sleep(EMPTY_PULL_BACKOFF) => {},
            }
        }
    }
}
