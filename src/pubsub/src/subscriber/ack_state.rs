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

use super::flow_control::Permit;
use super::handler::AckResult;
use crate::model::{AcknowledgeRequest, ModifyAckDeadlineRequest};
use crate::stub::Stub;
use std::sync::Arc;

/// Pending acks and nacks, waiting for the next flush.
#[derive(Debug)]
pub(super) struct AckState {
    inner: Arc<dyn Stub>,
    subscription: String,
    to_ack: Vec<String>,
    to_nack: Vec<String>,
    // Released after the flush, so the service never sees more outstanding
    // messages than the flow control limit.
    permits: Vec<Permit>,
}

impl AckState {
    pub(super) fn new(inner: Arc<dyn Stub>, subscription: String) -> Self {
        Self {
            inner,
            subscription,
            to_ack: Vec::new(),
            to_nack: Vec::new(),
            permits: Vec::new(),
        }
    }

    /// Process an ack or nack from the application.
    pub(super) fn add(&mut self, result: AckResult, permit: Permit) {
        match result {
            AckResult::Ack(ack_id) => self.to_ack.push(ack_id),
            AckResult::Nack(ack_id) => self.to_nack.push(ack_id),
        }
        self.permits.push(permit);
    }

    pub(super) fn is_empty(&self) -> bool {
        self.to_ack.is_empty() && self.to_nack.is_empty()
    }

    /// Sends the pending acks and nacks, then releases their permits.
    ///
    /// Failures are logged and dropped. The service redelivers any message it
    /// did not hear back about.
    pub(super) async fn flush(&mut self) {
        let to_ack = std::mem::take(&mut self.to_ack);
        let to_nack = std::mem::take(&mut self.to_nack);
        let permits = std::mem::take(&mut self.permits);

        let ack = async {
            if to_ack.is_empty() {
                return;
            }
            let count = to_ack.len();
            let req = AcknowledgeRequest::new()
                .set_subscription(&self.subscription)
                .set_ack_ids(to_ack);
            if let Err(e) = self.inner.acknowledge(req).await {
                tracing::warn!(subscription = %self.subscription, count, "error acknowledging messages: {e}");
            }
        };
        let nack = async {
            if to_nack.is_empty() {
                return;
            }
            let count = to_nack.len();
            let req = ModifyAckDeadlineRequest::new()
                .set_subscription(&self.subscription)
                .set_ack_ids(to_nack)
                .set_ack_deadline_seconds(0);
            if let Err(e) = self.inner.modify_ack_deadline(req).await {
                tracing::warn!(subscription = %self.subscription, count, "error rejecting messages: {e}");
            }
        };
        futures::join!(ack, nack);
        drop(permits);
    }
}
