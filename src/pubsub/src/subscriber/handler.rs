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
use tokio::sync::mpsc::UnboundedSender;

/// The action an application does with a message.
#[derive(Debug, PartialEq)]
pub(super) enum AckResult {
    Ack(String),
    Nack(String),
}

/// Carries a settled message to the ack loop, with its flow control permit.
pub(super) type AckSender = UnboundedSender<(AckResult, Permit)>;

/// A handler for acknowledging or rejecting messages.
///
/// Dropping a handler without calling [ack()][Handler::ack] or
/// [nack()][Handler::nack] rejects the message.
#[derive(Debug)]
#[non_exhaustive]
pub enum Handler {
    AtLeastOnce(AtLeastOnce),
}

impl Handler {
    /// Acknowledge the message associated with this handler.
    ///
    /// Note that the acknowledgement is best effort. The message may still be
    /// redelivered to this client, or another client.
    pub fn ack(self) {
        match self {
            Handler::AtLeastOnce(h) => h.ack(),
        }
    }

    /// Rejects the message associated with this handler.
    ///
    /// The service will redeliver this message, possibly to another client.
    pub fn nack(self) {
        match self {
            Handler::AtLeastOnce(h) => h.nack(),
        }
    }

    /// The ack ID of the message associated with this handler.
    pub fn ack_id(&self) -> &str {
        match self {
            Handler::AtLeastOnce(h) => &h.ack_id,
        }
    }
}

/// A handler for at-least-once delivery.
#[derive(Debug)]
pub struct AtLeastOnce {
    pub(super) ack_id: String,
    ack_tx: AckSender,
    // `None` once the message is settled.
    permit: Option<Permit>,
}

impl AtLeastOnce {
    pub(super) fn new(ack_id: String, ack_tx: AckSender, permit: Permit) -> Self {
        Self {
            ack_id,
            ack_tx,
            permit: Some(permit),
        }
    }

    /// Acknowledge the message associated with this handler.
    ///
    /// Note that the acknowledgement is best effort. The message may still be
    /// redelivered to this client, or another client.
    pub fn ack(mut self) {
        self.settle(AckResult::Ack);
    }

    /// Rejects the message associated with this handler.
    ///
    /// The service will redeliver this message, possibly to another client.
    pub fn nack(mut self) {
        self.settle(AckResult::Nack);
    }

    fn settle(&mut self, result: fn(String) -> AckResult) {
        if let Some(permit) = self.permit.take() {
            let ack_id = std::mem::take(&mut self.ack_id);
            // The ack loop outlives every handler of its session. If it is
            // gone the session is over and there is nothing left to settle.
            let _ = self.ack_tx.send((result(ack_id), permit));
        }
    }
}

impl Drop for AtLeastOnce {
    fn drop(&mut self) {
        self.settle(AckResult::Nack);
    }
}
