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

//! The interface to the delivery service.
//!
//! The subscriber does not own a transport. Applications (and tests) provide
//! an implementation of [Stub] that talks to the service, and the subscriber
//! drives it: it opens the session, pulls batches of messages under flow
//! control, and settles them with acknowledgements.

use crate::Result;
use crate::model::{
    AcknowledgeRequest, ModifyAckDeadlineRequest, OpenSessionRequest, PullRequest, PullResponse,
};

/// Defines the operations the subscriber needs from the delivery service.
///
/// Implementations must be safe to call concurrently: the receive loop issues
/// pulls from multiple workers while the ack loop settles messages.
#[async_trait::async_trait]
pub trait Stub: std::fmt::Debug + Send + Sync + 'static {
    /// Opens (and configures) a session on a subscription.
    ///
    /// An error here is a setup failure, the subscriber does not pull.
    async fn open_session(&self, req: OpenSessionRequest) -> Result<()>;

    /// Pulls at most `req.max_messages` messages.
    ///
    /// Implementations may wait until messages are available.
    async fn pull(&self, req: PullRequest) -> Result<PullResponse>;

    /// Acknowledges a batch of messages.
    async fn acknowledge(&self, req: AcknowledgeRequest) -> Result<()>;

    /// Modifies the ack deadline of a batch of messages, zero rejects them.
    async fn modify_ack_deadline(&self, req: ModifyAckDeadlineRequest) -> Result<()>;
}
