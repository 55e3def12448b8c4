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

use super::ack_state::AckState;
use super::handler::AckSender;
use crate::stub::Stub;
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;
use tokio::task::JoinHandle;

/// A convenience struct that groups the components of the ack loop.
pub(super) struct AckLoop {
    /// A handle to the task running the ack loop.
    pub(super) handle: JoinHandle<()>,
    /// For sending acks/nacks from the handlers to the ack loop.
    pub(super) ack_tx: AckSender,
}

impl AckLoop {
    /// Spawns the task settling messages for one session.
    ///
    /// The task batches whatever acks and nacks are pending, sends them, and
    /// goes back to waiting. It exits once all the senders (including the one
    /// held by each `Handler`) are dropped, after flushing the last batch.
    pub(super) fn new(inner: Arc<dyn Stub>, subscription: String) -> Self {
        let (ack_tx, mut ack_rx) = unbounded_channel();
        let mut state = AckState::new(inner, subscription);

        let handle = tokio::spawn(async move {
            while let Some((result, permit)) = ack_rx.recv().await {
                state.add(result, permit);
                while let Ok((result, permit)) = ack_rx.try_recv() {
                    state.add(result, permit);
                }
                state.flush().await;
            }
            if !state.is_empty() {
                state.flush().await;
            }
        });
        AckLoop { handle, ack_tx }
    }
}
