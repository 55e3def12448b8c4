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

use super::handler::Handler;
use super::pull::Puller;
use crate::Result;
use crate::model::Message;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Pulls batches and runs the callback on each message, one at a time.
///
/// The worker stops when `shutdown` is cancelled. A callback that is already
/// running completes, the remaining messages in its batch are rejected so the
/// service can redeliver them.
pub(super) async fn run<F, Fut>(
    id: usize,
    puller: Puller,
    shutdown: CancellationToken,
    callback: Arc<F>,
) -> Result<()>
where
    F: Fn(Message, Handler) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tracing::debug!(worker = id, "worker started");
    let mut delivered = 0_usize;
    while let Some(batch) = puller.next_batch(&shutdown).await {
        for (message, handler) in batch? {
            if shutdown.is_cancelled() {
                handler.nack();
                continue;
            }
            (*callback)(message, handler).await;
            delivered += 1;
        }
    }
    tracing::debug!(worker = id, delivered, "worker stopped");
    Ok(())
}
