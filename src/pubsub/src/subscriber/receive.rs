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

use super::ack_loop::AckLoop;
use super::builder::Receive;
use super::deadline;
use super::flow_control::FlowController;
use super::handler::Handler;
use super::options::ReceiveSettings;
use super::pull::Puller;
use super::worker;
use crate::error::ReceiveError;
use crate::model::{Message, OpenSessionRequest};
use crate::stub::Stub;
use crate::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Opens a session on `subscription`, announcing the flow control settings.
///
/// Any failure is a setup error.
pub(super) async fn open_session(
    inner: &Arc<dyn Stub>,
    subscription: &str,
    settings: &ReceiveSettings,
) -> Result<()> {
    if subscription.is_empty() {
        return Err(Error::setup(ReceiveError::EmptySubscription));
    }
    let client_id = uuid::Uuid::new_v4().to_string();
    let req = OpenSessionRequest::new()
        .set_subscription(subscription)
        .set_client_id(&client_id)
        .set_synchronous(settings.synchronous)
        .set_max_outstanding_messages(settings.max_outstanding_messages);
    inner.open_session(req).await.map_err(|e| {
        tracing::warn!(%subscription, "cannot open the subscriber session: {e}");
        Error::setup(e)
    })?;
    tracing::info!(
        %subscription,
        %client_id,
        synchronous = settings.synchronous,
        max_outstanding_messages = settings.max_outstanding_messages,
        workers = settings.worker_count(),
        "subscriber session open"
    );
    Ok(())
}

/// Runs the receive loop behind [Receive::run].
pub(super) async fn run<F, Fut>(
    builder: Receive,
    cancel: CancellationToken,
    callback: F,
) -> Result<()>
where
    F: Fn(Message, Handler) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let Receive {
        inner,
        subscription,
        settings,
        timeout,
    } = builder;
    open_session(&inner, &subscription, &settings).await?;

    // Cancelling the caller's token stops the session. Stopping the session
    // (deadline or failure) leaves the caller's token alone.
    let shutdown = cancel.child_token();
    let timer = deadline::spawn(shutdown.clone(), timeout);
    let AckLoop { handle, ack_tx } = AckLoop::new(inner.clone(), subscription.clone());
    let puller = Puller::new(
        inner,
        subscription.clone(),
        FlowController::new(settings.max_outstanding_messages),
        ack_tx,
        settings.pull_batch_size(),
    );

    let callback = Arc::new(callback);
    let mut workers = JoinSet::new();
    for id in 0..settings.worker_count() {
        workers.spawn(worker::run(
            id,
            puller.clone(),
            shutdown.clone(),
            callback.clone(),
        ));
    }
    // The ack loop exits once the workers, and the handlers they created, are
    // gone.
    drop(puller);

    let mut result = Ok(());
    while let Some(joined) = workers.join_next().await {
        let error = match joined {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => Error::receive(e),
            Err(e) => Error::receive(ReceiveError::WorkerFailed(e)),
        };
        tracing::warn!(%subscription, "stopping the receive loop: {error}");
        shutdown.cancel();
        if result.is_ok() {
            result = Err(error);
        }
    }
    // Stop the timer, if it is still running.
    shutdown.cancel();
    if let Some(timer) = timer {
        if let Err(e) = timer.await {
            tracing::warn!(%subscription, "the deadline timer terminated abnormally: {e}");
        }
    }
    drop(callback);
    if let Err(e) = handle.await {
        tracing::warn!(%subscription, "the ack loop terminated abnormally: {e}");
    }
    result
}
