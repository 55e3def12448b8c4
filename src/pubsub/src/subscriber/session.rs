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
use super::pull::Puller;
use super::receive::open_session;
use crate::model::Message;
use crate::{Error, Result};
use std::collections::VecDeque;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Represents an open subscribe session.
///
/// This is a stream-like struct for serving messages to an application.
///
/// # Example
/// ```
/// # use pubsub_collector::client::Subscriber;
/// # async fn sample(client: Subscriber) -> anyhow::Result<()> {
/// use tokio_util::sync::CancellationToken;
/// let mut session = client
///     .receive("projects/my-project/subscriptions/my-subscription")
///     .start(CancellationToken::new());
/// while let Some((m, h)) = session.next().await.transpose()? {
///     println!("Received message m={m:?}");
///     h.ack();
/// }
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Session {
    /// The configuration used to open the session.
    builder: Receive,

    /// Cancelled at the deadline, on a permanent error, or when the
    /// application cancels the token given to [Receive::start].
    shutdown: CancellationToken,

    /// The background state, created when the application asks for the first
    /// message.
    ///
    /// Opening the session lazily keeps `start()` synchronous.
    open: Option<Open>,

    /// Applications ask for messages one at a time. Individual pulls can
    /// return multiple messages. We use `pool` to hold the extra messages while
    /// we wait to serve them to applications.
    ///
    /// A FIFO queue is necessary to preserve ordering.
    pool: VecDeque<(Message, Handler)>,
}

#[derive(Debug)]
struct Open {
    puller: Puller,
    ack_loop: JoinHandle<()>,
}

impl Session {
    pub(super) fn new(builder: Receive, cancel: CancellationToken) -> Self {
        Self {
            builder,
            shutdown: cancel.child_token(),
            open: None,
            pool: VecDeque::new(),
        }
    }

    /// Returns the next message received on this subscription.
    ///
    /// The message data is returned along with a [Handler] for acknowledging
    /// (ack) or rejecting (nack) the message.
    ///
    /// If the session cannot be opened, or a pull fails, an `Error` is
    /// returned instead. There are no retries: the following call returns
    /// `None`.
    ///
    /// `None` represents the end of the session: the timeout elapsed or the
    /// session was cancelled. Messages pulled but not yet served are rejected,
    /// and the service redelivers them.
    ///
    /// # Example
    /// ```
    /// # use pubsub_collector::subscriber::session::Session;
    /// # async fn sample(mut session: Session) -> anyhow::Result<()> {
    /// while let Some((m, h)) = session.next().await.transpose()? {
    ///     println!("Received message m={m:?}");
    ///     h.ack();
    /// }
    /// # Ok(()) }
    /// ```
    pub async fn next(&mut self) -> Option<Result<(Message, Handler)>> {
        loop {
            if self.shutdown.is_cancelled() {
                // Dropping the handlers rejects the messages.
                self.pool.clear();
                return None;
            }
            // Serve a message if we have one ready.
            if let Some(item) = self.pool.pop_front() {
                return Some(Ok(item));
            }
            // Otherwise, pull more messages.
            if self.open.is_none() {
                match self.connect().await {
                    Ok(open) => self.open = Some(open),
                    Err(e) => {
                        self.shutdown.cancel();
                        return Some(Err(e));
                    }
                }
            }
            let open = self.open.as_ref()?;
            match open.puller.next_batch(&self.shutdown).await? {
                Ok(batch) => self.pool.extend(batch),
                Err(e) => {
                    tracing::warn!(subscription = %self.builder.subscription, "stopping the session: {e}");
                    self.shutdown.cancel();
                    return Some(Err(Error::receive(e)));
                }
            }
        }
    }

    /// Converts the session into a [Stream][futures::Stream].
    ///
    /// # Example
    /// ```
    /// # use pubsub_collector::subscriber::session::Session;
    /// # async fn sample(session: Session) -> anyhow::Result<()> {
    /// use futures::TryStreamExt;
    /// let mut stream = std::pin::pin!(session.into_stream());
    /// while let Some((m, h)) = stream.try_next().await? {
    ///     println!("Received message m={m:?}");
    ///     h.ack();
    /// }
    /// # Ok(()) }
    /// ```
    pub fn into_stream(self) -> impl futures::Stream<Item = Result<(Message, Handler)>> {
        futures::stream::unfold(self, |mut session| async move {
            session.next().await.map(|item| (item, session))
        })
    }

    /// Ends the session, and waits for pending acks and nacks to be sent.
    ///
    /// Messages pulled but not yet served are rejected. If the application
    /// holds on to any [Handler], this function waits until the handler is
    /// used or dropped.
    pub async fn close(mut self) {
        self.shutdown.cancel();
        self.pool.clear();
        if let Some(Open { puller, ack_loop }) = self.open.take() {
            drop(puller);
            if let Err(e) = ack_loop.await {
                tracing::warn!(subscription = %self.builder.subscription, "the ack loop terminated abnormally: {e}");
            }
        }
    }

    async fn connect(&self) -> Result<Open> {
        let Receive {
            inner,
            subscription,
            settings,
            timeout,
        } = &self.builder;
        open_session(inner, subscription, settings).await?;
        // The timer exits on its own once the session is cancelled.
        let _timer = deadline::spawn(self.shutdown.clone(), *timeout);
        let AckLoop { handle, ack_tx } = AckLoop::new(inner.clone(), subscription.clone());
        let puller = Puller::new(
            inner.clone(),
            subscription.clone(),
            FlowController::new(settings.max_outstanding_messages),
            ack_tx,
            settings.pull_batch_size(),
        );
        Ok(Open {
            puller,
            ack_loop: handle,
        })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Stops the deadline timer.
        self.shutdown.cancel();
    }
}
