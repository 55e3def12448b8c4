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

//! An in-memory delivery service, for tests and demos.
//!
//! [FakeSubscriber] implements [Stub] without a network. It delivers the
//! messages it holds, tracks which ones are outstanding, and redelivers the
//! rejected ones. It also checks the flow control contract: the number of
//! outstanding messages never exceeds the limit announced when the session is
//! opened.
//!
//! # Example
//! ```
//! # use pubsub_collector::fake::FakeSubscriber;
//! # use pubsub_collector::client::Subscriber;
//! let fake = FakeSubscriber::new().with_messages(["m1", "m2", "m3"]);
//! let client = Subscriber::from_stub(fake.clone());
//! // ... receive from `client`, then inspect `fake.acked()`.
//! ```

use crate::error::rpc::{Code, Status};
use crate::model::{
    AcknowledgeRequest, Message, ModifyAckDeadlineRequest, OpenSessionRequest, PullRequest,
    PullResponse, ReceivedMessage,
};
use crate::stub::Stub;
use crate::{Error, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio::time::{Duration, sleep};

/// An in-memory implementation of [Stub].
///
/// Clones share the same state. Keep a clone to publish more messages, or to
/// inspect the results, after giving one to
/// [Subscriber::from_stub][crate::client::Subscriber::from_stub].
///
/// Pulls wait until at least one message is available.
#[derive(Clone, Debug, Default)]
pub struct FakeSubscriber {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<State>,
    published: Notify,
}

#[derive(Debug, Default)]
struct State {
    queue: VecDeque<Message>,
    outstanding: HashMap<String, Message>,
    next_message_id: u64,
    max_outstanding_messages: i64,

    max_batch: Option<usize>,
    pull_delay: Duration,
    open_error: Option<Status>,
    pull_error: Option<Status>,

    sessions: Vec<OpenSessionRequest>,
    acked: Vec<Message>,
    pull_count: usize,
    peak_outstanding: usize,
    violations: usize,
}

impl FakeSubscriber {
    /// Creates an empty instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds messages with the given payloads, delivered in order.
    pub fn with_messages<I, T>(self, payloads: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<bytes::Bytes>,
    {
        for data in payloads {
            self.publish(data);
        }
        self
    }

    /// Delivers at most `v` messages per pull, regardless of the request.
    pub fn with_max_batch(self, v: usize) -> Self {
        self.lock().max_batch = Some(v.max(1));
        self
    }

    /// Waits this long before serving each pull.
    pub fn with_pull_delay(self, v: Duration) -> Self {
        self.lock().pull_delay = v;
        self
    }

    /// Fails every attempt to open a session with `status`.
    pub fn fail_open(self, status: Status) -> Self {
        self.lock().open_error = Some(status);
        self
    }

    /// Fails every pull with `status`.
    pub fn fail_pull(self, status: Status) -> Self {
        self.lock().pull_error = Some(status);
        self
    }

    /// Adds a message with the given payload, and wakes up pending pulls.
    pub fn publish<T: Into<bytes::Bytes>>(&self, data: T) {
        {
            let mut state = self.lock();
            state.next_message_id += 1;
            let message = Message::new()
                .set_data(data)
                .set_message_id(state.next_message_id.to_string());
            state.queue.push_back(message);
        }
        self.inner.published.notify_waiters();
    }

    /// The payloads acknowledged so far, in acknowledgement order.
    ///
    /// Payloads are decoded as UTF-8, invalid sequences are replaced.
    pub fn acked(&self) -> Vec<String> {
        self.lock()
            .acked
            .iter()
            .map(|m| String::from_utf8_lossy(&m.data).into_owned())
            .collect()
    }

    /// The requests used to open sessions.
    pub fn sessions(&self) -> Vec<OpenSessionRequest> {
        self.lock().sessions.clone()
    }

    /// The number of pull requests received.
    pub fn pull_count(&self) -> usize {
        self.lock().pull_count
    }

    /// The number of messages waiting to be delivered.
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// The number of messages delivered and not yet acknowledged or rejected.
    pub fn outstanding(&self) -> usize {
        self.lock().outstanding.len()
    }

    /// The largest number of outstanding messages observed.
    pub fn peak_outstanding(&self) -> usize {
        self.lock().peak_outstanding
    }

    /// The number of pulls that would have exceeded the flow control limit.
    pub fn violations(&self) -> usize {
        self.lock().violations
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl State {
    fn deliver(&mut self, max_messages: i32) -> Result<PullResponse> {
        let mut count = usize::try_from(max_messages).unwrap_or(0).max(1);
        if let Some(max) = self.max_batch {
            count = count.min(max);
        }
        count = count.min(self.queue.len());

        let limit = usize::try_from(self.max_outstanding_messages).unwrap_or(0);
        if limit > 0 && self.outstanding.len() + count > limit {
            self.violations += 1;
            let status = Status::default()
                .set_code(Code::FailedPrecondition)
                .set_message(format!(
                    "delivering {count} messages with {} outstanding exceeds the limit of {limit}",
                    self.outstanding.len()
                ));
            return Err(Error::service(status));
        }

        let messages: Vec<Message> = self.queue.drain(..count).collect();
        let mut received = Vec::with_capacity(messages.len());
        for message in messages {
            let ack_id = uuid::Uuid::new_v4().to_string();
            self.outstanding.insert(ack_id.clone(), message.clone());
            received.push(ReceivedMessage::new().set_ack_id(ack_id).set_message(message));
        }
        self.peak_outstanding = self.peak_outstanding.max(self.outstanding.len());
        Ok(PullResponse::new().set_received_messages(received))
    }
}

#[async_trait::async_trait]
impl Stub for FakeSubscriber {
    async fn open_session(&self, req: OpenSessionRequest) -> Result<()> {
        let mut state = self.lock();
        if let Some(status) = state.open_error.clone() {
            return Err(Error::service(status));
        }
        state.max_outstanding_messages = req.max_outstanding_messages;
        state.sessions.push(req);
        Ok(())
    }

    async fn pull(&self, req: PullRequest) -> Result<PullResponse> {
        let delay = {
            let mut state = self.lock();
            state.pull_count += 1;
            if let Some(status) = state.pull_error.clone() {
                return Err(Error::service(status));
            }
            state.pull_delay
        };
        if !delay.is_zero() {
            sleep(delay).await;
        }
        loop {
            // Register for notifications before looking at the queue, so a
            // concurrent `publish()` is not missed.
            let published = self.inner.published.notified();
            {
                let mut state = self.lock();
                if !state.queue.is_empty() {
                    return state.deliver(req.max_messages);
                }
            }
            published.await;
        }
    }

    async fn acknowledge(&self, req: AcknowledgeRequest) -> Result<()> {
        let mut state = self.lock();
        for ack_id in req.ack_ids {
            // Unknown or expired ack IDs are ignored.
            if let Some(message) = state.outstanding.remove(&ack_id) {
                state.acked.push(message);
            }
        }
        Ok(())
    }

    async fn modify_ack_deadline(&self, req: ModifyAckDeadlineRequest) -> Result<()> {
        if req.ack_deadline_seconds != 0 {
            return Ok(());
        }
        {
            let mut state = self.lock();
            for ack_id in req.ack_ids.into_iter().rev() {
                if let Some(message) = state.outstanding.remove(&ack_id) {
                    state.queue.push_front(message);
                }
            }
        }
        self.inner.published.notify_waiters();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    const SUBSCRIPTION: &str = "projects/p/subscriptions/s";

    async fn open(fake: &FakeSubscriber, max_outstanding_messages: i64) -> Result<()> {
        fake.open_session(
            OpenSessionRequest::new()
                .set_subscription(SUBSCRIPTION)
                .set_max_outstanding_messages(max_outstanding_messages),
        )
        .await
    }

    async fn pull(fake: &FakeSubscriber, max_messages: i32) -> Result<Vec<ReceivedMessage>> {
        let req = PullRequest::new()
            .set_subscription(SUBSCRIPTION)
            .set_max_messages(max_messages);
        Ok(fake.pull(req).await?.received_messages)
    }

    fn ack_ids(messages: &[ReceivedMessage]) -> Vec<String> {
        messages.iter().map(|m| m.ack_id.clone()).collect()
    }

    #[tokio::test]
    async fn deliver_and_ack() -> anyhow::Result<()> {
        let fake = FakeSubscriber::new().with_messages(["m1", "m2", "m3"]);
        open(&fake, 0).await?;
        assert_eq!(fake.pending(), 3);

        let got = pull(&fake, 2).await?;
        let data: Vec<_> = got
            .iter()
            .filter_map(|m| m.message.as_ref())
            .map(|m| m.data.clone())
            .collect();
        assert_eq!(data, vec!["m1", "m2"]);
        assert_eq!(fake.outstanding(), 2);
        assert_eq!(fake.pending(), 1);

        fake.acknowledge(AcknowledgeRequest::new().set_ack_ids(ack_ids(&got)))
            .await?;
        assert_eq!(fake.acked(), vec!["m1", "m2"]);
        assert_eq!(fake.outstanding(), 0);
        assert_eq!(fake.pull_count(), 1);
        assert_eq!(fake.peak_outstanding(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn nack_redelivers() -> anyhow::Result<()> {
        let fake = FakeSubscriber::new().with_messages(["m1", "m2", "m3"]);
        open(&fake, 0).await?;

        let got = pull(&fake, 2).await?;
        fake.modify_ack_deadline(
            ModifyAckDeadlineRequest::new()
                .set_ack_ids(ack_ids(&got))
                .set_ack_deadline_seconds(0),
        )
        .await?;
        assert_eq!(fake.outstanding(), 0);

        let got = pull(&fake, 10).await?;
        let data: Vec<_> = got
            .iter()
            .filter_map(|m| m.message.as_ref())
            .map(|m| m.data.clone())
            .collect();
        assert_eq!(data, vec!["m1", "m2", "m3"]);
        Ok(())
    }

    #[tokio::test]
    async fn flow_control_violation() -> anyhow::Result<()> {
        let fake = FakeSubscriber::new().with_messages(["m1", "m2", "m3"]);
        open(&fake, 2).await?;

        let got = pull(&fake, 2).await?;
        assert_eq!(got.len(), 2);
        let err = pull(&fake, 1).await.expect_err("exceeds the limit");
        assert_eq!(err.status().map(|s| s.code), Some(Code::FailedPrecondition));
        assert_eq!(fake.violations(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn max_batch() -> anyhow::Result<()> {
        let fake = FakeSubscriber::new()
            .with_messages(["m1", "m2", "m3"])
            .with_max_batch(1);
        open(&fake, 0).await?;
        assert_eq!(pull(&fake, 10).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn injected_errors() -> anyhow::Result<()> {
        let fake = FakeSubscriber::new()
            .fail_open(Status::default().set_code(Code::NotFound))
            .fail_pull(Status::default().set_code(Code::Unavailable));
        let err = open(&fake, 0).await.expect_err("open fails");
        assert_eq!(err.status().map(|s| s.code), Some(Code::NotFound));
        let err = pull(&fake, 1).await.expect_err("pull fails");
        assert_eq!(err.status().map(|s| s.code), Some(Code::Unavailable));
        assert!(fake.sessions().is_empty());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn pull_waits_for_messages() -> anyhow::Result<()> {
        const DELAY: Duration = Duration::from_millis(250);
        let fake = FakeSubscriber::new().with_pull_delay(DELAY);
        open(&fake, 0).await?;

        let start = Instant::now();
        let pending = {
            let fake = fake.clone();
            tokio::spawn(async move { pull(&fake, 10).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!pending.is_finished());
        fake.publish("late");

        let got = pending.await??;
        assert_eq!(got.len(), 1);
        assert_eq!(start.elapsed(), Duration::from_secs(1));
        Ok(())
    }
}
