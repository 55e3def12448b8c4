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
use super::options::ReceiveSettings;
use super::receive;
use super::session::Session;
use crate::Result;
use crate::model::Message;
use crate::stub::Stub;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

/// Builder for the `client::Subscriber::receive` method.
#[derive(Clone, Debug)]
pub struct Receive {
    pub(crate) inner: Arc<dyn Stub>,
    pub(crate) subscription: String,
    pub(crate) settings: ReceiveSettings,
    pub(crate) timeout: Option<Duration>,
}

impl Receive {
    pub(crate) fn new(inner: Arc<dyn Stub>, subscription: String) -> Self {
        Self {
            inner,
            subscription,
            settings: ReceiveSettings::default(),
            timeout: None,
        }
    }

    /// Replaces all the receive settings.
    ///
    /// # Example
    /// ```
    /// # use pubsub_collector::client::Subscriber;
    /// # use pubsub_collector::options::subscriber::ReceiveSettings;
    /// # fn sample(client: Subscriber) {
    /// let settings = ReceiveSettings::new().set_num_workers(4);
    /// let receive = client
    ///     .receive("projects/my-project/subscriptions/my-subscription")
    ///     .with_settings(settings);
    /// # }
    /// ```
    pub fn with_settings(mut self, v: ReceiveSettings) -> Self {
        self.settings = v;
        self
    }

    /// Serializes delivery through a single worker.
    ///
    /// See [ReceiveSettings::set_synchronous].
    pub fn set_synchronous<T: Into<bool>>(mut self, v: T) -> Self {
        self.settings = self.settings.set_synchronous(v);
        self
    }

    /// Flow control settings for the maximum number of outstanding messages.
    ///
    /// No more than this many messages are delivered but not yet acknowledged
    /// (or rejected). Delivery resumes when the acknowledgements reach the
    /// service.
    ///
    /// Use a value <= 0 to set no limit on the number of outstanding messages.
    ///
    /// The default value is 1000 messages.
    pub fn set_max_outstanding_messages<T: Into<i64>>(mut self, v: T) -> Self {
        self.settings = self.settings.set_max_outstanding_messages(v);
        self
    }

    /// The number of workers pulling messages and running the callback.
    ///
    /// See [ReceiveSettings::set_num_workers].
    pub fn set_num_workers(mut self, v: usize) -> Self {
        self.settings = self.settings.set_num_workers(v);
        self
    }

    /// Ends the session after this much time.
    ///
    /// The clock starts once the session is open. Without a timeout the
    /// session runs until it is cancelled or fails.
    ///
    /// # Example
    /// ```
    /// # use pubsub_collector::client::Subscriber;
    /// # fn sample(client: Subscriber) {
    /// use std::time::Duration;
    /// let receive = client
    ///     .receive("projects/my-project/subscriptions/my-subscription")
    ///     .set_timeout(Duration::from_secs(10));
    /// # }
    /// ```
    pub fn set_timeout(mut self, v: Duration) -> Self {
        self.timeout = Some(v);
        self
    }

    /// Runs `callback` on each message until the timeout or cancellation.
    ///
    /// The callback owns the message and its [Handler]. At most one callback
    /// per worker runs at a time. The function returns after all callbacks
    /// complete and their acknowledgements are sent.
    ///
    /// Reaching the timeout, or `cancel` being cancelled, is a normal
    /// completion.
    ///
    /// # Example
    /// ```
    /// # use pubsub_collector::client::Subscriber;
    /// # async fn sample(client: Subscriber) -> anyhow::Result<()> {
    /// use std::time::Duration;
    /// use tokio_util::sync::CancellationToken;
    /// client
    ///     .receive("projects/my-project/subscriptions/my-subscription")
    ///     .set_timeout(Duration::from_secs(10))
    ///     .run(CancellationToken::new(), |m, h| async move {
    ///         println!("Received message m={m:?}");
    ///         h.ack();
    ///     })
    ///     .await?;
    /// # Ok(()) }
    /// ```
    pub async fn run<F, Fut>(self, cancel: CancellationToken, callback: F) -> Result<()>
    where
        F: Fn(Message, Handler) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        receive::run(self, cancel, callback).await
    }

    /// Creates a new session to receive messages one at a time.
    ///
    /// The session is opened on the first call to
    /// [Session::next][super::session::Session::next].
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
    pub fn start(self, cancel: CancellationToken) -> Session {
        Session::new(self, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::tests::MockStub;

    #[test]
    fn defaults() {
        let builder = Receive::new(Arc::new(MockStub::new()), "projects/p/subscriptions/s".into());
        assert_eq!(builder.subscription, "projects/p/subscriptions/s");
        assert_eq!(builder.settings, ReceiveSettings::default());
        assert_eq!(builder.timeout, None);
    }

    #[test]
    fn setters() {
        let builder = Receive::new(Arc::new(MockStub::new()), "projects/p/subscriptions/s".into())
            .set_synchronous(true)
            .set_max_outstanding_messages(100)
            .set_num_workers(4)
            .set_timeout(Duration::from_secs(5));
        let want = ReceiveSettings::new()
            .set_synchronous(true)
            .set_max_outstanding_messages(100)
            .set_num_workers(4);
        assert_eq!(builder.settings, want);
        assert_eq!(builder.timeout, Some(Duration::from_secs(5)));

        let builder = builder.with_settings(ReceiveSettings::new());
        assert_eq!(builder.settings, ReceiveSettings::default());
    }
}
