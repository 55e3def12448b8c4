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

use super::builder::Receive;
use crate::stub::Stub;
use std::sync::Arc;

/// A Subscriber client for pull subscriptions.
///
/// Use this client to receive messages from a subscription, either through a
/// callback ([Receive::run]) or one message at a time ([Receive::start]).
///
/// # Example
/// ```
/// # use pubsub_collector::client::Subscriber;
/// # use pubsub_collector::stub::Stub;
/// # async fn sample<T: Stub>(stub: T) -> anyhow::Result<()> {
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// let client = Subscriber::from_stub(stub);
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
///
/// # Configuration
///
/// The client does not own a transport. Provide one by implementing
/// [Stub], and wrap it with [from_stub()][Subscriber::from_stub]. The `fake`
/// module (behind the `fake` feature) has an in-memory implementation.
///
/// # Pooling and Cloning
///
/// `Subscriber` holds its stub behind an [Arc]. You do not need to wrap
/// `Subscriber` in an [Rc](std::rc::Rc) or [Arc] to reuse it, cloning it is
/// cheap.
#[derive(Clone, Debug)]
pub struct Subscriber {
    inner: Arc<dyn Stub>,
}

impl Subscriber {
    /// Creates a new client from a [Stub] implementation.
    pub fn from_stub<T>(stub: T) -> Self
    where
        T: Stub,
    {
        Self {
            inner: Arc::new(stub),
        }
    }

    /// Receives messages from a subscription.
    ///
    /// The returned builder configures flow control, the number of workers,
    /// and how long to receive for.
    ///
    /// # Parameters
    /// * `subscription` - the subscription name, in the
    ///   `projects/*/subscriptions/*` format.
    pub fn receive<T: Into<String>>(&self, subscription: T) -> Receive {
        Receive::new(self.inner.clone(), subscription.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::tests::MockStub;

    #[test]
    fn receive() {
        let client = Subscriber::from_stub(MockStub::new());
        let builder = client.clone().receive("projects/p/subscriptions/s");
        assert_eq!(builder.subscription, "projects/p/subscriptions/s");
        assert!(Arc::ptr_eq(&builder.inner, &client.inner));
    }
}
