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

//! Collect message payloads from a subscription for a fixed amount of time.
//!
//! Each collector opens a session, writes one line per message to a sink,
//! acknowledges the message, and returns the payloads received before the
//! session ends.
//!
//! The payloads are gathered by a single aggregating future, which owns the
//! result buffer. The callbacks, running on the receive workers, hand each
//! payload over a bounded channel.

use crate::Result;
use crate::builder::subscriber::Receive;
use crate::client::Subscriber;
use crate::model::Message;
use crate::subscriber::handler::Handler;
use std::io::Write;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

/// How long [collect_concurrent] receives messages.
pub const CONCURRENT_RECEIVE_DURATION: Duration = Duration::from_secs(10);

/// How long [collect_bounded_sync] receives messages.
pub const SYNC_RECEIVE_DURATION: Duration = Duration::from_secs(5);

/// The flow control limit used by [collect_bounded_sync].
pub const SYNC_MAX_OUTSTANDING_MESSAGES: i64 = 100;

// Callbacks wait for the aggregator once this many payloads are in flight.
const CHANNEL_CAPACITY: usize = 128;

/// Collects payloads using `num_workers` concurrent workers, for up to
/// [CONCURRENT_RECEIVE_DURATION].
///
/// Writes `Got message: <payload>` to `sink` for each message. Payloads are
/// decoded as UTF-8, invalid sequences are replaced. The payloads are returned
/// in the order they reached the aggregator, which may differ from the
/// publish order.
///
/// A `num_workers` of 0 uses a single worker. Cancelling `cancel` ends the
/// collection early, this is not an error.
///
/// # Errors
///
/// Returns an error where [is_setup()][crate::Error::is_setup] is true if the
/// session cannot be opened, in this case no message is pulled. Returns an
/// error where [is_receive()][crate::Error::is_receive] is true if the
/// session fails after it starts. No payloads are returned on error.
///
/// # Example
/// ```
/// # use pubsub_collector::client::Subscriber;
/// # use pubsub_collector::collector::collect_concurrent;
/// # async fn sample(client: Subscriber) -> anyhow::Result<()> {
/// use tokio_util::sync::CancellationToken;
/// let payloads = collect_concurrent(
///     &mut std::io::stdout(),
///     &client,
///     "projects/my-project/subscriptions/my-subscription",
///     4,
///     CancellationToken::new(),
/// )
/// .await?;
/// # Ok(()) }
/// ```
pub async fn collect_concurrent<W, S>(
    sink: &mut W,
    client: &Subscriber,
    subscription: S,
    num_workers: usize,
    cancel: CancellationToken,
) -> Result<Vec<String>>
where
    W: Write,
    S: Into<String>,
{
    let receive = client
        .receive(subscription)
        .set_num_workers(num_workers)
        .set_timeout(CONCURRENT_RECEIVE_DURATION);
    collect(sink, receive, cancel, Line::Plain).await
}

/// Collects payloads with a single worker and at most
/// [SYNC_MAX_OUTSTANDING_MESSAGES] outstanding messages, for up to
/// [SYNC_RECEIVE_DURATION].
///
/// Writes `Got message: "<payload>"` to `sink` for each message, with the
/// payload quoted and escaped. Otherwise behaves like [collect_concurrent].
///
/// # Example
/// ```
/// # use pubsub_collector::client::Subscriber;
/// # use pubsub_collector::collector::collect_bounded_sync;
/// # async fn sample(client: Subscriber) -> anyhow::Result<()> {
/// use tokio_util::sync::CancellationToken;
/// let mut sink = Vec::new();
/// let payloads = collect_bounded_sync(
///     &mut sink,
///     &client,
///     "projects/my-project/subscriptions/my-subscription",
///     CancellationToken::new(),
/// )
/// .await?;
/// # Ok(()) }
/// ```
pub async fn collect_bounded_sync<W, S>(
    sink: &mut W,
    client: &Subscriber,
    subscription: S,
    cancel: CancellationToken,
) -> Result<Vec<String>>
where
    W: Write,
    S: Into<String>,
{
    let receive = client
        .receive(subscription)
        .set_synchronous(true)
        .set_max_outstanding_messages(SYNC_MAX_OUTSTANDING_MESSAGES)
        .set_timeout(SYNC_RECEIVE_DURATION);
    collect(sink, receive, cancel, Line::Quoted).await
}

/// The format of the line written for each message.
#[derive(Clone, Copy, Debug)]
enum Line {
    Plain,
    Quoted,
}

impl Line {
    fn write<W: Write>(self, sink: &mut W, payload: &str) -> std::io::Result<()> {
        match self {
            Line::Plain => writeln!(sink, "Got message: {payload}"),
            Line::Quoted => writeln!(sink, "Got message: {payload:?}"),
        }
    }
}

async fn collect<W: Write>(
    sink: &mut W,
    receive: Receive,
    cancel: CancellationToken,
    line: Line,
) -> Result<Vec<String>> {
    let subscription = receive.subscription.clone();
    let (tx, mut rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);

    let run = receive.run(cancel, move |m: Message, h: Handler| {
        let tx = tx.clone();
        async move {
            let payload = String::from_utf8_lossy(&m.data).into_owned();
            // The aggregator runs until the last callback completes.
            let _ = tx.send(payload).await;
            h.ack();
        }
    });

    let aggregate = async {
        let mut payloads = Vec::new();
        while let Some(payload) = rx.recv().await {
            if let Err(e) = line.write(sink, &payload) {
                tracing::warn!(%subscription, "cannot write to the sink: {e}");
            }
            tracing::info!(%subscription, ?payload, "received message");
            payloads.push(payload);
        }
        payloads
    };

    let (result, payloads) = tokio::join!(run, aggregate);
    result.map(|_| payloads)
}
