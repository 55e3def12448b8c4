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

#[cfg(all(test, feature = "fake"))]
mod tests {
    use pubsub_collector::client::Subscriber;
    use pubsub_collector::collector::{
        CONCURRENT_RECEIVE_DURATION, SYNC_MAX_OUTSTANDING_MESSAGES, SYNC_RECEIVE_DURATION,
        collect_bounded_sync, collect_concurrent,
    };
    use pubsub_collector::error::rpc::{Code, Status};
    use pubsub_collector::fake::FakeSubscriber;
    use tokio::time::{Duration, Instant};
    use tokio_util::sync::CancellationToken;

    const SUBSCRIPTION: &str = "projects/projA/subscriptions/example-sub";

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_delivers_every_message_once() -> anyhow::Result<()> {
        let fake = FakeSubscriber::new()
            .with_messages(["m1", "m2", "m3"])
            .with_max_batch(1)
            .with_pull_delay(Duration::from_millis(50));
        let client = Subscriber::from_stub(fake.clone());

        let start = Instant::now();
        let mut sink = Vec::new();
        let got = collect_concurrent(
            &mut sink,
            &client,
            "projA-example-sub",
            4,
            CancellationToken::new(),
        )
        .await?;
        assert_eq!(start.elapsed(), CONCURRENT_RECEIVE_DURATION);

        assert_eq!(sorted(got), vec!["m1", "m2", "m3"]);
        let output = String::from_utf8(sink)?;
        let lines = sorted(output.lines().map(str::to_string).collect());
        assert_eq!(
            lines,
            vec!["Got message: m1", "Got message: m2", "Got message: m3"]
        );
        assert_eq!(sorted(fake.acked()), vec!["m1", "m2", "m3"]);
        assert_eq!(fake.outstanding(), 0);
        assert_eq!(fake.sessions()[0].subscription, "projA-example-sub");
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callbacks_in_parallel() -> anyhow::Result<()> {
        const COUNT: usize = 300;
        let payloads: Vec<String> = (0..COUNT).map(|i| format!("message-{i:03}")).collect();
        let fake = FakeSubscriber::new()
            .with_messages(payloads.clone())
            .with_max_batch(1);
        let client = Subscriber::from_stub(fake.clone());

        let mut sink = Vec::new();
        let got = collect_concurrent(
            &mut sink,
            &client,
            "projA-example-sub",
            4,
            CancellationToken::new(),
        )
        .await?;

        assert_eq!(sorted(got), payloads);
        let output = String::from_utf8(sink)?;
        assert_eq!(output.lines().count(), COUNT);
        let lines = sorted(output.lines().map(str::to_string).collect());
        let want: Vec<String> = payloads.iter().map(|p| format!("Got message: {p}")).collect();
        assert_eq!(lines, want);
        assert_eq!(sorted(fake.acked()), payloads);
        assert_eq!(fake.outstanding(), 0);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_with_zero_workers_is_serial()-> anyhow::Result<()> {
        let fake = FakeSubscriber::new().with_messages(["a", "b", "c"]);
        let client = Subscriber::from_stub(fake.clone());
        let got = collect_concurrent(
            &mut std::io::sink(),
            &client,
            SUBSCRIPTION,
            0,
            CancellationToken::new(),
        )
        .await?;
        assert_eq!(got, vec!["a", "b", "c"]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_sync_respects_flow_control() -> anyhow::Result<()> {
        let payloads: Vec<String> = (0..150).map(|i| format!("message-{i:03}")).collect();
        let fake = FakeSubscriber::new().with_messages(payloads.clone());
        let client = Subscriber::from_stub(fake.clone());

        let start = Instant::now();
        let mut sink = Vec::new();
        let got =
            collect_bounded_sync(&mut sink, &client, SUBSCRIPTION, CancellationToken::new())
                .await?;
        let elapsed = start.elapsed();
        assert!(elapsed >= SYNC_RECEIVE_DURATION, "{elapsed:?}");
        assert!(elapsed < SYNC_RECEIVE_DURATION + Duration::from_secs(1), "{elapsed:?}");

        assert_eq!(got, payloads);
        assert_eq!(fake.acked().len(), 150);
        assert_eq!(fake.violations(), 0);
        let peak = fake.peak_outstanding();
        assert!(peak <= SYNC_MAX_OUTSTANDING_MESSAGES as usize, "peak={peak}");

        let output = String::from_utf8(sink)?;
        assert_eq!(output.lines().count(), 150);
        assert_eq!(output.lines().next(), Some("Got message: \"message-000\""));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn no_messages_waits_for_the_deadline() -> anyhow::Result<()> {
        let fake = FakeSubscriber::new();
        let client = Subscriber::from_stub(fake.clone());

        let start = Instant::now();
        let mut sink = Vec::new();
        let got =
            collect_bounded_sync(&mut sink, &client, SUBSCRIPTION, CancellationToken::new())
                .await?;
        assert_eq!(start.elapsed(), SYNC_RECEIVE_DURATION);
        assert!(got.is_empty(), "{got:?}");
        assert!(sink.is_empty());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn messages_published_during_the_session() -> anyhow::Result<()> {
        let fake = FakeSubscriber::new().with_messages(["early"]);
        let client = Subscriber::from_stub(fake.clone());

        let publisher = {
            let fake = fake.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                fake.publish("late");
            })
        };
        let got = collect_concurrent(
            &mut std::io::sink(),
            &client,
            SUBSCRIPTION,
            2,
            CancellationToken::new(),
        )
        .await?;
        publisher.await?;
        assert_eq!(got, vec!["early", "late"]);
        Ok(())
    }

    #[tokio::test]
    async fn setup_failure_short_circuits() {
        let fake = FakeSubscriber::new()
            .with_messages(["m1"])
            .fail_open(Status::default().set_code(Code::PermissionDenied));
        let client = Subscriber::from_stub(fake.clone());

        let mut sink = Vec::new();
        let err = collect_concurrent(&mut sink, &client, SUBSCRIPTION, 4, CancellationToken::new())
            .await;
        assert!(matches!(&err, Err(e) if e.is_setup()), "{err:?}");
        let code = err.as_ref().err().and_then(|e| e.status()).map(|s| s.code);
        assert_eq!(code, Some(Code::PermissionDenied));
        assert_eq!(fake.pull_count(), 0);
        assert_eq!(fake.pending(), 1);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn empty_subscription_is_a_setup_error() {
        let fake = FakeSubscriber::new();
        let client = Subscriber::from_stub(fake.clone());
        let err = collect_bounded_sync(&mut std::io::sink(), &client, "", CancellationToken::new())
            .await;
        assert!(matches!(&err, Err(e) if e.is_setup()), "{err:?}");
        assert!(fake.sessions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pull_failure() {
        let fake = FakeSubscriber::new()
            .with_messages(["m1"])
            .fail_pull(Status::default().set_code(Code::Unavailable));
        let client = Subscriber::from_stub(fake.clone());

        let start = Instant::now();
        let err = collect_concurrent(
            &mut std::io::sink(),
            &client,
            SUBSCRIPTION,
            4,
            CancellationToken::new(),
        )
        .await;
        assert!(matches!(&err, Err(e) if e.is_receive()), "{err:?}");
        let code = err.as_ref().err().and_then(|e| e.status()).map(|s| s.code);
        assert_eq!(code, Some(Code::Unavailable));
        // Failures end the session before the deadline.
        assert!(start.elapsed() < CONCURRENT_RECEIVE_DURATION);
    }

    #[tokio::test(start_paused = true)]
    async fn caller_cancellation_returns_early() -> anyhow::Result<()> {
        let fake = FakeSubscriber::new().with_messages(["m1", "m2"]);
        let client = Subscriber::from_stub(fake.clone());

        let cancel = CancellationToken::new();
        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                cancel.cancel();
            })
        };
        let start = Instant::now();
        let got = collect_concurrent(&mut std::io::sink(), &client, SUBSCRIPTION, 2, cancel)
            .await?;
        canceller.await?;
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert_eq!(sorted(got), vec!["m1", "m2"]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_start() -> anyhow::Result<()> {
        let fake = FakeSubscriber::new().with_messages(["m1"]);
        let client = Subscriber::from_stub(fake.clone());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let start = Instant::now();
        let got = collect_bounded_sync(&mut std::io::sink(), &client, SUBSCRIPTION, cancel).await?;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(got.is_empty(), "{got:?}");
        assert_eq!(fake.pending(), 1);
        Ok(())
    }
}
