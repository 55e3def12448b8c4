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

pub mod collect_bounded_sync;
pub mod collect_concurrent;
pub mod quickstart_subscriber;

use pubsub_collector::client::Subscriber;
use pubsub_collector::fake::FakeSubscriber;

/// Installs a `tracing` subscriber that prints events to stderr.
///
/// The library only emits events, applications decide where they go.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .try_init();
}

/// Creates a client backed by an in-memory service holding `count` messages.
pub fn fake_client(count: usize) -> (Subscriber, FakeSubscriber) {
    let fake = FakeSubscriber::new().with_messages((0..count).map(|i| format!("message-{i}")));
    tracing::info!(count, "seeded the in-memory subscription");
    (Subscriber::from_stub(fake.clone()), fake)
}
