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

// [START pubsub_subscriber_sync_pull]
use pubsub_collector::client::Subscriber;
use pubsub_collector::collector::collect_bounded_sync;
use tokio_util::sync::CancellationToken;

pub async fn sample(client: &Subscriber, subscription_name: &str) -> anyhow::Result<Vec<String>> {
    let payloads = collect_bounded_sync(
        &mut std::io::stdout(),
        client,
        subscription_name,
        CancellationToken::new(),
    )
    .await?;
    println!("received {} messages", payloads.len());
    Ok(payloads)
}
// [END pubsub_subscriber_sync_pull]
