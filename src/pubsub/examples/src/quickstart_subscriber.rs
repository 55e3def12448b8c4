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

// [START pubsub_quickstart_subscriber]
use pubsub_collector::client::Subscriber;
use tokio_util::sync::CancellationToken;

pub async fn sample(client: &Subscriber, subscription_name: &str) -> anyhow::Result<usize> {
    // Terminate the example after 10 seconds. Applications typically process
    // messages indefinitely in a long-running loop.
    let mut session = client
        .receive(subscription_name)
        .set_timeout(std::time::Duration::from_secs(10))
        .start(CancellationToken::new());

    println!("listening for messages...");
    let mut count = 0;
    while let Some((message, handler)) = session.next().await.transpose()? {
        println!("received message: {message:?}");
        handler.ack();
        count += 1;
    }
    session.close().await;

    println!("done listening for messages");
    Ok(count)
}
// [END pubsub_quickstart_subscriber]
