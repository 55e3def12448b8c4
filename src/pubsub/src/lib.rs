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

//! Time-boxed, flow-controlled collection of messages from Pub/Sub pull
//! subscriptions.
//!
//! This crate contains a subscriber that pulls messages with a pool of
//! workers, bounds the number of outstanding messages, and acknowledges
//! messages in batches. The [collector] module builds on it to gather message
//! payloads for a fixed amount of time.
//!
//! The crate does not include a transport. Applications provide one by
//! implementing [stub::Stub]. The `fake` feature enables an in-memory
//! implementation, useful in tests.
//!
//! # Example
//! ```
//! # use pubsub_collector::client::Subscriber;
//! # async fn sample(client: Subscriber) -> anyhow::Result<()> {
//! use tokio_util::sync::CancellationToken;
//! let mut sink = Vec::new();
//! let payloads = pubsub_collector::collector::collect_concurrent(
//!     &mut sink,
//!     &client,
//!     "projects/my-project/subscriptions/my-subscription",
//!     4,
//!     CancellationToken::new(),
//! )
//! .await?;
//! println!("received {} messages", payloads.len());
//! # Ok(()) }
//! ```

pub mod collector;
pub mod error;
pub mod model;
pub mod stub;
pub mod subscriber;

#[cfg(any(test, feature = "fake"))]
pub mod fake;

pub use error::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

pub mod builder {
    pub mod subscriber {
        pub use crate::subscriber::builder::Receive;
    }
}

pub mod client {
    pub use crate::subscriber::client::Subscriber;
}

pub mod options {
    pub mod subscriber {
        pub use crate::subscriber::options::ReceiveSettings;
    }
}
