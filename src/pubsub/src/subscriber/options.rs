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

/// The largest batch a single pull may request.
pub(crate) const MAX_PULL_MESSAGES: usize = 1000;

/// Options controlling how messages are received from a subscription.
///
/// # Example
/// ```
/// # use pubsub_collector::options::subscriber::ReceiveSettings;
/// let settings = ReceiveSettings::new()
///     .set_synchronous(true)
///     .set_max_outstanding_messages(100);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct ReceiveSettings {
    pub(crate) synchronous: bool,
    pub(crate) max_outstanding_messages: i64,
    pub(crate) num_workers: usize,
}

impl ReceiveSettings {
    /// Create a new instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns on synchronous delivery.
    ///
    /// In synchronous mode a single worker pulls messages and invokes the
    /// callback, one message at a time. Use it with
    /// [set_max_outstanding_messages()][Self::set_max_outstanding_messages] to
    /// strictly bound the number of messages held in memory.
    ///
    /// The [num_workers][Self::set_num_workers] setting is ignored in this mode.
    pub fn set_synchronous<V: Into<bool>>(mut self, v: V) -> Self {
        self.synchronous = v.into();
        self
    }

    /// The maximum number of messages delivered but not yet acknowledged.
    ///
    /// Use a value <= 0 to set no limit. The default is 1000 messages.
    pub fn set_max_outstanding_messages<V: Into<i64>>(mut self, v: V) -> Self {
        self.max_outstanding_messages = v.into();
        self
    }

    /// The number of workers pulling messages and running the callback.
    ///
    /// At most this many callbacks run at the same time. A value of 0 selects
    /// a single worker. The default is 10 workers.
    pub fn set_num_workers(mut self, v: usize) -> Self {
        self.num_workers = v;
        self
    }

    /// The number of workers actually started.
    pub(crate) fn worker_count(&self) -> usize {
        if self.synchronous {
            return 1;
        }
        self.num_workers.max(1)
    }

    /// The largest number of messages a single worker asks for in one pull.
    ///
    /// The flow control budget is split evenly across workers, so one worker
    /// cannot starve the others.
    pub(crate) fn pull_batch_size(&self) -> usize {
        if self.max_outstanding_messages <= 0 {
            return MAX_PULL_MESSAGES;
        }
        let max = usize::try_from(self.max_outstanding_messages).unwrap_or(MAX_PULL_MESSAGES);
        max.div_ceil(self.worker_count()).clamp(1, MAX_PULL_MESSAGES)
    }
}

impl std::default::Default for ReceiveSettings {
    fn default() -> Self {
        Self {
            synchronous: false,
            max_outstanding_messages: 1000,
            num_workers: 10,
        }
    }
}
