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

//! The messages exchanged with the delivery service.

use std::collections::HashMap;

/// A message received from a subscription.
///
/// The message is owned by the application once it is delivered. The
/// acknowledgement state is tracked separately, by the
/// [Handler][crate::subscriber::handler::Handler] delivered with it.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct Message {
    /// The message payload.
    pub data: bytes::Bytes,

    /// Attributes for this message.
    pub attributes: HashMap<String, String>,

    /// The ID of this message, assigned by the service when it is published.
    pub message_id: String,

    /// The ordering key, empty if the message was published without one.
    pub ordering_key: String,
}

impl Message {
    /// Creates a new, empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of [data][Message::data].
    ///
    /// # Example
    /// ```
    /// # use pubsub_collector::model::Message;
    /// let m = Message::new().set_data("hello");
    /// assert_eq!(m.data, "hello");
    /// ```
    pub fn set_data<T: Into<bytes::Bytes>>(mut self, v: T) -> Self {
        self.data = v.into();
        self
    }

    /// Sets the value of [attributes][Message::attributes].
    pub fn set_attributes<T, K, V>(mut self, v: T) -> Self
    where
        T: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.attributes = v.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// Sets the value of [message_id][Message::message_id].
    pub fn set_message_id<T: Into<String>>(mut self, v: T) -> Self {
        self.message_id = v.into();
        self
    }

    /// Sets the value of [ordering_key][Message::ordering_key].
    pub fn set_ordering_key<T: Into<String>>(mut self, v: T) -> Self {
        self.ordering_key = v.into();
        self
    }
}

/// A message and the ack ID used to acknowledge it.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct ReceivedMessage {
    /// The ID used to acknowledge (or reject) this message.
    pub ack_id: String,

    /// The message.
    ///
    /// The field is always present in well-formed responses. Entries without a
    /// message are skipped by the subscriber.
    pub message: Option<Message>,

    /// How many times the service attempted to deliver this message.
    pub delivery_attempt: i32,
}

impl ReceivedMessage {
    /// Creates a new, empty instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of [ack_id][ReceivedMessage::ack_id].
    pub fn set_ack_id<T: Into<String>>(mut self, v: T) -> Self {
        self.ack_id = v.into();
        self
    }

    /// Sets the value of [message][ReceivedMessage::message].
    pub fn set_message<T: Into<Message>>(mut self, v: T) -> Self {
        self.message = Some(v.into());
        self
    }

    /// Sets the value of [delivery_attempt][ReceivedMessage::delivery_attempt].
    pub fn set_delivery_attempt<T: Into<i32>>(mut self, v: T) -> Self {
        self.delivery_attempt = v.into();
        self
    }
}

/// The request used to open a session on a subscription.
///
/// The session carries the flow control settings, the service uses them to
/// bound the number of messages delivered but not yet acknowledged.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct OpenSessionRequest {
    /// The subscription name, e.g. `projects/p/subscriptions/s`.
    pub subscription: String,

    /// A unique identifier for this client session.
    pub client_id: String,

    /// If true, messages are delivered by a single, serialized pull path.
    pub synchronous: bool,

    /// Flow control limit, a value <= 0 disables the limit.
    pub max_outstanding_messages: i64,
}

impl OpenSessionRequest {
    /// Creates a new, empty instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of [subscription][OpenSessionRequest::subscription].
    pub fn set_subscription<T: Into<String>>(mut self, v: T) -> Self {
        self.subscription = v.into();
        self
    }

    /// Sets the value of [client_id][OpenSessionRequest::client_id].
    pub fn set_client_id<T: Into<String>>(mut self, v: T) -> Self {
        self.client_id = v.into();
        self
    }

    /// Sets the value of [synchronous][OpenSessionRequest::synchronous].
    pub fn set_synchronous<T: Into<bool>>(mut self, v: T) -> Self {
        self.synchronous = v.into();
        self
    }

    /// Sets the value of
    /// [max_outstanding_messages][OpenSessionRequest::max_outstanding_messages].
    pub fn set_max_outstanding_messages<T: Into<i64>>(mut self, v: T) -> Self {
        self.max_outstanding_messages = v.into();
        self
    }
}

/// Request for a single pull.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct PullRequest {
    /// The subscription to pull from.
    pub subscription: String,

    /// The maximum number of messages to return. Must be positive.
    pub max_messages: i32,
}

impl PullRequest {
    /// Creates a new, empty instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of [subscription][PullRequest::subscription].
    pub fn set_subscription<T: Into<String>>(mut self, v: T) -> Self {
        self.subscription = v.into();
        self
    }

    /// Sets the value of [max_messages][PullRequest::max_messages].
    pub fn set_max_messages<T: Into<i32>>(mut self, v: T) -> Self {
        self.max_messages = v.into();
        self
    }
}

/// Response for a single pull.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct PullResponse {
    /// The received messages, may be empty.
    pub received_messages: Vec<ReceivedMessage>,
}

impl PullResponse {
    /// Creates a new, empty instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of [received_messages][PullResponse::received_messages].
    pub fn set_received_messages<T, V>(mut self, v: T) -> Self
    where
        T: IntoIterator<Item = V>,
        V: Into<ReceivedMessage>,
    {
        self.received_messages = v.into_iter().map(Into::into).collect();
        self
    }
}

/// Request to acknowledge a batch of messages.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct AcknowledgeRequest {
    /// The subscription the messages were received from.
    pub subscription: String,

    /// The ack IDs to acknowledge.
    pub ack_ids: Vec<String>,
}

impl AcknowledgeRequest {
    /// Creates a new, empty instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of [subscription][AcknowledgeRequest::subscription].
    pub fn set_subscription<T: Into<String>>(mut self, v: T) -> Self {
        self.subscription = v.into();
        self
    }

    /// Sets the value of [ack_ids][AcknowledgeRequest::ack_ids].
    pub fn set_ack_ids<T, V>(mut self, v: T) -> Self
    where
        T: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.ack_ids = v.into_iter().map(Into::into).collect();
        self
    }
}

/// Request to change the ack deadline of a batch of messages.
///
/// A deadline of zero rejects (nacks) the messages, making them available for
/// redelivery.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct ModifyAckDeadlineRequest {
    /// The subscription the messages were received from.
    pub subscription: String,

    /// The ack IDs to modify.
    pub ack_ids: Vec<String>,

    /// The new ack deadline, in seconds.
    pub ack_deadline_seconds: i32,
}

impl ModifyAckDeadlineRequest {
    /// Creates a new, empty instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of [subscription][ModifyAckDeadlineRequest::subscription].
    pub fn set_subscription<T: Into<String>>(mut self, v: T) -> Self {
        self.subscription = v.into();
        self
    }

    /// Sets the value of [ack_ids][ModifyAckDeadlineRequest::ack_ids].
    pub fn set_ack_ids<T, V>(mut self, v: T) -> Self
    where
        T: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.ack_ids = v.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the value of
    /// [ack_deadline_seconds][ModifyAckDeadlineRequest::ack_deadline_seconds].
    pub fn set_ack_deadline_seconds<T: Into<i32>>(mut self, v: T) -> Self {
        self.ack_deadline_seconds = v.into();
        self
    }
}
