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

//! Receive messages from pull subscriptions.

/// Handlers for acknowledging or rejecting messages.
pub mod handler;

/// Defines the return interface for
/// [Receive::start][crate::builder::subscriber::Receive::start].
pub mod session;

mod ack_loop;
mod ack_state;
pub(super) mod builder;
pub(super) mod client;
mod deadline;
mod flow_control;
pub(super) mod options;
mod pull;
mod receive;
mod worker;
