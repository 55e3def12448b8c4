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

//! Errors returned by the subscriber and the collectors.
//!
//! All fallible functions in this crate return [Error]. Most applications will
//! just return the error or log it. Applications that need to distinguish a
//! session that never started from one that failed mid-flight can use the
//! [is_setup()][Error::is_setup] and [is_receive()][Error::is_receive]
//! predicates, and query the [source][std::error::Error::source] for details.

/// The status types returned by the delivery service.
pub mod rpc;

use rpc::Status;
use std::error::Error as StdError;

type BoxError = Box<dyn StdError + Send + Sync>;

/// The core error returned by this crate.
///
/// # Example
/// ```
/// use pubsub_collector::Error;
/// use pubsub_collector::error::rpc::{Code, Status};
/// fn report(e: &Error) -> String {
///     match e {
///         e if e.is_setup() => format!("the session never started: {e}"),
///         e if e.is_receive() => format!("the session failed: {e}"),
///         e => format!("some other error: {e}"),
///     }
/// }
/// let e = Error::setup(Error::service(Status::default().set_code(Code::NotFound)));
/// assert!(report(&e).starts_with("the session never started"));
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<BoxError>,
}

#[derive(Debug)]
enum ErrorKind {
    Setup,
    Receive,
    Io,
    Service(Box<Status>),
}

impl Error {
    /// Creates an error representing a session that could not be opened.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use pubsub_collector::Error;
    /// let error = Error::setup("simulated connection failure");
    /// assert!(error.is_setup());
    /// assert!(error.source().is_some());
    /// ```
    pub fn setup<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Setup,
            source: Some(source.into()),
        }
    }

    /// The session with the delivery service could not be established.
    ///
    /// No messages were pulled, and the callback was never invoked.
    ///
    /// # Troubleshooting
    ///
    /// The most common causes are a missing subscription, or credentials
    /// without permission to consume from the subscription.
    pub fn is_setup(&self) -> bool {
        matches!(self.kind, ErrorKind::Setup)
    }

    /// Creates an error representing a receive loop that stopped abnormally.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use pubsub_collector::Error;
    /// let error = Error::receive("simulated pull failure");
    /// assert!(error.is_receive());
    /// assert!(error.source().is_some());
    /// ```
    pub fn receive<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Receive,
            source: Some(source.into()),
        }
    }

    /// The receive loop terminated for a reason other than its deadline or
    /// cancellation.
    ///
    /// Messages delivered before the failure were acknowledged, the results
    /// collected so far are discarded.
    pub fn is_receive(&self) -> bool {
        matches!(self.kind, ErrorKind::Receive)
    }

    /// Creates an error representing an I/O problem talking to the service.
    ///
    /// # Example
    /// ```
    /// use pubsub_collector::Error;
    /// let error = Error::io("connection reset");
    /// assert!(error.is_io());
    /// ```
    pub fn io<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Io,
            source: Some(source.into()),
        }
    }

    /// A problem reading from or writing to the network.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, ErrorKind::Io)
    }

    /// Creates an error with the status returned by the delivery service.
    ///
    /// # Example
    /// ```
    /// use pubsub_collector::Error;
    /// use pubsub_collector::error::rpc::{Code, Status};
    /// let status = Status::default().set_code(Code::NotFound).set_message("NOT FOUND");
    /// let error = Error::service(status.clone());
    /// assert_eq!(error.status(), Some(&status));
    /// ```
    pub fn service(status: Status) -> Self {
        Self {
            kind: ErrorKind::Service(Box::new(status)),
            source: None,
        }
    }

    /// The error status returned by the service, if any.
    ///
    /// Setup and receive errors wrap the error that caused them. This function
    /// looks through those wrappers.
    pub fn status(&self) -> Option<&Status> {
        match &self.kind {
            ErrorKind::Service(status) => Some(status.as_ref()),
            ErrorKind::Setup | ErrorKind::Receive => self
                .source
                .as_ref()
                .and_then(|e| e.downcast_ref::<Error>())
                .and_then(Error::status),
            ErrorKind::Io => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.kind, &self.source) {
            (ErrorKind::Setup, Some(e)) => write!(f, "cannot open the subscriber session: {e}"),
            (ErrorKind::Receive, Some(e)) => {
                write!(f, "the receive loop terminated with an error: {e}")
            }
            (ErrorKind::Io, Some(e)) => write!(f, "an I/O problem talking to the service: {e}"),
            (ErrorKind::Service(status), _) => write!(
                f,
                "the service reports an error with code {} described as: {}",
                status.code, status.message
            ),
            (_, None) => unreachable!("no constructor allows this"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// Describes why a receive loop stopped before its deadline.
///
/// These are returned as the [source][std::error::Error::source] of an
/// [Error] where [is_receive()][Error::is_receive] or
/// [is_setup()][Error::is_setup] is true.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ReceiveError {
    /// A worker task panicked, or was aborted by the runtime.
    #[error("a receive worker terminated abnormally: {0}")]
    WorkerFailed(#[source] tokio::task::JoinError),

    /// The subscription name is empty.
    #[error("the subscription name cannot be empty")]
    EmptySubscription,
}

#[cfg(test)]
mod tests {
    use super::rpc::Code;
    use super::*;

    fn not_found() -> Status {
        Status::default()
            .set_code(Code::NotFound)
            .set_message("missing subscription")
    }

    #[test]
    fn setup() {
        let error = Error::setup(Error::service(not_found()));
        assert!(error.is_setup(), "{error:?}");
        assert!(!error.is_receive(), "{error:?}");
        assert!(!error.is_io(), "{error:?}");
        assert_eq!(error.status(), Some(&not_found()));
        let source = error
            .source()
            .and_then(|e| e.downcast_ref::<Error>())
            .expect("source is an Error");
        assert_eq!(source.status(), Some(&not_found()));
        let fmt = error.to_string();
        assert!(fmt.contains("cannot open the subscriber session"), "{fmt}");
        assert!(fmt.contains("missing subscription"), "{fmt}");
    }

    #[test]
    fn receive() {
        let error = Error::receive(Error::io("connection reset"));
        assert!(error.is_receive(), "{error:?}");
        assert!(!error.is_setup(), "{error:?}");
        assert!(error.status().is_none(), "{error:?}");
        let fmt = error.to_string();
        assert!(fmt.contains("receive loop terminated"), "{fmt}");
        assert!(fmt.contains("connection reset"), "{fmt}");
    }

    #[test]
    fn io() {
        let error = Error::io("connection reset");
        assert!(error.is_io(), "{error:?}");
        assert!(error.source().is_some(), "{error:?}");
        assert!(error.status().is_none(), "{error:?}");
    }

    #[test]
    fn service() {
        let error = Error::service(not_found());
        assert_eq!(error.status(), Some(&not_found()));
        assert!(error.source().is_none(), "{error:?}");
        let fmt = error.to_string();
        assert!(fmt.contains("NOT_FOUND"), "{fmt}");
        assert!(fmt.contains("missing subscription"), "{fmt}");
    }

    #[test]
    fn receive_error_as_source() {
        let error = Error::setup(ReceiveError::EmptySubscription);
        let source = error
            .source()
            .and_then(|e| e.downcast_ref::<ReceiveError>());
        assert!(
            matches!(source, Some(ReceiveError::EmptySubscription)),
            "{error:?}"
        );
        assert!(error.status().is_none(), "{error:?}");
    }
}
