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

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A reservation for one outstanding message.
///
/// The reservation is released when this value is dropped. The ack loop holds
/// on to it until the ack (or nack) for the message reaches the service.
#[derive(Debug)]
pub(super) struct Permit(#[allow(dead_code)] Option<OwnedSemaphorePermit>);

impl Permit {
    /// A permit that does not count against any limit.
    pub(super) fn unlimited() -> Self {
        Self(None)
    }
}

/// Bounds the number of messages delivered but not yet acknowledged.
///
/// All workers in a session share one controller, which is cheap to clone.
#[derive(Clone, Debug)]
pub(super) struct FlowController {
    // `None` means there is no limit.
    permits: Option<Arc<Semaphore>>,
}

impl FlowController {
    pub(super) fn new(max_outstanding_messages: i64) -> Self {
        let permits = usize::try_from(max_outstanding_messages)
            .ok()
            .filter(|max| *max > 0)
            .map(|max| Arc::new(Semaphore::new(max)));
        Self { permits }
    }

    /// Waits until at least one message may be delivered, then reserves as
    /// many as possible, up to `max`.
    ///
    /// Returns an empty vector only if `max` is zero.
    pub(super) async fn acquire(&self, max: usize) -> Vec<Permit> {
        let Some(semaphore) = &self.permits else {
            return (0..max).map(|_| Permit::unlimited()).collect();
        };
        if max == 0 {
            return Vec::new();
        }
        // We never close the semaphore, `acquire_owned()` cannot fail.
        let Ok(first) = semaphore.clone().acquire_owned().await else {
            return Vec::new();
        };
        let mut permits = vec![Permit(Some(first))];
        while permits.len() < max {
            match semaphore.clone().try_acquire_owned() {
                Ok(p) => permits.push(Permit(Some(p))),
                Err(_) => break,
            }
        }
        permits
    }

    /// The number of messages that may be delivered without waiting.
    #[cfg(test)]
    pub(super) fn available(&self) -> Option<usize> {
        self.permits.as_ref().map(|s| s.available_permits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Duration;

    #[tokio::test]
    async fn unlimited() {
        let flow = FlowController::new(0);
        assert_eq!(flow.available(), None);
        let permits = flow.acquire(500).await;
        assert_eq!(permits.len(), 500);

        let flow = FlowController::new(-10);
        assert_eq!(flow.available(), None);
        assert_eq!(flow.acquire(3).await.len(), 3);
    }

    #[tokio::test]
    async fn acquire_up_to_max() {
        let flow = FlowController::new(10);
        let first = flow.acquire(4).await;
        assert_eq!(first.len(), 4);
        assert_eq!(flow.available(), Some(6));

        let second = flow.acquire(100).await;
        assert_eq!(second.len(), 6);
        assert_eq!(flow.available(), Some(0));

        drop(first);
        assert_eq!(flow.available(), Some(4));
        drop(second);
        assert_eq!(flow.available(), Some(10));
    }

    #[tokio::test]
    async fn acquire_zero() {
        let flow = FlowController::new(10);
        assert!(flow.acquire(0).await.is_empty());
        assert_eq!(flow.available(), Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_waits_for_release() -> anyhow::Result<()> {
        let flow = FlowController::new(2);
        let mut held = flow.acquire(2).await;
        assert_eq!(held.len(), 2);

        let waiter = {
            let flow = flow.clone();
            tokio::spawn(async move { flow.acquire(2).await.len() })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        // Releasing a single permit unblocks the waiter, with a partial batch.
        held.pop();
        assert_eq!(waiter.await?, 1);
        Ok(())
    }
}
