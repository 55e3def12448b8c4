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

use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Spawns a task to cancel a session when its deadline elapses.
///
/// The deadline is computed when this function is called. With no `timeout`
/// the session only ends on cancellation, and no task is spawned.
///
/// The task exits early if `shutdown` is cancelled by someone else.
pub(super) fn spawn(
    shutdown: CancellationToken,
    timeout: Option<Duration>,
) -> Option<JoinHandle<()>> {
    let deadline = Instant::now() + timeout?;
    Some(tokio::spawn(async move {
        tokio::select! {
            _ = shutdown.cancelled() => {},
            _ = sleep_until(deadline) => {
                tracing::debug!("session deadline reached");
                shutdown.cancel();
            },
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cancels_at_deadline() -> anyhow::Result<()> {
        const TIMEOUT: Duration = Duration::from_secs(5);
        let start = Instant::now();
        let shutdown = CancellationToken::new();
        let handle = spawn(shutdown.clone(), Some(TIMEOUT)).expect("a task is spawned");

        shutdown.cancelled().await;
        assert_eq!(start.elapsed(), TIMEOUT);
        handle.await?;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn early_cancellation() -> anyhow::Result<()> {
        const TIMEOUT: Duration = Duration::from_secs(5);
        const DELTA: Duration = Duration::from_secs(1);
        let start = Instant::now();
        let shutdown = CancellationToken::new();
        let handle = spawn(shutdown.clone(), Some(TIMEOUT)).expect("a task is spawned");

        tokio::time::advance(DELTA).await;
        shutdown.cancel();
        handle.await?;

        // Verify that we did not wait for the full timeout.
        assert_eq!(start.elapsed(), DELTA);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn no_timeout() {
        let shutdown = CancellationToken::new();
        assert!(spawn(shutdown.clone(), None).is_none());
        tokio::time::advance(Duration::from_secs(3600)).await;
        assert!(!shutdown.is_cancelled());
    }
}
