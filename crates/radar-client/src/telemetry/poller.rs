// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Fixed-cadence live telemetry poller.
//!
//! One request is outstanding at a time: the loop awaits each fetch before
//! waiting for the next tick, and ticks missed during a slow request are
//! skipped rather than bunched. Every request is stamped with a monotonically
//! increasing sequence number so consumers can discard stale snapshots.
//! Failures are logged and the cycle is skipped; there is no backoff.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::Snapshot;
use crate::api::DashboardApi;

/// Configuration for the telemetry poller.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay between poll cycles.
    pub interval: Duration,
    /// Channel buffer size for produced snapshots.
    pub buffer_size: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            buffer_size: 16,
        }
    }
}

/// Handle to a background telemetry poll loop.
pub struct Poller {
    snapshot_rx: mpsc::Receiver<Snapshot>,
    cancel_token: CancellationToken,
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("cancel_token", &self.cancel_token)
            .finish_non_exhaustive()
    }
}

impl Poller {
    /// Spawn the poll loop on the current tokio runtime.
    #[must_use]
    pub fn spawn<A>(api: Arc<A>, config: PollerConfig) -> Self
    where
        A: DashboardApi + Send + Sync + 'static,
    {
        let (snapshot_tx, snapshot_rx) = mpsc::channel(config.buffer_size);
        let cancel_token = CancellationToken::new();
        let task_cancel = cancel_token.clone();

        tokio::spawn(async move {
            poll_loop(api, snapshot_tx, task_cancel, config.interval).await;
        });

        Self {
            snapshot_rx,
            cancel_token,
        }
    }

    /// Receive the next snapshot.
    ///
    /// Returns `None` once the loop has stopped.
    pub async fn recv(&mut self) -> Option<Snapshot> {
        self.snapshot_rx.recv().await
    }

    /// Stop polling.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn poll_loop<A>(
    api: Arc<A>,
    snapshot_tx: mpsc::Sender<Snapshot>,
    cancel_token: CancellationToken,
    interval: Duration,
) where
    A: DashboardApi + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut sequence: u64 = 0;

    info!("[telemetry] polling every {} ms", interval.as_millis());

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            () = cancel_token.cancelled() => {
                info!("[telemetry] poller cancelled");
                return;
            }
        }

        sequence += 1;

        let result = tokio::select! {
            result = api.fetch_live() => result,
            () = cancel_token.cancelled() => {
                info!("[telemetry] poller cancelled mid-request");
                return;
            }
        };

        match result {
            Ok(records) => {
                debug!("[telemetry] poll {} returned {} aircraft", sequence, records.len());
                if snapshot_tx
                    .send(Snapshot::new(sequence, records))
                    .await
                    .is_err()
                {
                    return; // Receiver dropped
                }
            }
            Err(e) => {
                warn!("[telemetry] poll {} failed, keeping last state: {}", sequence, e);
            }
        }
    }
}
