// Copyright 2026 Scrivano Contributors
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
//
// SPDX-License-Identifier: Apache-2.0

//! Delivery Loop
//!
//! The [`Replicator`] drives the single sequential flow of control between
//! an event stream and an audit sink. It has two states, listening and
//! closed:
//!
//! - **Listening**: await the next event (the sole suspension point, no
//!   timeout), build exactly one [`AuditRecord`], persist it, then request
//!   the next event. At most one event is in flight and records reach the
//!   sink in the exact order their events were received.
//! - **Closed**: terminal. Reached on source exhaustion, on the first
//!   error from source, builder or sink, or on an external shutdown
//!   signal. The stream's cursor and the sink are released on every exit
//!   path.
//!
//! A build or persist failure terminates the loop and surfaces to the
//! caller; per-record retry is a caller-side extension, not an implicit
//! behavior of the loop.
//!
//! # Example
//!
//! ```rust,no_run
//! use scrivano_core::replicator::Replicator;
//! use scrivano_core::sink::MockSink;
//! use tokio::sync::broadcast;
//! # async fn example(stream: impl scrivano_core::source::EventStream) -> Result<(), Box<dyn std::error::Error>> {
//! let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//! let replicator = Replicator::new(stream, MockSink::new());
//! let stats = replicator.run(shutdown_rx).await?;
//! println!("{} events, {} records", stats.events_received, stats.records_written);
//! # Ok(())
//! # }
//! ```

use crate::record::{AuditRecord, BuildError};
use crate::sink::{AuditSink, SinkError};
use crate::source::{EventStream, SourceError};
use futures::StreamExt;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Errors that terminate the delivery loop.
///
/// All variants surface synchronously to the caller of
/// [`Replicator::run`]; none are swallowed.
#[derive(Debug, Error)]
pub enum ReplicatorError {
    /// The event source failed mid-stream.
    #[error("event source failed: {0}")]
    Source(#[from] SourceError),

    /// An accepted event could not be mapped to an audit record.
    #[error("audit record construction failed: {0}")]
    Build(#[from] BuildError),

    /// The sink rejected an audit record.
    #[error("audit sink rejected a record: {0}")]
    Sink(#[from] SinkError),
}

/// Counters for a delivery run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplicatorStats {
    /// Events received from the source
    pub events_received: u64,

    /// Audit records made durable
    pub records_written: u64,
}

/// The delivery loop between one event stream and one audit sink.
///
/// Both handles are owned exclusively for the duration of the run; no
/// other thread of control touches them.
pub struct Replicator<St, S> {
    stream: St,
    sink: S,
    stats: ReplicatorStats,
}

impl<St: EventStream, S: AuditSink> Replicator<St, S> {
    /// Creates a delivery loop over the given stream and sink.
    pub fn new(stream: St, sink: S) -> Self {
        Self {
            stream,
            sink,
            stats: ReplicatorStats::default(),
        }
    }

    /// Runs the loop until source exhaustion, the first error, or a
    /// shutdown signal.
    ///
    /// `shutdown` is a broadcast receiver; any message (or a lagged
    /// receiver) is treated as a shutdown request. Dropping all senders
    /// does not shut the loop down, so a caller that never needs external
    /// shutdown can simply drop its sender. Shutdown stops the loop at
    /// its suspension point: an event already received is fully built and
    /// persisted first, and nothing partial is ever written.
    ///
    /// The stream cursor and the sink are released before this method
    /// returns, on every path. Both releases are idempotent.
    ///
    /// # Errors
    ///
    /// Returns the first [`ReplicatorError`] encountered. Resources have
    /// been released by the time the error is returned.
    pub async fn run(
        mut self,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<ReplicatorStats, ReplicatorError> {
        let outcome = self.deliver(shutdown).await;

        self.stream.close().await;
        match self.sink.close().await {
            Ok(()) => {}
            Err(e) if outcome.is_ok() => return Err(e.into()),
            Err(e) => {
                // Keep the original failure; the close error is secondary.
                warn!(error = %e, "sink close failed while unwinding");
            }
        }

        outcome.map(|()| self.stats)
    }

    async fn deliver(
        &mut self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ReplicatorError> {
        info!("delivery loop listening");
        let mut shutdown_open = true;

        loop {
            tokio::select! {
                signal = shutdown.recv(), if shutdown_open => match signal {
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        info!(
                            events = self.stats.events_received,
                            "shutdown requested, closing delivery loop"
                        );
                        return Ok(());
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        // No sender left; delivery continues until the
                        // source is exhausted.
                        shutdown_open = false;
                    }
                },

                next = self.stream.next() => match next {
                    Some(Ok(event)) => {
                        self.stats.events_received += 1;
                        debug!(
                            operation = ?event.operation,
                            namespace = event.full_namespace().as_deref().unwrap_or("<unknown>"),
                            "event received"
                        );

                        let record = AuditRecord::from_event(&event)?;
                        self.sink.insert(record).await?;
                        self.stats.records_written += 1;
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "event source failed");
                        return Err(e.into());
                    }
                    None => {
                        info!(
                            events = self.stats.events_received,
                            records = self.stats.records_written,
                            "event source exhausted"
                        );
                        return Ok(());
                    }
                },
            }
        }
    }

    /// Returns the counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> ReplicatorStats {
        self.stats
    }
}
