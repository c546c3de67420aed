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

//! Audit Sink Trait and Error Types
//!
//! The [`AuditSink`] trait is the append-only boundary where audit records
//! become durable. The delivery loop writes one record per accepted event,
//! in event order; no update, upsert or delete semantics are required of an
//! implementation.
//!
//! # Error Handling
//!
//! [`SinkError`] classifies failures for callers that wrap the delivery
//! loop with their own retry policy. The loop itself never retries: a
//! rejected write terminates delivery and surfaces the error. The
//! [`SinkError::is_retryable`] classification exists so a wrapping caller
//! can decide whether restarting the loop is worthwhile.
//!
//! # Implementing a Sink
//!
//! ```rust
//! use scrivano_core::record::AuditRecord;
//! use scrivano_core::sink::{AuditSink, SinkError};
//! use async_trait::async_trait;
//!
//! struct StdoutSink;
//!
//! #[async_trait]
//! impl AuditSink for StdoutSink {
//!     async fn insert(&mut self, record: AuditRecord) -> Result<(), SinkError> {
//!         println!("{:?} on {}", record.operation, record.document_path);
//!         Ok(())
//!     }
//! }
//! ```

use crate::record::AuditRecord;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors that can occur when persisting an audit record.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink rejected the write.
    #[error("write rejected: {message}")]
    Write {
        /// Human-readable error message
        message: String,
        /// Whether a wrapping caller may reasonably retry
        retryable: bool,
        /// The underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The record could not be encoded for the sink.
    ///
    /// Non-retryable: the same record will fail the same way.
    #[error("serialization failed: {message}")]
    Serialization {
        /// Human-readable error message
        message: String,
        /// The underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The connection to the sink failed.
    #[error("sink connection failed: {message}")]
    Connection {
        /// Human-readable error message
        message: String,
        /// The underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl SinkError {
    /// Creates a write error from any error type.
    #[must_use]
    pub fn write(source: impl std::error::Error + Send + Sync + 'static, retryable: bool) -> Self {
        Self::Write {
            message: source.to_string(),
            retryable,
            source: Some(Box::new(source)),
        }
    }

    /// Creates a write error with a custom message.
    #[must_use]
    pub fn write_msg(message: impl Into<String>, retryable: bool) -> Self {
        Self::Write {
            message: message.into(),
            retryable,
            source: None,
        }
    }

    /// Creates a serialization error from any error type.
    #[must_use]
    pub fn serialization(
        source: impl std::error::Error + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> Self {
        Self::Serialization {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a connection error from any error type.
    #[must_use]
    pub fn connection(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Connection {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns whether a wrapping caller may reasonably retry after this
    /// error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection { .. } => true,
            Self::Serialization { .. } => false,
            Self::Write { retryable, .. } => *retryable,
        }
    }
}

/// Append-only destination for audit records.
///
/// Implementations must preserve the order in which `insert` is called;
/// the delivery loop relies on this for its ordering guarantee.
#[async_trait]
pub trait AuditSink: Send {
    /// Persists one audit record.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the record cannot be made durable. The
    /// delivery loop propagates the error without retrying.
    async fn insert(&mut self, record: AuditRecord) -> Result<(), SinkError>;

    /// Releases sink resources.
    ///
    /// Idempotent: calling this more than once has the same observable
    /// effect as calling it once.
    async fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MockSinkState {
    records: Vec<AuditRecord>,
    close_count: usize,
}

/// An in-memory sink for tests.
///
/// Records inserts in order and counts closes. Cloning the sink shares its
/// state, so a clone kept by the test can inspect what the delivery loop
/// wrote after consuming the original.
///
/// # Examples
///
/// ```rust
/// use scrivano_core::sink::{AuditSink, MockSink};
/// # async fn example() -> Result<(), scrivano_core::sink::SinkError> {
/// let mut sink = MockSink::new();
/// let probe = sink.clone();
///
/// sink.close().await?;
/// sink.close().await?;
/// assert_eq!(probe.close_count(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockSink {
    state: Arc<Mutex<MockSinkState>>,
    fail_writes: bool,
}

impl MockSink {
    /// Creates a new mock sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the mock to reject all writes.
    #[must_use]
    pub fn with_write_failures(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Returns all records written so far, in insertion order.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.lock_state().records.clone()
    }

    /// Returns the number of records written.
    #[must_use]
    pub fn total_records_written(&self) -> usize {
        self.lock_state().records.len()
    }

    /// Returns how many times `close` was called.
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.lock_state().close_count
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, MockSinkState> {
        // A poisoned lock only means a test panicked mid-assertion; the
        // state itself is still inspectable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl AuditSink for MockSink {
    async fn insert(&mut self, record: AuditRecord) -> Result<(), SinkError> {
        if self.fail_writes {
            return Err(SinkError::write_msg("simulated write failure", true));
        }

        self.lock_state().records.push(record);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        self.lock_state().close_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::OperationType;
    use bson::doc;
    use chrono::Utc;

    fn sample_record() -> AuditRecord {
        AuditRecord {
            operation: OperationType::Insert,
            full_document: Some(doc! { "a": 1 }),
            full_document_before: None,
            updated_fields: None,
            change_date: Utc::now(),
            document_path: "db.coll".into(),
            document_id: doc! { "_id": 1 },
        }
    }

    #[tokio::test]
    async fn mock_sink_records_inserts_in_order() {
        let mut sink = MockSink::new();
        let probe = sink.clone();

        sink.insert(sample_record()).await.unwrap();
        sink.insert(sample_record()).await.unwrap();

        assert_eq!(probe.total_records_written(), 2);
    }

    #[tokio::test]
    async fn mock_sink_simulates_write_failures() {
        let mut sink = MockSink::new().with_write_failures();

        let err = sink.insert(sample_record()).await.unwrap_err();
        assert!(matches!(err, SinkError::Write { .. }));
        assert!(err.is_retryable());
        assert_eq!(sink.total_records_written(), 0);
    }

    #[tokio::test]
    async fn mock_sink_close_is_idempotent() {
        let mut sink = MockSink::new();

        sink.close().await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(sink.close_count(), 2);
    }

    #[test]
    fn sink_error_classification() {
        assert!(SinkError::connection(std::io::Error::other("refused")).is_retryable());
        assert!(!SinkError::serialization(std::io::Error::other("bad"), "encode").is_retryable());
        assert!(SinkError::write_msg("busy", true).is_retryable());
        assert!(!SinkError::write_msg("denied", false).is_retryable());
    }
}
