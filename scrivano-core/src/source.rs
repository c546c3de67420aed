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

//! Event Source Boundary
//!
//! The delivery loop consumes change events through two small traits:
//!
//! - [`EventSource`] opens a filtered stream of events for a
//!   [`SubscriptionSpec`], applying the spec's image-inclusion flags at
//!   subscribe time.
//! - [`EventStream`] is a [`futures::Stream`] of already-filtered events.
//!   End-of-stream is expressed as `None`; mid-stream failures are
//!   `Err(SourceError)` items. `close` releases the underlying cursor and
//!   is idempotent.
//!
//! There is no automatic reconnect or resume in this boundary: a
//! [`SourceError`] ends the stream, and a caller needing resilience wraps
//! the loop with its own resubscribe policy.

use crate::event::ChangeEvent;
use crate::filter::SubscriptionSpec;
use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;

/// Errors reported by an event source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source connection failed mid-stream or at subscribe time.
    #[error("source connection failed: {message}")]
    Connection {
        /// Human-readable error message
        message: String,
        /// The underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A received notification could not be decoded into a [`ChangeEvent`].
    #[error("event conversion failed: {0}")]
    Conversion(String),
}

impl SourceError {
    /// Creates a connection error from any error type.
    #[must_use]
    pub fn connection(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Connection {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a connection error with a custom message.
    #[must_use]
    pub fn connection_msg(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a conversion error with a custom message.
    #[must_use]
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion(message.into())
    }
}

/// A stream of filtered change events.
///
/// Yields `Ok(ChangeEvent)` per notification, `Err(SourceError)` on a
/// mid-stream failure and `None` once the source is exhausted.
#[async_trait]
pub trait EventStream:
    Stream<Item = Result<ChangeEvent, SourceError>> + Unpin + Send
{
    /// Releases the underlying cursor.
    ///
    /// Idempotent: calling this more than once has the same observable
    /// effect as calling it once. After the first call the stream yields
    /// `None`.
    async fn close(&mut self);
}

/// Opens filtered event streams against a tracked collection.
#[async_trait]
pub trait EventSource {
    /// The stream type produced by this source.
    type Stream: EventStream;

    /// Subscribes to change events matching the given specification.
    ///
    /// The spec's accepted kinds become the source-side filter predicate
    /// and its image flags configure post-/pre-image materialization.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the subscription cannot be established.
    async fn subscribe(&self, spec: &SubscriptionSpec) -> Result<Self::Stream, SourceError>;
}
