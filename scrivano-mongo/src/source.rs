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

//! MongoDB Change-Stream Event Source
//!
//! [`ChangeStreamSource`] opens a change stream against one watched
//! collection. The subscription spec's accepted kinds become a `$match`
//! aggregation stage evaluated server-side, and its image flags map to the
//! driver's full-document options:
//!
//! - post-image on update → `FullDocumentType::UpdateLookup`
//! - pre-image when available → `FullDocumentBeforeChangeType::WhenAvailable`
//!
//! The resulting [`MongoEventStream`] converts each driver event into a
//! [`ChangeEvent`] and ends on the first driver error. There is no
//! automatic resume: resubscribing (with or without a resume token) is the
//! caller's policy.

use async_trait::async_trait;
use bson::Document;
use futures::{Stream, StreamExt};
use mongodb::{
    change_stream::{event::ChangeStreamEvent, ChangeStream},
    options::{ChangeStreamOptions, FullDocumentBeforeChangeType, FullDocumentType},
    Collection,
};
use scrivano_core::event::{ChangeEvent, Namespace, OperationType};
use scrivano_core::filter::SubscriptionSpec;
use scrivano_core::source::{EventSource, EventStream, SourceError};
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, info};

/// An event source backed by one watched MongoDB collection.
pub struct ChangeStreamSource {
    collection: Collection<Document>,
}

impl ChangeStreamSource {
    /// Creates a source over the given collection.
    #[must_use]
    pub fn new(collection: Collection<Document>) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl EventSource for ChangeStreamSource {
    type Stream = MongoEventStream;

    async fn subscribe(&self, spec: &SubscriptionSpec) -> Result<MongoEventStream, SourceError> {
        let namespace = self.collection.namespace();
        info!(
            database = %namespace.db,
            collection = %namespace.coll,
            operations = ?spec.operations(),
            "opening change stream"
        );

        let stream = self
            .collection
            .watch()
            .pipeline(vec![spec.match_stage()])
            .with_options(subscribe_options(spec))
            .await
            .map_err(SourceError::connection)?;

        Ok(MongoEventStream {
            inner: Some(stream),
        })
    }
}

/// Maps the spec's image-inclusion flags to driver options.
fn subscribe_options(spec: &SubscriptionSpec) -> ChangeStreamOptions {
    let mut options = ChangeStreamOptions::default();

    if spec.include_post_image_on_update() {
        options.full_document = Some(FullDocumentType::UpdateLookup);
    }

    if spec.include_pre_image() {
        options.full_document_before_change = Some(FullDocumentBeforeChangeType::WhenAvailable);
    }

    options
}

/// A filtered stream of change events over a MongoDB cursor.
///
/// Ends (`None`) once the cursor is exhausted or after the first driver
/// error has been yielded. `close` drops the cursor; later calls are
/// no-ops.
pub struct MongoEventStream {
    inner: Option<ChangeStream<ChangeStreamEvent<Document>>>,
}

impl Stream for MongoEventStream {
    type Item = Result<ChangeEvent, SourceError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        let Some(stream) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match stream.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(event))) => Poll::Ready(Some(convert(event))),
            Poll::Ready(Some(Err(e))) => {
                // The cursor is not reusable after a driver error; release
                // it and surface the failure once.
                this.inner = None;
                Poll::Ready(Some(Err(SourceError::connection(e))))
            }
            Poll::Ready(None) => {
                this.inner = None;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[async_trait]
impl EventStream for MongoEventStream {
    async fn close(&mut self) {
        if self.inner.take().is_some() {
            info!("change stream cursor released");
        } else {
            debug!("change stream already closed");
        }
    }
}

/// Converts a driver event into the core event model.
fn convert(event: ChangeStreamEvent<Document>) -> Result<ChangeEvent, SourceError> {
    use mongodb::change_stream::event::OperationType as MongoOpType;

    let operation = match event.operation_type {
        MongoOpType::Insert => OperationType::Insert,
        MongoOpType::Update => OperationType::Update,
        MongoOpType::Delete => OperationType::Delete,
        MongoOpType::Replace => OperationType::Other("replace".into()),
        MongoOpType::Invalidate => OperationType::Other("invalidate".into()),
        MongoOpType::Drop => OperationType::Other("drop".into()),
        MongoOpType::DropDatabase => OperationType::Other("dropDatabase".into()),
        MongoOpType::Rename => OperationType::Other("rename".into()),
        other => OperationType::Other(format!("{other:?}")),
    };

    let namespace = event
        .ns
        .and_then(|ns| ns.coll.map(|coll| Namespace::new(ns.db, coll)));

    // The commit-order token is what makes audit records orderable;
    // an event without one cannot be audited meaningfully.
    let cluster_time = event
        .cluster_time
        .ok_or_else(|| SourceError::conversion("change event missing clusterTime"))?;

    Ok(ChangeEvent {
        operation,
        namespace,
        document_key: event.document_key,
        full_document: event.full_document,
        full_document_before_change: event.full_document_before_change,
        updated_fields: event.update_description.map(|ud| ud.updated_fields),
        cluster_time,
    })
}
