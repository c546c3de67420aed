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

//! MongoDB Audit-Collection Sink
//!
//! [`AuditCollectionSink`] appends one document per audit record with
//! `insert_one`. The collection is treated as append-only: no updates,
//! upserts or deletes are ever issued against it.

use async_trait::async_trait;
use bson::Document;
use mongodb::Collection;
use scrivano_core::record::AuditRecord;
use scrivano_core::sink::{AuditSink, SinkError};
use tracing::debug;

/// An append-only sink writing audit records to one MongoDB collection.
pub struct AuditCollectionSink {
    collection: Collection<Document>,
    closed: bool,
}

impl AuditCollectionSink {
    /// Creates a sink over the given collection.
    #[must_use]
    pub fn new(collection: Collection<Document>) -> Self {
        Self {
            collection,
            closed: false,
        }
    }
}

#[async_trait]
impl AuditSink for AuditCollectionSink {
    async fn insert(&mut self, record: AuditRecord) -> Result<(), SinkError> {
        debug!(
            operation = ?record.operation,
            path = %record.document_path,
            "writing audit record"
        );

        let document = bson::to_document(&record)
            .map_err(|e| SinkError::serialization(e, "failed to encode audit record"))?;

        self.collection.insert_one(document).await.map_err(|e| {
            let retryable = e.labels().iter().any(|l| l == "RetryableWriteError");
            SinkError::write(e, retryable)
        })?;

        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        // The driver closes its connections when the client is dropped;
        // this only guards the transition so repeated closes stay silent.
        if !self.closed {
            self.closed = true;
            debug!("audit sink closed");
        }
        Ok(())
    }
}
