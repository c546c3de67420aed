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

//! Audit Record Construction
//!
//! An [`AuditRecord`] is the durable projection of one accepted change
//! event. Construction is a pure 1:1 mapping: every accepted event yields
//! exactly one record, and the caller is responsible for persisting it.
//!
//! Images absent on the source event are kept as explicit `None` and
//! serialize as BSON `null`, never as an omitted field, so an audit reader
//! can distinguish "not applicable" from "not recorded".
//!
//! The event's ordering token is converted to an absolute timestamp from
//! its seconds component. The sub-second increment only orders events
//! within the same second and is discarded here; callers that later need
//! tie-break precision must retain the raw token alongside the record.

use crate::event::{ChangeEvent, OperationType};
use bson::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while building an [`AuditRecord`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A field required on every accepted event was absent.
    ///
    /// Non-retryable: the event cannot be audited and no partial record
    /// is produced.
    #[error("required field missing from change event: {0}")]
    MissingRequiredField(&'static str),
}

/// The durable audit projection of one change event.
///
/// Field names follow the audit collection's document layout: absent
/// images serialize as explicit `null` and `changeDate` is stored as a
/// BSON datetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Kind of the audited operation
    #[serde(rename = "operationType")]
    pub operation: OperationType,

    /// Post-image of the document, or `null` when not available
    #[serde(rename = "fullDocument")]
    pub full_document: Option<Document>,

    /// Pre-image of the document, or `null` when not available
    #[serde(rename = "fullDocumentBefore")]
    pub full_document_before: Option<Document>,

    /// Changed fields of an update, or `null` for other kinds
    #[serde(rename = "updatedFields")]
    pub updated_fields: Option<Document>,

    /// Absolute point in time of the change, derived from the source's
    /// ordering token (second precision)
    #[serde(
        rename = "changeDate",
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub change_date: DateTime<Utc>,

    /// Fully qualified source namespace ("database.collection")
    #[serde(rename = "documentPath")]
    pub document_path: String,

    /// Key of the affected document, copied verbatim
    #[serde(rename = "documentId")]
    pub document_id: Document,
}

impl AuditRecord {
    /// Maps one accepted change event to one audit record.
    ///
    /// The event is expected to have passed the subscription filter, so
    /// its operation kind is one of insert, update or delete.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingRequiredField`] if the event carries no
    /// namespace or no document key. Nothing is partially constructed.
    pub fn from_event(event: &ChangeEvent) -> Result<Self, BuildError> {
        let namespace = event
            .namespace
            .as_ref()
            .ok_or(BuildError::MissingRequiredField("namespace"))?;

        let document_id = event
            .document_key
            .clone()
            .ok_or(BuildError::MissingRequiredField("document key"))?;

        // The token's seconds component is a u32, which chrono always
        // represents; the fallback is unreachable.
        let change_date = DateTime::from_timestamp(i64::from(event.cluster_time.time), 0)
            .unwrap_or(DateTime::UNIX_EPOCH);

        Ok(Self {
            operation: event.operation.clone(),
            full_document: event.full_document.clone(),
            full_document_before: event.full_document_before_change.clone(),
            updated_fields: event.updated_fields.clone(),
            change_date,
            document_path: namespace.full_name(),
            document_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Namespace;
    use bson::{doc, Timestamp};

    fn insert_event() -> ChangeEvent {
        ChangeEvent {
            operation: OperationType::Insert,
            namespace: Some(Namespace::new("WFAudit", "BTRequests")),
            document_key: Some(doc! { "_id": 5 }),
            full_document: Some(doc! { "a": 1 }),
            full_document_before_change: None,
            updated_fields: None,
            cluster_time: Timestamp {
                time: 1_700_000_000,
                increment: 3,
            },
        }
    }

    #[test]
    fn one_event_one_record() {
        let event = insert_event();

        let record = AuditRecord::from_event(&event).unwrap();

        assert_eq!(record.operation, OperationType::Insert);
        assert_eq!(record.full_document, Some(doc! { "a": 1 }));
        assert_eq!(record.full_document_before, None);
        assert_eq!(record.updated_fields, None);
        assert_eq!(record.document_path, "WFAudit.BTRequests");
        assert_eq!(record.document_id, doc! { "_id": 5 });
    }

    #[test]
    fn missing_document_key_fails_construction() {
        let mut event = insert_event();
        event.document_key = None;

        assert_eq!(
            AuditRecord::from_event(&event),
            Err(BuildError::MissingRequiredField("document key"))
        );
    }

    #[test]
    fn missing_namespace_fails_construction() {
        let mut event = insert_event();
        event.namespace = None;

        assert_eq!(
            AuditRecord::from_event(&event),
            Err(BuildError::MissingRequiredField("namespace"))
        );
    }

    #[test]
    fn change_date_discards_sub_second_increment() {
        let mut event = insert_event();
        event.cluster_time = Timestamp {
            time: 1_700_000_000,
            increment: 42,
        };

        let record = AuditRecord::from_event(&event).unwrap();

        assert_eq!(
            record.change_date,
            DateTime::from_timestamp(1_700_000_000, 0).unwrap()
        );
    }
}
