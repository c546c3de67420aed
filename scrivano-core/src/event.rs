//! Change-Stream Event Representation
//!
//! This module defines the event types that flow through the scrivano
//! delivery loop. Events describe a single mutation observed on a tracked
//! collection and are immutable once constructed by the event source.
//!
//! # Examples
//!
//! ```rust
//! use scrivano_core::event::{ChangeEvent, OperationType, Namespace};
//! use bson::{doc, Timestamp};
//!
//! let event = ChangeEvent {
//!     operation: OperationType::Insert,
//!     namespace: Some(Namespace::new("WFAudit", "BTRequests")),
//!     document_key: Some(doc! { "_id": 5 }),
//!     full_document: Some(doc! { "_id": 5, "amount": 120 }),
//!     full_document_before_change: None,
//!     updated_fields: None,
//!     cluster_time: Timestamp { time: 1_700_000_000, increment: 1 },
//! };
//!
//! assert!(event.is_insert());
//! assert_eq!(event.full_namespace().as_deref(), Some("WFAudit.BTRequests"));
//! ```

use bson::{Document, Timestamp};
use serde::{Deserialize, Serialize};

/// Change-stream operation kinds relevant to audit replication.
///
/// Only insert, update and delete are audited. Every other kind the source
/// may emit (replace, drop, invalidate, kinds introduced by newer server
/// versions) is preserved as [`OperationType::Other`] with its original
/// type string, so it can be logged without being mistaken for an audited
/// operation.
///
/// Operation kinds are categorical: they compare by equality only and have
/// no meaningful ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// A document was inserted into a collection
    Insert,

    /// A document was updated in place
    Update,

    /// A document was deleted from a collection
    Delete,

    /// Any operation kind outside the audited set
    ///
    /// Contains the original operation type string for logging.
    #[serde(untagged)]
    Other(String),
}

impl OperationType {
    /// Returns true if this is an insert operation.
    #[inline]
    pub fn is_insert(&self) -> bool {
        matches!(self, OperationType::Insert)
    }

    /// Returns true if this is an update operation.
    #[inline]
    pub fn is_update(&self) -> bool {
        matches!(self, OperationType::Update)
    }

    /// Returns true if this is a delete operation.
    #[inline]
    pub fn is_delete(&self) -> bool {
        matches!(self, OperationType::Delete)
    }

    /// Returns true if this kind falls outside the audited set.
    #[inline]
    pub fn is_other(&self) -> bool {
        matches!(self, OperationType::Other(_))
    }

    /// Returns the wire-format name of this operation kind.
    pub fn as_str(&self) -> &str {
        match self {
            OperationType::Insert => "insert",
            OperationType::Update => "update",
            OperationType::Delete => "delete",
            OperationType::Other(name) => name,
        }
    }
}

/// Fully qualified namespace (database + collection) of a mutated document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    /// Database name
    pub database: String,

    /// Collection name
    pub collection: String,
}

impl Namespace {
    /// Creates a new namespace from database and collection names.
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// Returns the fully qualified namespace as "database.collection".
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.database, self.collection)
    }
}

/// A single change notification received from the event source.
///
/// Which optional fields are populated depends on the operation kind and on
/// the subscription's image-inclusion flags:
///
/// - inserts always carry a post-image and never a pre-image or delta,
/// - updates may carry post-image, pre-image and delta,
/// - deletes may carry only a pre-image.
///
/// `cluster_time` is the source's raw ordering token (commit order, not
/// wall clock). The sub-second `increment` component exists solely to order
/// events within the same second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Kind of operation that occurred
    #[serde(rename = "operationType")]
    pub operation: OperationType,

    /// Namespace where the operation occurred
    ///
    /// The source may fail to report it; the audit record builder treats a
    /// missing namespace as a hard error.
    #[serde(rename = "ns", skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Namespace>,

    /// Key identifying the affected document, copied verbatim
    #[serde(rename = "documentKey", skip_serializing_if = "Option::is_none")]
    pub document_key: Option<Document>,

    /// Full state of the document after the mutation, if materialized
    #[serde(rename = "fullDocument", skip_serializing_if = "Option::is_none")]
    pub full_document: Option<Document>,

    /// Full state of the document before the mutation, if materialized
    #[serde(
        rename = "fullDocumentBeforeChange",
        skip_serializing_if = "Option::is_none"
    )]
    pub full_document_before_change: Option<Document>,

    /// Changed fields of an update operation
    #[serde(rename = "updatedFields", skip_serializing_if = "Option::is_none")]
    pub updated_fields: Option<Document>,

    /// Ordering token from the source's commit order
    #[serde(rename = "clusterTime")]
    pub cluster_time: Timestamp,
}

impl ChangeEvent {
    /// Returns true if this is an insert operation.
    #[inline]
    pub fn is_insert(&self) -> bool {
        self.operation.is_insert()
    }

    /// Returns true if this is an update operation.
    #[inline]
    pub fn is_update(&self) -> bool {
        self.operation.is_update()
    }

    /// Returns true if this is a delete operation.
    #[inline]
    pub fn is_delete(&self) -> bool {
        self.operation.is_delete()
    }

    /// Returns the fully qualified namespace as "database.collection",
    /// when the source reported one.
    pub fn full_namespace(&self) -> Option<String> {
        self.namespace.as_ref().map(Namespace::full_name)
    }

    /// Returns true if this event carries a post-image.
    #[inline]
    pub fn has_full_document(&self) -> bool {
        self.full_document.is_some()
    }

    /// Returns true if this event carries a pre-image.
    #[inline]
    pub fn has_pre_image(&self) -> bool {
        self.full_document_before_change.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn operation_type_wire_names() {
        assert_eq!(OperationType::Insert.as_str(), "insert");
        assert_eq!(OperationType::Update.as_str(), "update");
        assert_eq!(OperationType::Delete.as_str(), "delete");
        assert_eq!(OperationType::Other("Replace".into()).as_str(), "Replace");
    }

    #[test]
    fn operation_type_serde_round_trip() {
        let json = serde_json::to_string(&OperationType::Insert).unwrap();
        assert_eq!(json, "\"insert\"");

        let parsed: OperationType = serde_json::from_str("\"replace\"").unwrap();
        assert_eq!(parsed, OperationType::Other("replace".into()));
    }

    #[test]
    fn operation_type_equality_is_exact() {
        assert_ne!(OperationType::Insert, OperationType::Update);
        assert_ne!(
            OperationType::Other("insert".into()),
            OperationType::Insert
        );
    }

    #[test]
    fn namespace_full_name() {
        let ns = Namespace::new("WFAudit", "BTRequests");
        assert_eq!(ns.full_name(), "WFAudit.BTRequests");
    }

    #[test]
    fn event_predicates() {
        let event = ChangeEvent {
            operation: OperationType::Delete,
            namespace: Some(Namespace::new("db", "coll")),
            document_key: Some(doc! { "_id": 1 }),
            full_document: None,
            full_document_before_change: Some(doc! { "_id": 1, "a": 2 }),
            updated_fields: None,
            cluster_time: Timestamp {
                time: 10,
                increment: 0,
            },
        };

        assert!(event.is_delete());
        assert!(!event.is_insert());
        assert!(!event.has_full_document());
        assert!(event.has_pre_image());
    }
}
