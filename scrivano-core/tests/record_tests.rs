//! Integration tests for audit record construction.
//!
//! These exercise the event-to-record mapping scenarios end to end,
//! including the serialized shape of absent fields.

use bson::{doc, Bson, Timestamp};
use chrono::DateTime;
use scrivano_core::event::{ChangeEvent, Namespace, OperationType};
use scrivano_core::record::{AuditRecord, BuildError};

fn base_event(operation: OperationType) -> ChangeEvent {
    ChangeEvent {
        operation,
        namespace: Some(Namespace::new("WFAudit", "BTRequests")),
        document_key: Some(doc! { "_id": 5 }),
        full_document: None,
        full_document_before_change: None,
        updated_fields: None,
        cluster_time: Timestamp {
            time: 1_700_000_000,
            increment: 1,
        },
    }
}

#[test]
fn insert_event_maps_post_image_only() {
    let mut event = base_event(OperationType::Insert);
    event.full_document = Some(doc! { "a": 1 });

    let record = AuditRecord::from_event(&event).unwrap();

    assert_eq!(record.operation, OperationType::Insert);
    assert_eq!(record.full_document, Some(doc! { "a": 1 }));
    assert_eq!(record.full_document_before, None);
    assert_eq!(record.updated_fields, None);
    assert_eq!(record.document_path, "WFAudit.BTRequests");
    assert_eq!(record.document_id, doc! { "_id": 5 });
}

#[test]
fn update_event_carries_all_three_images() {
    let mut event = base_event(OperationType::Update);
    event.full_document_before_change = Some(doc! { "a": 1 });
    event.full_document = Some(doc! { "a": 2 });
    event.updated_fields = Some(doc! { "a": 2 });

    let record = AuditRecord::from_event(&event).unwrap();

    assert_eq!(record.full_document_before, Some(doc! { "a": 1 }));
    assert_eq!(record.full_document, Some(doc! { "a": 2 }));
    assert_eq!(record.updated_fields, Some(doc! { "a": 2 }));
}

#[test]
fn delete_event_maps_pre_image_only() {
    let mut event = base_event(OperationType::Delete);
    event.full_document_before_change = Some(doc! { "a": 2 });

    let record = AuditRecord::from_event(&event).unwrap();

    assert_eq!(record.operation, OperationType::Delete);
    assert_eq!(record.full_document, None);
    assert_eq!(record.full_document_before, Some(doc! { "a": 2 }));
    assert_eq!(record.updated_fields, None);
}

#[test]
fn missing_document_key_is_rejected() {
    let mut event = base_event(OperationType::Insert);
    event.document_key = None;

    assert_eq!(
        AuditRecord::from_event(&event),
        Err(BuildError::MissingRequiredField("document key"))
    );
}

#[test]
fn absent_images_serialize_as_explicit_null() {
    let record = AuditRecord::from_event(&base_event(OperationType::Delete)).unwrap();

    let doc = bson::to_document(&record).unwrap();

    // Absent images must be present as null, never omitted, so audit
    // readers can tell "not applicable" from "not recorded".
    assert_eq!(doc.get("fullDocument"), Some(&Bson::Null));
    assert_eq!(doc.get("fullDocumentBefore"), Some(&Bson::Null));
    assert_eq!(doc.get("updatedFields"), Some(&Bson::Null));
    assert_eq!(doc.get("operationType"), Some(&Bson::String("delete".into())));
    assert_eq!(
        doc.get("documentPath"),
        Some(&Bson::String("WFAudit.BTRequests".into()))
    );
}

#[test]
fn change_date_is_stored_as_bson_datetime() {
    let record = AuditRecord::from_event(&base_event(OperationType::Insert)).unwrap();

    let doc = bson::to_document(&record).unwrap();

    let Some(Bson::DateTime(stored)) = doc.get("changeDate") else {
        panic!("changeDate must be a BSON datetime, got {:?}", doc.get("changeDate"));
    };
    assert_eq!(stored.timestamp_millis(), 1_700_000_000_000);
}

#[test]
fn change_date_uses_seconds_component_of_ordering_token() {
    let mut event = base_event(OperationType::Insert);
    event.cluster_time = Timestamp {
        time: 1_600_000_000,
        increment: 999,
    };

    let record = AuditRecord::from_event(&event).unwrap();

    assert_eq!(
        record.change_date,
        DateTime::from_timestamp(1_600_000_000, 0).unwrap()
    );
}

#[test]
fn record_round_trips_through_bson() {
    let mut event = base_event(OperationType::Update);
    event.full_document = Some(doc! { "a": 2 });
    event.updated_fields = Some(doc! { "a": 2 });

    let record = AuditRecord::from_event(&event).unwrap();
    let doc = bson::to_document(&record).unwrap();
    let decoded: AuditRecord = bson::from_document(doc).unwrap();

    assert_eq!(decoded, record);
}
