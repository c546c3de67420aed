//! Scrivano Core - Change-Stream Audit Replication Primitives
//!
//! This crate provides the driver-independent building blocks for replicating
//! MongoDB change-stream events into an append-only audit collection:
//!
//! - **Events**: [`event`] defines the change-event model that flows from
//!   sources to sinks
//! - **Filtering**: [`filter`] declares which operation kinds a subscription
//!   is interested in and which document images the source should materialize
//! - **Records**: [`record`] maps one accepted event to one audit record
//! - **Delivery**: [`replicator`] drives the sequential listen/build/persist
//!   loop between an event stream and an audit sink
//!
//! The MongoDB bindings live in the `scrivano-mongo` crate.
//!
//! # Example
//!
//! ```rust
//! use scrivano_core::event::{ChangeEvent, OperationType};
//! use scrivano_core::record::AuditRecord;
//!
//! fn audit(event: &ChangeEvent) {
//!     match AuditRecord::from_event(event) {
//!         Ok(record) => println!("audit {:?} on {}", record.operation, record.document_path),
//!         Err(e) => eprintln!("rejected: {e}"),
//!     }
//! }
//! ```

pub mod event;
pub mod filter;
pub mod record;
pub mod replicator;
pub mod sink;
pub mod source;
