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

//! Scrivano MongoDB Bindings
//!
//! This crate binds the scrivano core to the MongoDB Rust driver:
//!
//! - [`ChangeStreamSource`] implements the core's event-source boundary
//!   over a collection change stream
//! - [`AuditCollectionSink`] appends audit records to a collection
//! - [`ReplicatorConfig`] resolves connection and collection bootstrap
//!   inputs
//!
//! # Example
//!
//! ```rust,no_run
//! use scrivano_core::replicator::Replicator;
//! use scrivano_core::source::EventSource;
//! use scrivano_mongo::{connect, ReplicatorConfig};
//! use tokio::sync::broadcast;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ReplicatorConfig::builder()
//!     .mongodb_uri("mongodb://localhost:27017/?replicaSet=rs0")
//!     .database("WFAudit")
//!     .source_collection("BTRequests")
//!     .audit_collection("BTAudit")
//!     .build()?;
//!
//! let (source, sink) = connect(&config).await?;
//! let stream = source.subscribe(config.subscription()).await?;
//!
//! let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
//! let stats = Replicator::new(stream, sink).run(shutdown_rx).await?;
//! println!("{} records written", stats.records_written);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod sink;
pub mod source;

pub use config::{ConfigError, ReplicatorConfig};
pub use sink::AuditCollectionSink;
pub use source::{ChangeStreamSource, MongoEventStream};

use bson::Document;
use mongodb::Client;
use scrivano_core::source::SourceError;
use tracing::info;

/// Connects one client and wires the watched collection and the audit
/// collection from the given configuration.
///
/// Both handles share the client; dropping them releases the connection.
///
/// # Errors
///
/// Returns [`SourceError::Connection`] if the connection URI cannot be
/// resolved.
pub async fn connect(
    config: &ReplicatorConfig,
) -> Result<(ChangeStreamSource, AuditCollectionSink), SourceError> {
    let client = Client::with_uri_str(config.mongodb_uri())
        .await
        .map_err(SourceError::connection)?;

    let database = client.database(config.database());
    info!(
        database = config.database(),
        source = config.source_collection(),
        audit = config.audit_collection(),
        "connected"
    );

    let source = ChangeStreamSource::new(database.collection::<Document>(config.source_collection()));
    let sink = AuditCollectionSink::new(database.collection::<Document>(config.audit_collection()));

    Ok((source, sink))
}
