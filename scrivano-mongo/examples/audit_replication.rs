//! End-to-End Audit Replication Example
//!
//! Watches one collection for inserts, updates and deletes and writes one
//! audit record per event into a second collection in the same database.
//!
//! # Prerequisites
//!
//! Start MongoDB (replica set required for change streams):
//! ```bash
//! docker run -d --name mongodb -p 27017:27017 \
//!   mongo:7.0 --replSet rs0
//!
//! # Initialize replica set
//! docker exec mongodb mongosh --eval "rs.initiate()"
//! ```
//!
//! # Running the Example
//!
//! ```bash
//! MONGODB_URI="mongodb://localhost:27017/?replicaSet=rs0&directConnection=true" \
//!   cargo run --example audit_replication
//! ```
//!
//! # Generate Test Data
//!
//! In another terminal:
//! ```bash
//! docker exec mongodb mongosh WFAudit --eval '
//!   db.BTRequests.insertOne({requestor: "alice", amount: 120})
//! '
//! ```
//!
//! Stop with Ctrl-C; the cursor is released and the run counters are
//! printed on the way out.

use scrivano_core::replicator::Replicator;
use scrivano_core::source::EventSource;
use scrivano_mongo::{connect, ReplicatorConfig};
use std::error::Error;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ReplicatorConfig::builder()
        .mongodb_uri(std::env::var("MONGODB_URI").unwrap_or_else(|_| {
            "mongodb://localhost:27017/?replicaSet=rs0&directConnection=true".to_string()
        }))
        .database("WFAudit")
        .source_collection("BTRequests")
        .audit_collection("BTAudit")
        .build()?;

    let (source, sink) = connect(&config).await?;
    let stream = source.subscribe(config.subscription()).await?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, requesting shutdown");
            let _ = shutdown_tx.send(());
        }
    });

    let stats = Replicator::new(stream, sink).run(shutdown_rx).await?;

    info!(
        events = stats.events_received,
        records = stats.records_written,
        "audit replication finished"
    );

    Ok(())
}
