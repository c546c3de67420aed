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

//! Bootstrap Configuration
//!
//! [`ReplicatorConfig`] resolves everything the core treats as external
//! input: the connection target, the watched and audit collection names,
//! and the subscription specification. Credentials travel inside the
//! connection URI; they are never stored separately.

use scrivano_core::filter::SubscriptionSpec;
use thiserror::Error;

/// Errors produced while building a [`ReplicatorConfig`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required field was not provided.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The watched and audit collections were the same.
    ///
    /// Auditing the audit collection would feed the loop its own writes.
    #[error("source and audit collections must differ")]
    CollectionsCollide,
}

/// Resolved bootstrap inputs for one replication run.
///
/// ```rust
/// use scrivano_mongo::ReplicatorConfig;
///
/// let config = ReplicatorConfig::builder()
///     .mongodb_uri("mongodb://localhost:27017/?replicaSet=rs0")
///     .database("WFAudit")
///     .source_collection("BTRequests")
///     .audit_collection("BTAudit")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.database(), "WFAudit");
/// ```
#[derive(Debug, Clone)]
pub struct ReplicatorConfig {
    mongodb_uri: String,
    database: String,
    source_collection: String,
    audit_collection: String,
    subscription: SubscriptionSpec,
}

impl ReplicatorConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> ReplicatorConfigBuilder {
        ReplicatorConfigBuilder::default()
    }

    /// Returns the MongoDB connection URI.
    #[must_use]
    pub fn mongodb_uri(&self) -> &str {
        &self.mongodb_uri
    }

    /// Returns the database holding both collections.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Returns the name of the watched collection.
    #[must_use]
    pub fn source_collection(&self) -> &str {
        &self.source_collection
    }

    /// Returns the name of the audit collection.
    #[must_use]
    pub fn audit_collection(&self) -> &str {
        &self.audit_collection
    }

    /// Returns the subscription specification.
    #[must_use]
    pub fn subscription(&self) -> &SubscriptionSpec {
        &self.subscription
    }
}

/// Builder for [`ReplicatorConfig`].
#[derive(Debug, Default)]
pub struct ReplicatorConfigBuilder {
    mongodb_uri: Option<String>,
    database: Option<String>,
    source_collection: Option<String>,
    audit_collection: Option<String>,
    subscription: Option<SubscriptionSpec>,
}

impl ReplicatorConfigBuilder {
    /// Sets the MongoDB connection URI.
    #[must_use]
    pub fn mongodb_uri(mut self, uri: impl Into<String>) -> Self {
        self.mongodb_uri = Some(uri.into());
        self
    }

    /// Sets the database holding both collections.
    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Sets the collection to watch for changes.
    #[must_use]
    pub fn source_collection(mut self, collection: impl Into<String>) -> Self {
        self.source_collection = Some(collection.into());
        self
    }

    /// Sets the collection receiving audit records.
    #[must_use]
    pub fn audit_collection(mut self, collection: impl Into<String>) -> Self {
        self.audit_collection = Some(collection.into());
        self
    }

    /// Sets the subscription specification.
    ///
    /// Default: [`SubscriptionSpec::default`], auditing inserts, updates
    /// and deletes with both images requested.
    #[must_use]
    pub fn subscription(mut self, spec: SubscriptionSpec) -> Self {
        self.subscription = Some(spec);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] for any unset required field
    /// and [`ConfigError::CollectionsCollide`] when the watched and audit
    /// collections are the same.
    pub fn build(self) -> Result<ReplicatorConfig, ConfigError> {
        let mongodb_uri = self
            .mongodb_uri
            .ok_or(ConfigError::MissingField("mongodb_uri"))?;
        let database = self.database.ok_or(ConfigError::MissingField("database"))?;
        let source_collection = self
            .source_collection
            .ok_or(ConfigError::MissingField("source_collection"))?;
        let audit_collection = self
            .audit_collection
            .ok_or(ConfigError::MissingField("audit_collection"))?;

        if source_collection == audit_collection {
            return Err(ConfigError::CollectionsCollide);
        }

        Ok(ReplicatorConfig {
            mongodb_uri,
            database,
            source_collection,
            audit_collection,
            subscription: self.subscription.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrivano_core::event::OperationType;

    fn complete_builder() -> ReplicatorConfigBuilder {
        ReplicatorConfig::builder()
            .mongodb_uri("mongodb://localhost:27017")
            .database("WFAudit")
            .source_collection("BTRequests")
            .audit_collection("BTAudit")
    }

    #[test]
    fn builds_with_default_subscription() {
        let config = complete_builder().build().unwrap();

        assert_eq!(config.source_collection(), "BTRequests");
        assert_eq!(config.audit_collection(), "BTAudit");
        assert_eq!(config.subscription(), &SubscriptionSpec::default());
    }

    #[test]
    fn missing_fields_are_reported_by_name() {
        let err = ReplicatorConfig::builder().build().unwrap_err();
        assert_eq!(err, ConfigError::MissingField("mongodb_uri"));

        let err = ReplicatorConfig::builder()
            .mongodb_uri("mongodb://localhost:27017")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingField("database"));
    }

    #[test]
    fn colliding_collections_are_rejected() {
        let err = complete_builder()
            .audit_collection("BTRequests")
            .build()
            .unwrap_err();

        assert_eq!(err, ConfigError::CollectionsCollide);
    }

    #[test]
    fn custom_subscription_is_kept() {
        let spec = SubscriptionSpec::builder()
            .operation(OperationType::Delete)
            .build()
            .unwrap();

        let config = complete_builder().subscription(spec.clone()).build().unwrap();

        assert_eq!(config.subscription(), &spec);
    }
}
