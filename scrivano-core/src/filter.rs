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

//! Subscription Specification
//!
//! A [`SubscriptionSpec`] is pure configuration handed to the event source at
//! subscribe time. It declares which operation kinds are of interest and
//! which optional document images the source should materialize on each
//! event:
//!
//! - **post-image on update**: request the full document state after an
//!   update (inserts carry it unconditionally),
//! - **pre-image when available**: request the document state before updates
//!   and deletes, where the source supports it.
//!
//! Operation kinds are matched by equality, one comparison per accepted
//! kind. Kinds are categorical values, so an ordering comparison against
//! them would silently over-match and defeat the filter.
//!
//! # Examples
//!
//! ```rust
//! use scrivano_core::event::OperationType;
//! use scrivano_core::filter::SubscriptionSpec;
//!
//! // The default subscription audits inserts, updates and deletes with
//! // both images requested.
//! let spec = SubscriptionSpec::default();
//! assert!(spec.accepts(&OperationType::Insert));
//! assert!(!spec.accepts(&OperationType::Other("replace".into())));
//!
//! // Narrow the subscription to deletes only, without pre-images.
//! let spec = SubscriptionSpec::builder()
//!     .operation(OperationType::Delete)
//!     .include_pre_image(false)
//!     .build()
//!     .unwrap();
//! assert!(!spec.accepts(&OperationType::Insert));
//! ```

use crate::event::OperationType;
use bson::{bson, doc, Bson, Document};
use thiserror::Error;

/// Errors produced while building a [`SubscriptionSpec`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// The accepted-operation set was empty.
    #[error("subscription must accept at least one operation kind")]
    EmptyOperationSet,

    /// A kind outside {insert, update, delete} was requested.
    #[error("operation kind \"{0}\" cannot be audited")]
    UnsupportedOperation(String),
}

/// Declares, at subscribe time, the operation kinds of interest and the
/// image-inclusion policy for the event source.
///
/// Use [`SubscriptionSpec::builder`] to construct instances; the default
/// accepts all three audited kinds with both images requested, matching
/// the behavior of a full audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSpec {
    operations: Vec<OperationType>,
    include_post_image_on_update: bool,
    include_pre_image: bool,
}

impl Default for SubscriptionSpec {
    fn default() -> Self {
        Self {
            operations: vec![
                OperationType::Insert,
                OperationType::Update,
                OperationType::Delete,
            ],
            include_post_image_on_update: true,
            include_pre_image: true,
        }
    }
}

impl SubscriptionSpec {
    /// Creates a new builder for a subscription specification.
    #[must_use]
    pub fn builder() -> SubscriptionSpecBuilder {
        SubscriptionSpecBuilder::default()
    }

    /// Returns the accepted operation kinds, in declaration order.
    #[must_use]
    pub fn operations(&self) -> &[OperationType] {
        &self.operations
    }

    /// Returns true if the source should materialize the post-image on
    /// update events.
    #[must_use]
    pub fn include_post_image_on_update(&self) -> bool {
        self.include_post_image_on_update
    }

    /// Returns true if the source should materialize the pre-image where
    /// available.
    #[must_use]
    pub fn include_pre_image(&self) -> bool {
        self.include_pre_image
    }

    /// Returns true if events of the given kind are of interest.
    ///
    /// Membership is an exact-equality test per accepted kind.
    #[must_use]
    pub fn accepts(&self, operation: &OperationType) -> bool {
        self.operations.iter().any(|accepted| accepted == operation)
    }

    /// Returns the `$match` aggregation stage expressing this filter.
    ///
    /// The predicate is a logical `$or` of one `$eq` comparison per
    /// accepted kind, evaluated against the event's `operationType` field.
    #[must_use]
    pub fn match_stage(&self) -> Document {
        let comparisons: Vec<Bson> = self
            .operations
            .iter()
            .map(|op| bson!({ "$eq": ["$operationType", op.as_str()] }))
            .collect();

        doc! {
            "$match": {
                "$expr": {
                    "$or": comparisons,
                }
            }
        }
    }
}

/// Builder for [`SubscriptionSpec`].
#[derive(Debug, Default)]
pub struct SubscriptionSpecBuilder {
    operations: Vec<OperationType>,
    include_post_image_on_update: Option<bool>,
    include_pre_image: Option<bool>,
}

impl SubscriptionSpecBuilder {
    /// Adds an operation kind to the accepted set.
    ///
    /// Duplicate kinds are ignored.
    #[must_use]
    pub fn operation(mut self, operation: OperationType) -> Self {
        if !self.operations.contains(&operation) {
            self.operations.push(operation);
        }
        self
    }

    /// Replaces the accepted set with the given kinds.
    #[must_use]
    pub fn operations(mut self, operations: Vec<OperationType>) -> Self {
        self.operations.clear();
        for operation in operations {
            self = self.operation(operation);
        }
        self
    }

    /// Sets whether the source should materialize the post-image on
    /// update events.
    ///
    /// Default: true
    #[must_use]
    pub fn include_post_image_on_update(mut self, include: bool) -> Self {
        self.include_post_image_on_update = Some(include);
        self
    }

    /// Sets whether the source should materialize the pre-image where
    /// available.
    ///
    /// Default: true
    #[must_use]
    pub fn include_pre_image(mut self, include: bool) -> Self {
        self.include_pre_image = Some(include);
        self
    }

    /// Builds the specification.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::EmptyOperationSet`] if no kind was accepted and
    /// [`SpecError::UnsupportedOperation`] if a kind outside the audited
    /// set was requested.
    pub fn build(self) -> Result<SubscriptionSpec, SpecError> {
        if self.operations.is_empty() {
            return Err(SpecError::EmptyOperationSet);
        }

        if let Some(other) = self.operations.iter().find(|op| op.is_other()) {
            return Err(SpecError::UnsupportedOperation(other.as_str().to_string()));
        }

        Ok(SubscriptionSpec {
            operations: self.operations,
            include_post_image_on_update: self.include_post_image_on_update.unwrap_or(true),
            include_pre_image: self.include_pre_image.unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spec_accepts_audited_kinds_only() {
        let spec = SubscriptionSpec::default();

        assert!(spec.accepts(&OperationType::Insert));
        assert!(spec.accepts(&OperationType::Update));
        assert!(spec.accepts(&OperationType::Delete));
        assert!(!spec.accepts(&OperationType::Other("replace".into())));
        assert!(!spec.accepts(&OperationType::Other("drop".into())));
    }

    #[test]
    fn narrowed_spec_rejects_unlisted_kinds() {
        let spec = SubscriptionSpec::builder()
            .operation(OperationType::Insert)
            .build()
            .unwrap();

        // Equality semantics: update and delete must not slip through a
        // single-kind subscription.
        assert!(spec.accepts(&OperationType::Insert));
        assert!(!spec.accepts(&OperationType::Update));
        assert!(!spec.accepts(&OperationType::Delete));
    }

    #[test]
    fn builder_rejects_empty_set() {
        assert_eq!(
            SubscriptionSpec::builder().build(),
            Err(SpecError::EmptyOperationSet)
        );
    }

    #[test]
    fn builder_rejects_unaudited_kind() {
        let err = SubscriptionSpec::builder()
            .operation(OperationType::Other("invalidate".into()))
            .build()
            .unwrap_err();

        assert_eq!(err, SpecError::UnsupportedOperation("invalidate".into()));
    }

    #[test]
    fn builder_deduplicates_kinds() {
        let spec = SubscriptionSpec::builder()
            .operation(OperationType::Insert)
            .operation(OperationType::Insert)
            .build()
            .unwrap();

        assert_eq!(spec.operations(), &[OperationType::Insert]);
    }
}
