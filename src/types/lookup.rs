//! Lookup requests, pagination, and grouped enumeration results.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{ObjectId, SubjectRef};

/// An opaque continuation token returned by a streamed read.
///
/// A cursor is only meaningful to the server that issued it and only for the
/// same filter it was issued for; it is never parsed or built client-side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wraps a token value received from the server.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token value.
    #[inline]
    pub fn token(&self) -> &str {
        &self.0
    }
}

/// Optional page size and resume point for a streamed read.
///
/// The default reads everything from the beginning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of items the server may return.
    pub limit: Option<u32>,
    /// Resume after the item this cursor was returned with.
    pub cursor: Option<Cursor>,
}

impl Pagination {
    /// Reads at most `limit` items from the beginning.
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            cursor: None,
        }
    }

    /// Resumes after `cursor`.
    #[must_use]
    pub fn after(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }
}

/// "Which `resource_type` objects can the subject `permission`?"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourcesRequest {
    resource_type: String,
    permission: String,
    subject: SubjectRef,
}

impl ResourcesRequest {
    /// Creates a resource lookup request.
    pub fn new(
        resource_type: impl Into<String>,
        permission: impl Into<String>,
        subject_type: impl Into<String>,
        subject_id: impl Into<ObjectId>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            permission: permission.into(),
            subject: SubjectRef::new(subject_type, subject_id),
        }
    }

    /// Creates a lookup for a subject that may be a subject set.
    pub fn for_subject(
        resource_type: impl Into<String>,
        permission: impl Into<String>,
        subject: SubjectRef,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            permission: permission.into(),
            subject,
        }
    }

    /// Returns the resource type being enumerated.
    #[inline]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Returns the permission name.
    #[inline]
    pub fn permission(&self) -> &str {
        &self.permission
    }

    /// Returns the subject.
    #[inline]
    pub fn subject(&self) -> &SubjectRef {
        &self.subject
    }
}

/// A resource and every relation a subject holds on it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesWithRelations {
    /// The resource identifier.
    pub resource_id: String,
    /// Relation names between the resource and the subject.
    pub relations: BTreeSet<String>,
}

/// A subject and every relation it holds directly on the scanned resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectsWithRelations {
    /// The subject's object type.
    pub subject_type: String,
    /// The subject's identifier.
    pub subject_id: String,
    /// Relation names found for this subject.
    pub relations: BTreeSet<String>,
}
