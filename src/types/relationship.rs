//! Relationship tuples and relation updates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ObjectId, ObjectRef, SubjectRef};
use crate::{Error, Result};

/// A relationship tuple: `(resource, relation, subject)`.
///
/// Reads as "resource has relation to subject". The string form is the
/// Zanzibar tuple notation:
///
/// ```rust
/// use spicedb_facade::Relationship;
///
/// let rel: Relationship = "game_portal:battle#solo_attacker@user:1".parse().unwrap();
/// assert_eq!(rel.resource().object_id(), "battle");
/// assert_eq!(rel.relation(), "solo_attacker");
/// assert_eq!(rel.subject().object_type(), "user");
/// assert_eq!(rel.to_string(), "game_portal:battle#solo_attacker@user:1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Relationship {
    resource: ObjectRef,
    relation: String,
    subject: SubjectRef,
}

impl Relationship {
    /// Creates a relationship tuple.
    pub fn new(resource: ObjectRef, relation: impl Into<String>, subject: SubjectRef) -> Self {
        Self {
            resource,
            relation: relation.into(),
            subject,
        }
    }

    /// Returns the resource side of the tuple.
    #[inline]
    pub fn resource(&self) -> &ObjectRef {
        &self.resource
    }

    /// Returns the relation name.
    #[inline]
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// Returns the subject side of the tuple.
    #[inline]
    pub fn subject(&self) -> &SubjectRef {
        &self.subject
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.resource, self.relation, self.subject)
    }
}

impl FromStr for Relationship {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Format: resource#relation@subject
        let (resource, rest) = s.split_once('#').ok_or_else(|| {
            Error::invalid_argument(format!(
                "invalid relationship format: missing '#' separator in '{}'",
                s
            ))
        })?;

        let (relation, subject) = rest.split_once('@').ok_or_else(|| {
            Error::invalid_argument(format!(
                "invalid relationship format: missing '@' separator in '{}'",
                s
            ))
        })?;

        if relation.is_empty() {
            return Err(Error::invalid_argument(
                "relationship relation cannot be empty",
            ));
        }

        Ok(Relationship::new(
            resource.parse()?,
            relation,
            subject.parse()?,
        ))
    }
}

/// The kind of mutation a [`RelationUpdateRequest`] performs.
///
/// | Variant  | SpiceDB operation | Behavior                               |
/// |----------|-------------------|----------------------------------------|
/// | `Grant`  | `TOUCH`           | Upsert; succeeds if already present    |
/// | `Revoke` | `DELETE`          | Remove; succeeds if already absent     |
/// | `Create` | `CREATE`          | Insert; fails with `Conflict` if present |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationUpdateType {
    /// Write the relationship, keeping it if it already exists.
    Grant,
    /// Delete the relationship.
    Revoke,
    /// Write the relationship, failing if it already exists.
    Create,
}

/// A single relation mutation.
///
/// Prefer the [`grant`](Self::grant), [`revoke`](Self::revoke) and
/// [`create`](Self::create) constructors, which always carry an update type.
/// The builder leaves `update_type` unset unless told otherwise, so a request
/// can be assembled in steps; submitting one without an update type is
/// rejected before any remote call.
///
/// ```rust
/// use spicedb_facade::{RelationUpdateRequest, RelationUpdateType};
///
/// let grant = RelationUpdateRequest::grant("user", 1, "game_portal", "battle", "solo_attacker");
/// assert_eq!(grant.update_type(), Some(RelationUpdateType::Grant));
///
/// let partial = RelationUpdateRequest::builder()
///     .subject_type("user")
///     .subject_id(1)
///     .resource_type("game_portal")
///     .resource_id("battle")
///     .relation("solo_attacker")
///     .build();
/// assert_eq!(partial.update_type(), None);
/// assert_eq!(partial.subject_relation(), "");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, bon::Builder)]
pub struct RelationUpdateRequest {
    #[builder(into)]
    subject_type: String,

    #[builder(into)]
    subject_id: ObjectId,

    #[builder(into)]
    resource_type: String,

    #[builder(into)]
    resource_id: ObjectId,

    #[builder(into)]
    relation: String,

    /// Relation on the subject, for subject sets such as `group:eng#member`.
    #[builder(into, default)]
    #[serde(default)]
    subject_relation: String,

    update_type: Option<RelationUpdateType>,
}

impl RelationUpdateRequest {
    fn tagged(
        update_type: RelationUpdateType,
        subject_type: impl Into<String>,
        subject_id: impl Into<ObjectId>,
        resource_type: impl Into<String>,
        resource_id: impl Into<ObjectId>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            subject_type: subject_type.into(),
            subject_id: subject_id.into(),
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            relation: relation.into(),
            subject_relation: String::new(),
            update_type: Some(update_type),
        }
    }

    /// Creates a grant (`TOUCH`) of `relation` on the resource to the subject.
    pub fn grant(
        subject_type: impl Into<String>,
        subject_id: impl Into<ObjectId>,
        resource_type: impl Into<String>,
        resource_id: impl Into<ObjectId>,
        relation: impl Into<String>,
    ) -> Self {
        Self::tagged(
            RelationUpdateType::Grant,
            subject_type,
            subject_id,
            resource_type,
            resource_id,
            relation,
        )
    }

    /// Creates a revocation (`DELETE`) of `relation` on the resource from the
    /// subject.
    pub fn revoke(
        subject_type: impl Into<String>,
        subject_id: impl Into<ObjectId>,
        resource_type: impl Into<String>,
        resource_id: impl Into<ObjectId>,
        relation: impl Into<String>,
    ) -> Self {
        Self::tagged(
            RelationUpdateType::Revoke,
            subject_type,
            subject_id,
            resource_type,
            resource_id,
            relation,
        )
    }

    /// Creates a strict insert (`CREATE`) that fails if the tuple exists.
    pub fn create(
        subject_type: impl Into<String>,
        subject_id: impl Into<ObjectId>,
        resource_type: impl Into<String>,
        resource_id: impl Into<ObjectId>,
        relation: impl Into<String>,
    ) -> Self {
        Self::tagged(
            RelationUpdateType::Create,
            subject_type,
            subject_id,
            resource_type,
            resource_id,
            relation,
        )
    }

    /// Sets the subject relation.
    #[must_use]
    pub fn with_subject_relation(mut self, subject_relation: impl Into<String>) -> Self {
        self.subject_relation = subject_relation.into();
        self
    }

    /// Returns the subject type.
    #[inline]
    pub fn subject_type(&self) -> &str {
        &self.subject_type
    }

    /// Returns the subject identifier.
    #[inline]
    pub fn subject_id(&self) -> &str {
        self.subject_id.as_str()
    }

    /// Returns the resource type.
    #[inline]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Returns the resource identifier.
    #[inline]
    pub fn resource_id(&self) -> &str {
        self.resource_id.as_str()
    }

    /// Returns the relation name.
    #[inline]
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// Returns the subject relation, `""` when the subject is a plain object.
    #[inline]
    pub fn subject_relation(&self) -> &str {
        &self.subject_relation
    }

    /// Returns the update type, `None` if it was never set.
    #[inline]
    pub fn update_type(&self) -> Option<RelationUpdateType> {
        self.update_type
    }

    /// Returns the tuple this update writes or deletes.
    pub fn relationship(&self) -> Relationship {
        Relationship::new(
            ObjectRef::new(self.resource_type.clone(), &self.resource_id),
            self.relation.clone(),
            SubjectRef::new(self.subject_type.clone(), &self.subject_id)
                .with_relation(self.subject_relation.clone()),
        )
    }

    /// Returns the update type, failing if it was never set.
    pub(crate) fn require_update_type(&self) -> Result<RelationUpdateType> {
        self.update_type.ok_or_else(|| {
            Error::invalid_argument(format!(
                "update_type is not set for relation update {}",
                self.relationship()
            ))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_relationship_parse() {
        let rel: Relationship = "document:readme#viewer@group:eng#member".parse().unwrap();
        assert_eq!(rel.resource(), &ObjectRef::new("document", "readme"));
        assert_eq!(rel.relation(), "viewer");
        assert_eq!(rel.subject().relation(), Some("member"));
    }

    #[test]
    fn test_relationship_parse_invalid() {
        assert!("document:readme".parse::<Relationship>().is_err());
        assert!("document:readme#viewer".parse::<Relationship>().is_err());
        assert!("document:readme#@user:alice".parse::<Relationship>().is_err());
        assert!("#viewer@user:alice".parse::<Relationship>().is_err());
    }

    #[test]
    fn test_convenience_constructors_fix_update_type() {
        let grant = RelationUpdateRequest::grant("user", 1, "doc", 1, "owner");
        let revoke = RelationUpdateRequest::revoke("user", 1, "doc", 1, "owner");
        let create = RelationUpdateRequest::create("user", 1, "doc", 1, "owner");

        assert_eq!(grant.update_type(), Some(RelationUpdateType::Grant));
        assert_eq!(revoke.update_type(), Some(RelationUpdateType::Revoke));
        assert_eq!(create.update_type(), Some(RelationUpdateType::Create));
        assert!(grant.require_update_type().is_ok());
    }

    #[test]
    fn test_builder_defaults() {
        let update = RelationUpdateRequest::builder()
            .subject_type("user")
            .subject_id(7)
            .resource_type("doc")
            .resource_id("1")
            .relation("owner")
            .build();

        assert_eq!(update.subject_id(), "7");
        assert_eq!(update.subject_relation(), "");
        assert_eq!(update.update_type(), None);

        let err = update.require_update_type().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.message().contains("doc:1#owner@user:7"));
    }

    #[test]
    fn test_builder_with_update_type() {
        let update = RelationUpdateRequest::builder()
            .subject_type("group")
            .subject_id("eng")
            .resource_type("doc")
            .resource_id(1)
            .relation("viewer")
            .subject_relation("member")
            .update_type(RelationUpdateType::Revoke)
            .build();

        assert_eq!(update.update_type(), Some(RelationUpdateType::Revoke));
        assert_eq!(update.relationship().to_string(), "doc:1#viewer@group:eng#member");
    }

    #[test]
    fn test_with_subject_relation() {
        let update = RelationUpdateRequest::grant("group", "eng", "doc", 1, "viewer")
            .with_subject_relation("member");
        assert_eq!(update.subject_relation(), "member");
        assert_eq!(update.update_type(), Some(RelationUpdateType::Grant));
    }
}
