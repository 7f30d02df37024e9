//! Permission check requests and their outcome.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ObjectId, ObjectRef, SubjectRef};

/// The outcome of a permission check.
///
/// `Undefined` means no definitive answer was obtained, for example when
/// SpiceDB reports the permission as conditional on a caveat whose context
/// was not supplied. It is not a denial: code that inspects the enum must
/// handle it explicitly. Only [`Access::is_allowed`] collapses it to `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// The subject holds the permission.
    Allow,
    /// The subject does not hold the permission.
    Forbid,
    /// No definitive answer was obtained.
    Undefined,
}

impl Access {
    /// Returns `true` only for [`Access::Allow`].
    #[inline]
    pub fn is_allowed(self) -> bool {
        matches!(self, Access::Allow)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Access::Allow => "allow",
            Access::Forbid => "forbid",
            Access::Undefined => "undefined",
        };
        f.write_str(s)
    }
}

/// "Does `subject` hold `permission` on `resource`?"
///
/// Identifiers are normalized to strings at construction. Requests are
/// hashable so batch results can be keyed by the request that produced them.
///
/// ```rust
/// use spicedb_facade::CheckRequest;
///
/// let by_int = CheckRequest::new("user", 2, "document", 42, "view");
/// let by_str = CheckRequest::new("user", "2", "document", "42", "view");
/// assert_eq!(by_int, by_str);
/// assert_eq!(by_int.to_string(), "document:42#view@user:2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CheckRequest {
    resource: ObjectRef,
    permission: String,
    subject: SubjectRef,
}

impl CheckRequest {
    /// Creates a check request.
    ///
    /// Argument order follows the subject-first reading of the question:
    /// subject type and id, then resource type and id, then the permission.
    pub fn new(
        subject_type: impl Into<String>,
        subject_id: impl Into<ObjectId>,
        resource_type: impl Into<String>,
        resource_id: impl Into<ObjectId>,
        permission: impl Into<String>,
    ) -> Self {
        Self {
            resource: ObjectRef::new(resource_type, resource_id),
            permission: permission.into(),
            subject: SubjectRef::new(subject_type, subject_id),
        }
    }

    /// Creates a check request from already-built references.
    ///
    /// This is the form to use when the subject is a subject set such as
    /// `group:eng#member`.
    pub fn from_refs(resource: ObjectRef, permission: impl Into<String>, subject: SubjectRef) -> Self {
        Self {
            resource,
            permission: permission.into(),
            subject,
        }
    }

    /// Returns the resource being checked.
    #[inline]
    pub fn resource(&self) -> &ObjectRef {
        &self.resource
    }

    /// Returns the subject being checked.
    #[inline]
    pub fn subject(&self) -> &SubjectRef {
        &self.subject
    }

    /// Returns the permission name.
    #[inline]
    pub fn permission(&self) -> &str {
        &self.permission
    }

    /// Returns the subject type.
    #[inline]
    pub fn subject_type(&self) -> &str {
        self.subject.object_type()
    }

    /// Returns the subject identifier.
    #[inline]
    pub fn subject_id(&self) -> &str {
        self.subject.object_id()
    }

    /// Returns the resource type.
    #[inline]
    pub fn resource_type(&self) -> &str {
        self.resource.object_type()
    }

    /// Returns the resource identifier.
    #[inline]
    pub fn resource_id(&self) -> &str {
        self.resource.object_id()
    }
}

impl fmt::Display for CheckRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.resource, self.permission, self.subject)
    }
}
