//! Object and subject references.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// The identifier of an object, always held in string form.
///
/// SpiceDB identifies objects by string. Callers frequently hold numeric
/// database keys, so `ObjectId` converts from every primitive integer type as
/// well as from strings, and the two forms are indistinguishable afterwards:
///
/// ```rust
/// use spicedb_facade::ObjectId;
///
/// assert_eq!(ObjectId::from(42), ObjectId::from("42"));
/// assert_eq!(ObjectId::from(42u64).as_str(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier and returns the inner string.
    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for ObjectId {
    fn from(value: String) -> Self {
        ObjectId(value)
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        ObjectId(value.to_owned())
    }
}

impl From<&String> for ObjectId {
    fn from(value: &String) -> Self {
        ObjectId(value.clone())
    }
}

impl From<&ObjectId> for ObjectId {
    fn from(value: &ObjectId) -> Self {
        value.clone()
    }
}

macro_rules! object_id_from_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ObjectId {
                fn from(value: $ty) -> Self {
                    ObjectId(value.to_string())
                }
            }
        )*
    };
}

object_id_from_integer!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

/// A reference to a single object, `type:id`.
///
/// ```rust
/// use spicedb_facade::ObjectRef;
///
/// let doc: ObjectRef = "document:readme".parse().unwrap();
/// assert_eq!(doc, ObjectRef::new("document", "readme"));
/// assert_eq!(doc.to_string(), "document:readme");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    object_type: String,
    object_id: ObjectId,
}

impl ObjectRef {
    /// Creates a reference from an object type and identifier.
    pub fn new(object_type: impl Into<String>, object_id: impl Into<ObjectId>) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: object_id.into(),
        }
    }

    /// Returns the object type (schema definition name).
    #[inline]
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Returns the object identifier.
    #[inline]
    pub fn object_id(&self) -> &str {
        self.object_id.as_str()
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.object_id)
    }
}

impl FromStr for ObjectRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((object_type, object_id)) if !object_type.is_empty() && !object_id.is_empty() => {
                Ok(ObjectRef::new(object_type, object_id))
            }
            _ => Err(Error::invalid_argument(format!(
                "invalid object reference '{}': expected 'type:id'",
                s
            ))),
        }
    }
}

/// A subject: an object, optionally narrowed to a relation on it.
///
/// `user:alice` is a plain subject; `group:eng#member` is a subject set
/// standing for every member of `group:eng`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectRef {
    object: ObjectRef,
    relation: Option<String>,
}

impl SubjectRef {
    /// Creates a plain subject reference.
    pub fn new(object_type: impl Into<String>, object_id: impl Into<ObjectId>) -> Self {
        Self {
            object: ObjectRef::new(object_type, object_id),
            relation: None,
        }
    }

    /// Narrows the subject to a relation on it. An empty relation clears it.
    #[must_use]
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        let relation = relation.into();
        self.relation = (!relation.is_empty()).then_some(relation);
        self
    }

    /// Returns the referenced object.
    #[inline]
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// Returns the subject's object type.
    #[inline]
    pub fn object_type(&self) -> &str {
        self.object.object_type()
    }

    /// Returns the subject's object identifier.
    #[inline]
    pub fn object_id(&self) -> &str {
        self.object.object_id()
    }

    /// Returns the subject relation, if this is a subject set.
    #[inline]
    pub fn relation(&self) -> Option<&str> {
        self.relation.as_deref()
    }
}

impl From<ObjectRef> for SubjectRef {
    fn from(object: ObjectRef) -> Self {
        Self {
            object,
            relation: None,
        }
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.object)?;
        if let Some(ref relation) = self.relation {
            write!(f, "#{}", relation)?;
        }
        Ok(())
    }
}

impl FromStr for SubjectRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('#') {
            Some((object, relation)) => {
                if relation.is_empty() {
                    return Err(Error::invalid_argument(format!(
                        "invalid subject reference '{}': empty relation",
                        s
                    )));
                }
                Ok(SubjectRef::from(object.parse::<ObjectRef>()?).with_relation(relation))
            }
            None => Ok(SubjectRef::from(s.parse::<ObjectRef>()?)),
        }
    }
}
