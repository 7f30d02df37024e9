//! Value types exchanged with the facade.
//!
//! - [`ObjectId`], [`ObjectRef`], [`SubjectRef`]: string-normalized references
//! - [`CheckRequest`] and [`Access`]: a permission question and its answer
//! - [`Relationship`], [`RelationUpdateRequest`]: stored tuples and mutations
//! - [`ResourcesRequest`], [`Pagination`], [`Cursor`]: lookup inputs
//! - [`ResourcesWithRelations`], [`SubjectsWithRelations`]: grouped results
//! - [`Consistency`], [`ZedToken`]: snapshot selection and write revisions

mod check;
mod consistency;
mod lookup;
mod object;
mod relationship;

pub use check::{Access, CheckRequest};
pub use consistency::{Consistency, ZedToken};
pub use lookup::{Cursor, Pagination, ResourcesRequest, ResourcesWithRelations, SubjectsWithRelations};
pub use object::{ObjectId, ObjectRef, SubjectRef};
pub use relationship::{RelationUpdateRequest, RelationUpdateType, Relationship};
