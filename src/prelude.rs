//! Prelude module for convenient imports.
//!
//! ```rust
//! use spicedb_facade::prelude::*;
//! ```
//!
//! This provides access to the client, the [`Authorizer`] trait, error
//! types and the request/response value types.

pub use crate::{
    authorizer::{Authorizer, ResultStream},
    client::{Client, ClientBuilder},
    config::{ClientConfig, TlsConfig},
    error::{Error, ErrorKind, Result},
    types::{
        Access, CheckRequest, Consistency, Cursor, ObjectId, ObjectRef, Pagination,
        RelationUpdateRequest, RelationUpdateType, Relationship, ResourcesRequest,
        ResourcesWithRelations, SubjectRef, SubjectsWithRelations, ZedToken,
    },
};
