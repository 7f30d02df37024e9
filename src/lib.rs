//! # spicedb-facade
//!
//! A small authorization facade over the SpiceDB v1 gRPC API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spicedb_facade::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::builder()
//!         .url("localhost:50051")
//!         .token("somerandomkeyhere")
//!         .insecure()
//!         .build()
//!         .await?;
//!
//!     let battle = ObjectRef::new("game_portal", "battle");
//!     let attacker = SubjectRef::new("user", 1);
//!     client.grant(&battle, "solo_attacker", &attacker).await?;
//!
//!     let request = CheckRequest::new("user", 1, "game_portal", "battle", "attack");
//!     let allowed = client.is_allowed(&request, Consistency::FullyConsistent).await?;
//!     println!("Allowed: {}", allowed);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Key Concepts
//!
//! - **One trait, one backend**: [`Authorizer`] declares the capability set;
//!   [`Client`] implements it over SpiceDB
//! - **Relationship Order**: `resource#relation@subject`, e.g.
//!   `game_portal:battle#solo_attacker@user:1`
//! - **Denial ≠ Error**: `check()` returns [`Access::Forbid`] for denied
//!   access, not `Err`; [`Access::Undefined`] means no definitive answer
//! - **Identifiers are strings**: `42` and `"42"` name the same object
//! - **Streams are lazy**: every enumeration has a `*_stream` form; nothing
//!   is sent until it is polled

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod authorizer;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

// Transport layer
pub mod transport;

// Testing utilities
pub mod testing;

// Prelude for convenient imports
pub mod prelude;

// Re-export main types at crate root for convenience
pub use authorizer::{Authorizer, ResultStream};
pub use client::{Client, ClientBuilder};
pub use error::{Error, ErrorKind, Result};
pub use types::{
    Access, CheckRequest, Consistency, Cursor, ObjectId, ObjectRef, Pagination,
    RelationUpdateRequest, RelationUpdateType, Relationship, ResourcesRequest,
    ResourcesWithRelations, SubjectRef, SubjectsWithRelations, ZedToken,
};

// Re-export config types
pub use config::{ClientConfig, TlsConfig};

// Re-export transport types
pub use transport::{GrpcTransport, Transport, TransportClient};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<Client>();

        // The facade is usable as a trait object.
        fn _takes(_: &dyn Authorizer) {}
    }
}
