//! Transport layer for SpiceDB communication.
//!
//! - gRPC transport (via tonic and the `spicedb-grpc` stubs), used by
//!   [`Client::builder`](crate::Client::builder)
//! - Mock transport, for testing without network
//!
//! Users normally interact with the higher-level [`Client`](crate::Client)
//! through the [`Authorizer`](crate::Authorizer) trait. The transport types
//! are public so alternative backends can be plugged in through
//! [`Client::from_transport`](crate::Client::from_transport).
//!
//! ```rust
//! use spicedb_facade::Transport;
//!
//! let grpc = Transport::Grpc;   // Default
//! let mock = Transport::Mock;   // For testing
//! assert_ne!(grpc, mock);
//! ```

pub(crate) mod traits;

pub(crate) mod grpc;

pub(crate) mod mock;

pub use traits::{
    BulkCheckOutcome, BulkCheckPair, LookupResourcesItem, LookupResourcesRequest, PermissionTree,
    Permissionship, ReadRelationshipsItem, ReadRelationshipsRequest, RelationshipFilter,
    RelationshipUpdate, SubjectFilter, Transport, TransportClient, TransportStream, WriteResponse,
};

pub use grpc::{GrpcTransport, GrpcTransportBuilder};

pub use mock::MockTransport;
