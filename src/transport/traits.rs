//! Transport trait definitions and common types.
//!
//! The transport layer speaks SpiceDB's v1 permissions and schema
//! services in terms of the crate's value types. It does no
//! aggregation of its own: grouping, defaulting and fan-out live in
//! [`Client`](crate::Client).

use std::pin::Pin;

use futures::Stream;

use crate::types::{
    CheckRequest, Consistency, Cursor, ObjectRef, Pagination, RelationUpdateType, Relationship,
    ResourcesRequest, SubjectRef, ZedToken,
};
use crate::Error;

/// A boxed stream of fallible transport items.
pub type TransportStream<T> = Pin<Box<dyn Stream<Item = Result<T, Error>> + Send>>;

// ============================================================================
// Transport Enum
// ============================================================================

/// Available transport implementations.
///
/// ```rust
/// use spicedb_facade::Transport;
///
/// let transport = Transport::Grpc;
/// assert!(transport.is_grpc());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// gRPC over HTTP/2 (default).
    #[default]
    Grpc,
    /// In-memory mock, for testing without network.
    Mock,
}

impl Transport {
    /// Returns `true` if this is gRPC transport.
    pub fn is_grpc(&self) -> bool {
        matches!(self, Transport::Grpc)
    }

    /// Returns `true` if this is mock transport.
    pub fn is_mock(&self) -> bool {
        matches!(self, Transport::Mock)
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Grpc => write!(f, "gRPC"),
            Transport::Mock => write!(f, "Mock"),
        }
    }
}

// ============================================================================
// Check
// ============================================================================

/// SpiceDB's answer to a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permissionship {
    /// The server did not say.
    Unspecified,
    /// The subject does not hold the permission.
    NoPermission,
    /// The subject holds the permission.
    HasPermission,
    /// The answer depends on caveat context that was not supplied.
    Conditional,
}

/// One pair of a bulk check response.
#[derive(Debug, Clone)]
pub struct BulkCheckPair {
    /// The request as echoed back by the server.
    pub request: CheckRequest,
    /// The answer for that request.
    pub outcome: BulkCheckOutcome,
}

/// The per-item outcome of a bulk check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkCheckOutcome {
    /// The item was evaluated.
    Permissionship(Permissionship),
    /// The item failed on the server; the rest of the batch is unaffected.
    Error(String),
}

// ============================================================================
// Write
// ============================================================================

/// A single write operation on a relationship tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipUpdate {
    /// What to do with the tuple.
    pub operation: RelationUpdateType,
    /// The tuple.
    pub relationship: Relationship,
}

/// Response from a write operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResponse {
    /// The revision at which the write was applied, if reported.
    pub written_at: Option<ZedToken>,
}

// ============================================================================
// Read
// ============================================================================

/// Narrows a relationship read to matching subjects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectFilter {
    /// Subject object type.
    pub subject_type: String,
    /// Subject identifier; `None` matches any.
    pub subject_id: Option<String>,
    /// Subject relation; `None` matches any.
    pub relation: Option<String>,
}

/// Selects the relationship tuples a read returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipFilter {
    /// Resource object type (required by SpiceDB).
    pub resource_type: String,
    /// Resource identifier; `None` matches any.
    pub resource_id: Option<String>,
    /// Relation name; `None` matches any.
    pub relation: Option<String>,
    /// Subject constraint; `None` matches any.
    pub subject: Option<SubjectFilter>,
}

/// Request to stream relationship tuples.
#[derive(Debug, Clone, Default)]
pub struct ReadRelationshipsRequest {
    /// Which tuples to return.
    pub filter: RelationshipFilter,
    /// Snapshot selection.
    pub consistency: Consistency,
    /// Page size and resume point.
    pub pagination: Pagination,
}

/// One streamed relationship tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRelationshipsItem {
    /// The tuple.
    pub relationship: Relationship,
    /// Cursor that resumes after this tuple.
    pub after_result_cursor: Option<Cursor>,
}

// ============================================================================
// Lookup
// ============================================================================

/// Request to stream resources a subject can access.
#[derive(Debug, Clone)]
pub struct LookupResourcesRequest {
    /// What to look up.
    pub request: ResourcesRequest,
    /// Snapshot selection.
    pub consistency: Consistency,
    /// Page size and resume point.
    pub pagination: Pagination,
}

/// One streamed resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResourcesItem {
    /// The resource identifier.
    pub resource_id: String,
    /// Cursor that resumes after this resource.
    pub after_result_cursor: Option<Cursor>,
}

// ============================================================================
// Expand
// ============================================================================

/// A node of a permission expansion tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionTree {
    /// A set of subjects found directly.
    Leaf {
        /// The subjects, in server order.
        subjects: Vec<SubjectRef>,
    },
    /// A set operation over child trees.
    Intermediate {
        /// The children, in server order.
        children: Vec<PermissionTree>,
    },
}

// ============================================================================
// Transport Client Trait
// ============================================================================

/// Trait for transport client implementations.
///
/// Unary calls are `async`. Streaming calls return a lazy stream: nothing is
/// sent until the stream is first polled, and dropping it cancels the call.
#[async_trait::async_trait]
pub trait TransportClient: Send + Sync {
    /// Checks a single permission.
    async fn check_permission(
        &self,
        request: &CheckRequest,
        consistency: Consistency,
    ) -> Result<Permissionship, Error>;

    /// Checks a batch of permissions in one round trip.
    ///
    /// Pairs come back in server order; the server may omit pairs.
    async fn bulk_check(
        &self,
        requests: &[CheckRequest],
        consistency: Consistency,
    ) -> Result<Vec<BulkCheckPair>, Error>;

    /// Applies a batch of relationship updates atomically.
    async fn write_relationships(
        &self,
        updates: Vec<RelationshipUpdate>,
    ) -> Result<WriteResponse, Error>;

    /// Streams relationship tuples matching a filter.
    fn read_relationships(
        &self,
        request: ReadRelationshipsRequest,
    ) -> TransportStream<ReadRelationshipsItem>;

    /// Streams resources on which a subject holds a permission.
    fn lookup_resources(
        &self,
        request: LookupResourcesRequest,
    ) -> TransportStream<LookupResourcesItem>;

    /// Expands the tree of subjects that hold a permission on a resource.
    ///
    /// Returns `Ok(None)` when the response carried no tree root.
    async fn expand_permission_tree(
        &self,
        resource: &ObjectRef,
        permission: &str,
        consistency: Consistency,
    ) -> Result<Option<PermissionTree>, Error>;

    /// Reads the schema text.
    async fn read_schema(&self) -> Result<String, Error>;

    /// Returns the transport type.
    fn transport_type(&self) -> Transport;
}
