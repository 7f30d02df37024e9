//! Error kind enumeration for categorizing facade errors.

/// Categorization of facade errors.
///
/// ## Retriable vs Non-Retriable
///
/// | ErrorKind         | Retriable | Action                      |
/// |-------------------|-----------|-----------------------------|
/// | `Unavailable`     | Yes       | Retry with backoff          |
/// | `Timeout`         | Yes       | Retry with backoff          |
/// | `RateLimited`     | Yes       | Retry after a delay         |
/// | `Connection`      | Yes       | Retry with backoff          |
/// | `Unauthorized`    | No        | Fix the preshared key       |
/// | `Forbidden`       | No        | Fix the token's permissions |
/// | `NotFound`        | No        | Object or definition absent |
/// | `Conflict`        | No*       | Resolve conflict first      |
/// | `SchemaViolation` | No        | Fix schema or request       |
/// | `InvalidArgument` | No        | Fix input                   |
/// | `InvalidResponse` | No        | Server contract violation   |
///
/// *`Conflict` is raised for `CREATE` updates of an existing relationship.
///
/// The facade never retries on its own; `is_retriable()` is a hint for
/// callers that layer their own policy on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Authentication failed (missing or invalid preshared key).
    ///
    /// gRPC: UNAUTHENTICATED
    #[error("unauthorized")]
    Unauthorized,

    /// The token is valid but may not call this API.
    ///
    /// This is never used for check results; a denied check is
    /// [`Access::Forbid`](crate::Access::Forbid).
    ///
    /// gRPC: PERMISSION_DENIED
    #[error("forbidden")]
    Forbidden,

    /// A referenced object or definition was not found.
    ///
    /// gRPC: NOT_FOUND
    #[error("not found")]
    NotFound,

    /// Invalid request argument, raised locally or by SpiceDB.
    ///
    /// Relation updates submitted without an update type fail with this kind
    /// before any remote call is made.
    ///
    /// gRPC: INVALID_ARGUMENT, OUT_OF_RANGE
    #[error("invalid argument")]
    InvalidArgument,

    /// Request violates the schema (unknown definition, relation or
    /// permission).
    ///
    /// gRPC: FAILED_PRECONDITION
    #[error("schema violation")]
    SchemaViolation,

    /// Rate limit exceeded.
    ///
    /// gRPC: RESOURCE_EXHAUSTED
    #[error("rate limited")]
    RateLimited,

    /// Service temporarily unavailable.
    ///
    /// gRPC: UNAVAILABLE
    #[error("service unavailable")]
    Unavailable,

    /// Request timed out.
    ///
    /// gRPC: DEADLINE_EXCEEDED, or the client-side request timeout.
    #[error("timeout")]
    Timeout,

    /// Internal server error.
    ///
    /// gRPC: INTERNAL, DATA_LOSS
    #[error("internal error")]
    Internal,

    /// Request was cancelled.
    ///
    /// gRPC: CANCELLED
    #[error("cancelled")]
    Cancelled,

    /// Connection error (DNS, TLS handshake, network unreachable).
    #[error("connection error")]
    Connection,

    /// Protocol error (unimplemented method, unexpected status).
    ///
    /// gRPC: UNIMPLEMENTED
    #[error("protocol error")]
    Protocol,

    /// Configuration error (invalid endpoint, missing token, unreadable CA).
    #[error("configuration error")]
    Configuration,

    /// Conflict with existing relationship state.
    ///
    /// gRPC: ALREADY_EXISTS, ABORTED
    #[error("conflict")]
    Conflict,

    /// A successful response was missing a field the facade requires.
    ///
    /// Examples are a write acknowledgement without `written_at` or an
    /// expansion without a tree root.
    #[error("invalid response")]
    InvalidResponse,

    /// Unknown or unexpected error.
    #[error("unknown error")]
    Unknown,
}

impl ErrorKind {
    /// Returns `true` if this error kind is generally safe to retry.
    ///
    /// # Example
    ///
    /// ```rust
    /// use spicedb_facade::ErrorKind;
    ///
    /// assert!(ErrorKind::Unavailable.is_retriable());
    /// assert!(!ErrorKind::InvalidResponse.is_retriable());
    /// ```
    #[inline]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Unavailable
                | ErrorKind::Timeout
                | ErrorKind::RateLimited
                | ErrorKind::Connection
        )
    }

    /// Creates an `ErrorKind` from a gRPC status code.
    pub fn from_grpc_code(code: tonic::Code) -> Self {
        use tonic::Code;
        match code {
            Code::Ok => ErrorKind::Unknown, // Shouldn't happen
            Code::Cancelled => ErrorKind::Cancelled,
            Code::Unknown => ErrorKind::Unknown,
            Code::InvalidArgument | Code::OutOfRange => ErrorKind::InvalidArgument,
            Code::DeadlineExceeded => ErrorKind::Timeout,
            Code::NotFound => ErrorKind::NotFound,
            Code::AlreadyExists | Code::Aborted => ErrorKind::Conflict,
            Code::PermissionDenied => ErrorKind::Forbidden,
            Code::ResourceExhausted => ErrorKind::RateLimited,
            Code::FailedPrecondition => ErrorKind::SchemaViolation,
            Code::Unimplemented => ErrorKind::Protocol,
            Code::Internal | Code::DataLoss => ErrorKind::Internal,
            Code::Unavailable => ErrorKind::Unavailable,
            Code::Unauthenticated => ErrorKind::Unauthorized,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use test_case::test_case;
    use tonic::Code;

    use super::*;

    #[test]
    fn test_is_retriable() {
        assert!(ErrorKind::Unavailable.is_retriable());
        assert!(ErrorKind::Timeout.is_retriable());
        assert!(ErrorKind::RateLimited.is_retriable());
        assert!(ErrorKind::Connection.is_retriable());

        assert!(!ErrorKind::Unauthorized.is_retriable());
        assert!(!ErrorKind::Forbidden.is_retriable());
        assert!(!ErrorKind::NotFound.is_retriable());
        assert!(!ErrorKind::InvalidArgument.is_retriable());
        assert!(!ErrorKind::SchemaViolation.is_retriable());
        assert!(!ErrorKind::Internal.is_retriable());
        assert!(!ErrorKind::Cancelled.is_retriable());
        assert!(!ErrorKind::Conflict.is_retriable());
        assert!(!ErrorKind::InvalidResponse.is_retriable());
        assert!(!ErrorKind::Configuration.is_retriable());
    }

    #[test_case(Code::Ok, ErrorKind::Unknown)]
    #[test_case(Code::Cancelled, ErrorKind::Cancelled)]
    #[test_case(Code::InvalidArgument, ErrorKind::InvalidArgument)]
    #[test_case(Code::OutOfRange, ErrorKind::InvalidArgument)]
    #[test_case(Code::DeadlineExceeded, ErrorKind::Timeout)]
    #[test_case(Code::NotFound, ErrorKind::NotFound)]
    #[test_case(Code::AlreadyExists, ErrorKind::Conflict)]
    #[test_case(Code::Aborted, ErrorKind::Conflict)]
    #[test_case(Code::PermissionDenied, ErrorKind::Forbidden)]
    #[test_case(Code::ResourceExhausted, ErrorKind::RateLimited)]
    #[test_case(Code::FailedPrecondition, ErrorKind::SchemaViolation)]
    #[test_case(Code::Unimplemented, ErrorKind::Protocol)]
    #[test_case(Code::Internal, ErrorKind::Internal)]
    #[test_case(Code::DataLoss, ErrorKind::Internal)]
    #[test_case(Code::Unavailable, ErrorKind::Unavailable)]
    #[test_case(Code::Unauthenticated, ErrorKind::Unauthorized)]
    fn test_from_grpc_code(code: Code, expected: ErrorKind) {
        assert_eq!(ErrorKind::from_grpc_code(code), expected);
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorKind::Unauthorized.to_string(), "unauthorized");
        assert_eq!(ErrorKind::SchemaViolation.to_string(), "schema violation");
        assert_eq!(ErrorKind::Unavailable.to_string(), "service unavailable");
        assert_eq!(ErrorKind::InvalidResponse.to_string(), "invalid response");
        assert_eq!(ErrorKind::Configuration.to_string(), "configuration error");
    }
}
