//! Testing utilities.
//!
//! - [`MockTransport`]: in-memory tuples with direct-relation check
//!   semantics, failure injection and request counting
//! - [`mock_client`]: a [`Client`] over a mock, with default settings
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use spicedb_facade::prelude::*;
//! use spicedb_facade::testing::{mock_client, MockTransport};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<()> {
//! let mock = Arc::new(MockTransport::new());
//! mock.add_relationship("document:readme#view@user:alice".parse()?);
//!
//! let client = mock_client(mock.clone());
//! let request = CheckRequest::new("user", "alice", "document", "readme", "view");
//! assert!(client.is_allowed(&request, Consistency::default()).await?);
//! assert_eq!(mock.request_count(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! The mock does not evaluate a schema: a permission is held iff a tuple
//! with that exact relation is stored.

use std::sync::Arc;

use crate::client::Client;
use crate::config::DEFAULT_LOOKUP_TIMEOUT;
use crate::types::Consistency;

pub use crate::transport::MockTransport;

/// Returns a [`Client`] backed by `mock`.
pub fn mock_client(mock: Arc<MockTransport>) -> Client {
    Client::from_inner(crate::client::ClientInner {
        endpoint: "mock://".to_owned(),
        transport: mock,
        lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        read_consistency: Consistency::default(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{Authorizer, ObjectRef, Pagination, SubjectRef};

    #[tokio::test]
    async fn test_mock_client_reads_its_mock() {
        let mock = Arc::new(MockTransport::new());
        let client = mock_client(mock.clone());
        let battle = ObjectRef::new("game_portal", "battle");
        let attacker = SubjectRef::new("user", 1);

        client.grant(&battle, "solo_attacker", &attacker).await.unwrap();
        assert_eq!(mock.relationships().len(), 1);
        assert_eq!(
            client.relations(&battle, &attacker, Pagination::default()).await.unwrap(),
            vec!["solo_attacker"]
        );
        assert_eq!(client.endpoint(), "mock://");
    }
}
