//! The SpiceDB-backed [`Authorizer`](crate::Authorizer).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spicedb_facade::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let client = Client::builder()
//!     .url("localhost:50051")
//!     .token("somerandomkeyhere")
//!     .insecure()
//!     .build()
//!     .await?;
//!
//! let request = CheckRequest::new("user", 1, "game_portal", "battle", "view");
//! let allowed = client.is_allowed(&request, Consistency::default()).await?;
//! # let _ = allowed;
//! # Ok(())
//! # }
//! ```

mod builder;
mod inner;
mod operations;

pub use builder::{ClientBuilder, HasToken, HasUrl, NoToken, NoUrl};

pub(crate) use inner::ClientInner;

use std::sync::Arc;

use tracing::instrument;

use crate::transport::{Transport, TransportClient};
use crate::Error;

/// A SpiceDB client implementing [`Authorizer`](crate::Authorizer).
///
/// ## Thread Safety
///
/// `Client` is `Clone` and thread-safe. Clones share one channel, so a
/// single client can serve every task in a process.
///
/// ```rust,no_run
/// use spicedb_facade::Client;
///
/// # async fn example() -> Result<(), spicedb_facade::Error> {
/// let client = Client::builder()
///     .url("spicedb.internal:443")
///     .token("somerandomkeyhere")
///     .build()
///     .await?;
///
/// let client2 = client.clone();
/// tokio::spawn(async move {
///     let _schema = client2.read_schema().await;
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Creates a new client builder.
    ///
    /// The builder uses the typestate pattern to ensure the endpoint and
    /// token are provided at compile time.
    pub fn builder() -> ClientBuilder<NoUrl, NoToken> {
        ClientBuilder::new()
    }

    /// Returns the endpoint the client talks to.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Returns the kind of transport backing this client.
    pub fn transport_type(&self) -> Transport {
        self.inner.transport.transport_type()
    }

    /// Reads the current schema text.
    #[instrument(skip(self), fields(endpoint = %self.inner.endpoint))]
    pub async fn read_schema(&self) -> Result<String, Error> {
        self.inner.transport.read_schema().await
    }

    /// Creates a client from the inner implementation.
    pub(crate) fn from_inner(inner: ClientInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub(crate) fn transport(&self) -> &dyn TransportClient {
        self.inner.transport.as_ref()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.inner.endpoint)
            .field("transport", &self.transport_type())
            .finish_non_exhaustive()
    }
}
