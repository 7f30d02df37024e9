//! Internal client state.

use std::sync::Arc;
use std::time::Duration;

use crate::transport::TransportClient;
use crate::types::Consistency;

pub(crate) struct ClientInner {
    /// Endpoint the transport talks to, for diagnostics.
    pub endpoint: String,

    /// Backend for every remote call.
    pub transport: Arc<dyn TransportClient>,

    /// Joint deadline for a `resources_many` fan-out.
    pub lookup_timeout: Duration,

    /// Consistency used by relationship reads and lookups.
    pub read_consistency: Consistency,
}
