//! Client builder with typestate pattern.

use std::{marker::PhantomData, sync::Arc, time::Duration};

use tracing::debug;
use url::Url;

use super::inner::ClientInner;
use crate::{
    Client, Error,
    config::{ClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_LOOKUP_TIMEOUT, DEFAULT_TIMEOUT, TlsConfig},
    transport::{GrpcTransport, TransportClient},
    types::Consistency,
};

/// Marker type: URL not yet provided.
pub struct NoUrl;

/// Marker type: URL has been provided.
pub struct HasUrl;

/// Marker type: token not yet provided.
pub struct NoToken;

/// Marker type: token has been provided.
pub struct HasToken;

/// Builder for creating [`Client`] instances.
///
/// Uses the typestate pattern to ensure the required configuration
/// (endpoint and token) is provided at compile time.
///
/// ## Required Configuration
///
/// - `url()`: The SpiceDB gRPC endpoint, e.g. `spicedb.internal:50051`
/// - `token()`: The preshared key
///
/// ## Optional Configuration
///
/// - `insecure()`: Plaintext channel, for local development
/// - `tls_config()`: Custom CA or client certificate
/// - `timeout()` / `connect_timeout()`: Per-request and connect timeouts
/// - `lookup_timeout()`: Joint deadline for `resources_many`
/// - `read_consistency()`: Consistency for relationship reads and lookups
///
/// ## Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use spicedb_facade::Client;
///
/// # async fn example() -> Result<(), spicedb_facade::Error> {
/// let client = Client::builder()
///     .url("localhost:50051")
///     .token("somerandomkeyhere")
///     .insecure()
///     .lookup_timeout(Duration::from_secs(5))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder<UrlState, TokenState> {
    url: Option<String>,
    token: Option<String>,
    insecure: bool,
    tls_config: TlsConfig,
    timeout: Duration,
    connect_timeout: Duration,
    lookup_timeout: Duration,
    read_consistency: Consistency,
    _url_state: PhantomData<UrlState>,
    _token_state: PhantomData<TokenState>,
}

impl ClientBuilder<NoUrl, NoToken> {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self {
            url: None,
            token: None,
            insecure: false,
            tls_config: TlsConfig::default(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            read_consistency: Consistency::default(),
            _url_state: PhantomData,
            _token_state: PhantomData,
        }
    }
}

impl Default for ClientBuilder<NoUrl, NoToken> {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder<HasUrl, HasToken> {
    /// Creates a builder preloaded from a [`ClientConfig`].
    ///
    /// ```rust
    /// use spicedb_facade::{ClientBuilder, ClientConfig};
    ///
    /// let config = ClientConfig::builder()
    ///     .endpoint("localhost:50051")
    ///     .token("somerandomkeyhere")
    ///     .insecure(true)
    ///     .build();
    /// let builder = ClientBuilder::from_config(config);
    /// # let _ = builder;
    /// ```
    pub fn from_config(config: ClientConfig) -> Self {
        let tls_config = config.tls_config();
        let builder = ClientBuilder::new()
            .url(config.endpoint)
            .token(config.token)
            .tls_config(tls_config)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .lookup_timeout(config.lookup_timeout);
        if config.insecure { builder.insecure() } else { builder }
    }
}

impl<T> ClientBuilder<NoUrl, T> {
    /// Sets the SpiceDB endpoint.
    ///
    /// The scheme may be omitted; it is then derived from
    /// [`insecure`](Self::insecure): `http` when set, `https` otherwise.
    pub fn url(self, url: impl Into<String>) -> ClientBuilder<HasUrl, T> {
        ClientBuilder {
            url: Some(url.into()),
            token: self.token,
            insecure: self.insecure,
            tls_config: self.tls_config,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            lookup_timeout: self.lookup_timeout,
            read_consistency: self.read_consistency,
            _url_state: PhantomData,
            _token_state: PhantomData,
        }
    }
}

impl<U> ClientBuilder<U, NoToken> {
    /// Sets the preshared key sent as a bearer token on every call.
    pub fn token(self, token: impl Into<String>) -> ClientBuilder<U, HasToken> {
        ClientBuilder {
            url: self.url,
            token: Some(token.into()),
            insecure: self.insecure,
            tls_config: self.tls_config,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            lookup_timeout: self.lookup_timeout,
            read_consistency: self.read_consistency,
            _url_state: PhantomData,
            _token_state: PhantomData,
        }
    }
}

impl<U, T> ClientBuilder<U, T> {
    /// Allows a plaintext `http` channel.
    ///
    /// **WARNING**: The token is sent unencrypted. Only use this for local
    /// development or a trusted network.
    #[must_use]
    pub fn insecure(mut self) -> Self {
        self.insecure = true;
        self
    }

    /// Sets the TLS configuration, used for `https` endpoints.
    #[must_use]
    pub fn tls_config(mut self, config: TlsConfig) -> Self {
        self.tls_config = config;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the joint deadline for a `resources_many` fan-out.
    #[must_use]
    pub fn lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Sets the consistency used by relationship reads and resource lookups.
    ///
    /// Checks and expansions take their consistency per call.
    #[must_use]
    pub fn read_consistency(mut self, consistency: Consistency) -> Self {
        self.read_consistency = consistency;
        self
    }
}

impl ClientBuilder<HasUrl, HasToken> {
    /// Builds the client over a caller-supplied transport.
    ///
    /// The endpoint is still validated but no channel is created, which is
    /// how tests run the client against a
    /// [`MockTransport`](crate::testing::MockTransport).
    pub fn build_with_transport(self, transport: Arc<dyn TransportClient>) -> Result<Client, Error> {
        let (endpoint, _token) = self.validate()?;
        Ok(Client::from_inner(ClientInner {
            endpoint: endpoint.to_string(),
            transport,
            lookup_timeout: self.lookup_timeout,
            read_consistency: self.read_consistency,
        }))
    }

    /// Builds the client.
    ///
    /// The channel connects lazily, so an unreachable SpiceDB surfaces on
    /// the first call rather than here.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Configuration`](crate::ErrorKind::Configuration) if:
    /// - The endpoint is invalid
    /// - The endpoint is `http` and [`insecure`](Self::insecure) was not set
    /// - The token is empty or not a valid header value
    /// - A configured CA or client certificate cannot be read
    pub async fn build(self) -> Result<Client, Error> {
        let (endpoint, token) = self.validate()?;

        let transport = GrpcTransport::builder(endpoint.clone(), token)
            .tls_config(self.tls_config)
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .build()?;

        debug!(endpoint = %endpoint, insecure = self.insecure, "client configured");

        Ok(Client::from_inner(ClientInner {
            endpoint: endpoint.to_string(),
            transport: Arc::new(transport),
            lookup_timeout: self.lookup_timeout,
            read_consistency: self.read_consistency,
        }))
    }

    fn validate(&self) -> Result<(Url, String), Error> {
        let url = self.url.as_deref().ok_or_else(|| Error::configuration("URL is required"))?;
        let token = self
            .token
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::configuration("token is required"))?;
        Ok((resolve_endpoint(url, self.insecure)?, token))
    }
}

/// Parses an endpoint, deriving the scheme from `insecure` when it is absent.
fn resolve_endpoint(raw: &str, insecure: bool) -> Result<Url, Error> {
    let raw = raw.trim();
    let with_scheme = if raw.contains("://") {
        raw.to_owned()
    } else {
        format!("{}://{}", if insecure { "http" } else { "https" }, raw)
    };

    let url = Url::parse(&with_scheme).map_err(|e| {
        Error::configuration(format!("invalid endpoint '{}': {}", raw, e)).with_source(e)
    })?;
    if url.host_str().is_none() {
        return Err(Error::configuration(format!("endpoint '{}' has no host", raw)));
    }

    match url.scheme() {
        "https" => Ok(url),
        "http" if insecure => Ok(url),
        "http" => Err(Error::configuration(
            "HTTPS is required. Use .insecure() for a plaintext endpoint.",
        )),
        other => Err(Error::configuration(format!("unsupported endpoint scheme '{}'", other))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::{ErrorKind, testing::MockTransport};

    #[test_case("localhost:50051", false, "https://localhost:50051/" ; "bare secure")]
    #[test_case("localhost:50051", true, "http://localhost:50051/" ; "bare insecure")]
    #[test_case("https://spicedb.internal:443", false, "https://spicedb.internal/" ; "explicit https")]
    #[test_case("https://spicedb.internal:50051", true, "https://spicedb.internal:50051/" ; "https stays https when insecure")]
    #[test_case("http://localhost:50051", true, "http://localhost:50051/" ; "explicit http insecure")]
    fn test_resolve_endpoint(raw: &str, insecure: bool, expected: &str) {
        assert_eq!(resolve_endpoint(raw, insecure).unwrap().as_str(), expected);
    }

    #[test_case("http://localhost:50051" ; "http without insecure")]
    #[test_case("ftp://localhost:50051" ; "other scheme")]
    #[test_case("https://" ; "no host")]
    fn test_resolve_endpoint_rejects(raw: &str) {
        let err = resolve_endpoint(raw, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_builder_typestate() {
        // The following compiles; omitting url() or token() would not.
        let _builder = ClientBuilder::new().token("key").url("localhost:50051").insecure();
    }

    #[tokio::test]
    async fn test_build_requires_https() {
        let err = ClientBuilder::new()
            .url("http://localhost:50051")
            .token("key")
            .build()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("HTTPS"));
    }

    #[tokio::test]
    async fn test_build_insecure_is_lazy() {
        // Nothing listens on this port; the channel connects on first use.
        let client = ClientBuilder::new()
            .url("127.0.0.1:1")
            .token("key")
            .insecure()
            .build()
            .await
            .unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:1/");
    }

    #[test]
    fn test_empty_token_rejected() {
        let err = ClientBuilder::new()
            .url("localhost:50051")
            .token("")
            .build_with_transport(Arc::new(MockTransport::new()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_optional_configs() {
        let builder = ClientBuilder::new()
            .url("localhost:50051")
            .token("key")
            .timeout(Duration::from_secs(3))
            .connect_timeout(Duration::from_secs(1))
            .lookup_timeout(Duration::from_secs(2))
            .read_consistency(Consistency::FullyConsistent);

        assert_eq!(builder.timeout, Duration::from_secs(3));
        assert_eq!(builder.connect_timeout, Duration::from_secs(1));
        assert_eq!(builder.lookup_timeout, Duration::from_secs(2));
        assert_eq!(builder.read_consistency, Consistency::FullyConsistent);
        assert!(!builder.insecure);
    }

    #[test]
    fn test_from_config() {
        let config = ClientConfig::builder()
            .endpoint("localhost:50051")
            .token("key")
            .insecure(true)
            .ca_cert_file("/etc/ssl/spicedb.pem")
            .lookup_timeout(Duration::from_secs(4))
            .build();
        let builder = ClientBuilder::from_config(config);

        assert!(builder.insecure);
        assert_eq!(builder.url.as_deref(), Some("localhost:50051"));
        assert_eq!(builder.token.as_deref(), Some("key"));
        assert!(builder.tls_config.has_custom_ca());
        assert_eq!(builder.lookup_timeout, Duration::from_secs(4));
    }

    #[test]
    fn test_builder_default() {
        let builder: ClientBuilder<NoUrl, NoToken> = ClientBuilder::default();
        assert!(builder.url.is_none());
        assert!(builder.token.is_none());
        assert_eq!(builder.lookup_timeout, DEFAULT_LOOKUP_TIMEOUT);
    }
}
