//! Configuration types for the client.
//!
//! - [`TlsConfig`]: CA and client certificates for TLS connections
//! - [`ClientConfig`]: Endpoint, token and timeouts, loadable from the
//!   environment

mod tls;

pub use tls::TlsConfig;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::Error;

/// Endpoint used when `SPICEDB_ENDPOINT` is not set.
pub const DEFAULT_ENDPOINT: &str = "localhost:50051";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default joint deadline for a `resources_many` fan-out.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for a [`Client`](crate::Client).
///
/// ## Example
///
/// ```rust
/// use std::time::Duration;
/// use spicedb_facade::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .endpoint("localhost:50051")
///     .token("somerandomkeyhere")
///     .insecure(true)
///     .lookup_timeout(Duration::from_secs(5))
///     .build();
/// assert!(config.insecure);
/// ```
#[derive(Clone, PartialEq, Eq, bon::Builder)]
pub struct ClientConfig {
    /// SpiceDB gRPC endpoint, with or without scheme.
    #[builder(into)]
    pub endpoint: String,

    /// Preshared key sent as a bearer token.
    #[builder(into)]
    pub token: String,

    /// Use a plaintext channel instead of TLS.
    #[builder(default)]
    pub insecure: bool,

    /// CA bundle for TLS; native roots are used when unset.
    #[builder(into)]
    pub ca_cert_file: Option<PathBuf>,

    /// Per-request timeout.
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,

    /// Connect timeout.
    #[builder(default = DEFAULT_CONNECT_TIMEOUT)]
    pub connect_timeout: Duration,

    /// Joint deadline for a `resources_many` fan-out.
    #[builder(default = DEFAULT_LOOKUP_TIMEOUT)]
    pub lookup_timeout: Duration,
}

impl ClientConfig {
    /// Reads the configuration from environment variables.
    ///
    /// | Variable                           | Meaning                       | Default            |
    /// |------------------------------------|-------------------------------|--------------------|
    /// | `SPICEDB_ENDPOINT`                 | gRPC endpoint                 | `localhost:50051`  |
    /// | `SPICEDB_TOKEN`                    | preshared key                 | required           |
    /// | `SPICEDB_INSECURE`                 | `1`/`true` for plaintext      | `false`            |
    /// | `GRPC_DEFAULT_SSL_ROOTS_FILE_PATH` | CA bundle for TLS             | native roots       |
    /// | `SPICEDB_TIMEOUT_SECS`             | per-request timeout           | 30                 |
    /// | `SPICEDB_LOOKUP_TIMEOUT_SECS`      | `resources_many` deadline     | 10                 |
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("SPICEDB_TOKEN")
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::configuration("SPICEDB_TOKEN must be set"))?;
        let endpoint = lookup("SPICEDB_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned());
        let insecure = match lookup("SPICEDB_INSECURE") {
            Some(value) => parse_flag("SPICEDB_INSECURE", &value)?,
            None => false,
        };
        let timeout = parse_secs(&lookup, "SPICEDB_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT);
        let lookup_timeout =
            parse_secs(&lookup, "SPICEDB_LOOKUP_TIMEOUT_SECS")?.unwrap_or(DEFAULT_LOOKUP_TIMEOUT);

        Ok(Self::builder()
            .endpoint(endpoint)
            .token(token)
            .insecure(insecure)
            .maybe_ca_cert_file(lookup("GRPC_DEFAULT_SSL_ROOTS_FILE_PATH").map(PathBuf::from))
            .timeout(timeout)
            .lookup_timeout(lookup_timeout)
            .build())
    }

    /// Returns the TLS configuration implied by this config.
    pub fn tls_config(&self) -> TlsConfig {
        TlsConfig::builder()
            .maybe_ca_cert_file(self.ca_cert_file.clone())
            .build()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .field("insecure", &self.insecure)
            .field("ca_cert_file", &self.ca_cert_file)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("lookup_timeout", &self.lookup_timeout)
            .finish()
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => Err(Error::configuration(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>, Error>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| Error::configuration(format!("{} must be whole seconds, got '{}'", key, value)))
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::ErrorKind;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[("SPICEDB_TOKEN", "key")])).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.token, "key");
        assert!(!config.insecure);
        assert_eq!(config.ca_cert_file, None);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.lookup_timeout, DEFAULT_LOOKUP_TIMEOUT);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("SPICEDB_TOKEN", "key"),
            ("SPICEDB_ENDPOINT", "spicedb.internal:443"),
            ("SPICEDB_INSECURE", "true"),
            ("GRPC_DEFAULT_SSL_ROOTS_FILE_PATH", "/etc/ssl/spicedb.pem"),
            ("SPICEDB_TIMEOUT_SECS", "5"),
            ("SPICEDB_LOOKUP_TIMEOUT_SECS", "2"),
        ]))
        .unwrap();
        assert_eq!(config.endpoint, "spicedb.internal:443");
        assert!(config.insecure);
        assert_eq!(config.ca_cert_file, Some(PathBuf::from("/etc/ssl/spicedb.pem")));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.lookup_timeout, Duration::from_secs(2));
        assert!(config.tls_config().has_custom_ca());
    }

    #[test]
    fn test_from_lookup_requires_token() {
        let err = ClientConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = ClientConfig::from_lookup(lookup_from(&[("SPICEDB_TOKEN", "")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let bad_flag = lookup_from(&[("SPICEDB_TOKEN", "key"), ("SPICEDB_INSECURE", "maybe")]);
        assert!(ClientConfig::from_lookup(bad_flag).is_err());

        let bad_secs = lookup_from(&[("SPICEDB_TOKEN", "key"), ("SPICEDB_TIMEOUT_SECS", "1.5")]);
        assert!(ClientConfig::from_lookup(bad_secs).is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig::builder()
            .endpoint("localhost:50051")
            .token("super-secret")
            .build();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
