//! TLS configuration for secure connections.

use std::path::{Path, PathBuf};

use tonic::transport::{Certificate, ClientTlsConfig, Identity};

use crate::Error;

/// Configuration for TLS connections to SpiceDB.
///
/// By default the client trusts the platform's native root certificates.
/// A custom CA replaces them, which is the usual setup for a SpiceDB
/// deployment with a self-signed certificate.
///
/// ## Example: Custom CA
///
/// ```rust
/// use spicedb_facade::TlsConfig;
///
/// let config = TlsConfig::builder()
///     .ca_cert_file("/etc/spicedb/ca.crt")
///     .build();
/// assert!(config.has_custom_ca());
/// ```
///
/// ## Example: Client Certificate (mTLS)
///
/// ```rust
/// use spicedb_facade::TlsConfig;
///
/// let config = TlsConfig::builder()
///     .client_cert_file("/path/to/client.crt")
///     .client_key_file("/path/to/client.key")
///     .build();
/// assert!(config.is_mtls_configured());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, bon::Builder)]
pub struct TlsConfig {
    /// Custom CA certificate file path.
    #[builder(into)]
    pub ca_cert_file: Option<PathBuf>,

    /// Custom CA certificate PEM data. Takes precedence over `ca_cert_file`.
    #[builder(into)]
    pub ca_cert_pem: Option<String>,

    /// Client certificate file path (for mTLS).
    #[builder(into)]
    pub client_cert_file: Option<PathBuf>,

    /// Client key file path (for mTLS).
    #[builder(into)]
    pub client_key_file: Option<PathBuf>,

    /// Overrides the server name checked against the certificate.
    #[builder(into)]
    pub domain_name: Option<String>,
}

impl TlsConfig {
    /// Returns `true` if mTLS is configured.
    pub fn is_mtls_configured(&self) -> bool {
        self.client_cert_file.is_some() && self.client_key_file.is_some()
    }

    /// Returns `true` if custom CA is configured.
    pub fn has_custom_ca(&self) -> bool {
        self.ca_cert_file.is_some() || self.ca_cert_pem.is_some()
    }

    /// Builds the tonic TLS configuration, reading any referenced files.
    pub(crate) fn to_client_tls_config(&self) -> Result<ClientTlsConfig, Error> {
        let mut config = ClientTlsConfig::new();

        let ca_pem = match (&self.ca_cert_pem, &self.ca_cert_file) {
            (Some(pem), _) => Some(pem.clone().into_bytes()),
            (None, Some(path)) => Some(read_pem(path, "CA file")?),
            (None, None) => None,
        };
        config = match ca_pem {
            Some(pem) => config.ca_certificate(Certificate::from_pem(pem)),
            None => config.with_native_roots(),
        };

        match (&self.client_cert_file, &self.client_key_file) {
            (Some(cert), Some(key)) => {
                let cert = read_pem(cert, "client certificate")?;
                let key = read_pem(key, "client key")?;
                config = config.identity(Identity::from_pem(cert, key));
            }
            (Some(_), None) => {
                return Err(Error::configuration(
                    "client_cert_file is set without client_key_file",
                ));
            }
            (None, Some(_)) => {
                return Err(Error::configuration(
                    "client_key_file is set without client_cert_file",
                ));
            }
            (None, None) => {}
        }

        if let Some(ref domain) = self.domain_name {
            config = config.domain_name(domain.clone());
        }

        Ok(config)
    }
}

fn read_pem(path: &Path, what: &str) -> Result<Vec<u8>, Error> {
    std::fs::read(path).map_err(|e| {
        Error::configuration(format!("cannot read {} {}: {}", what, path.display(), e))
            .with_source(e)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_default() {
        let config = TlsConfig::default();
        assert!(config.ca_cert_file.is_none());
        assert!(!config.is_mtls_configured());
        assert!(!config.has_custom_ca());
        assert!(config.to_client_tls_config().is_ok());
    }

    #[test]
    fn test_ca_cert_file() {
        let config = TlsConfig::builder().ca_cert_file("/path/to/ca.crt").build();
        assert!(config.has_custom_ca());
        assert_eq!(config.ca_cert_file, Some(PathBuf::from("/path/to/ca.crt")));
    }

    #[test]
    fn test_missing_ca_file_is_configuration_error() {
        let config = TlsConfig::builder()
            .ca_cert_file("/nonexistent/spicedb-ca.crt")
            .build();
        let err = config.to_client_tls_config().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_partial_mtls_is_configuration_error() {
        let cert_only = TlsConfig::builder()
            .client_cert_file("/path/to/client.crt")
            .build();
        assert!(!cert_only.is_mtls_configured());
        let err = cert_only.to_client_tls_config().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("client_key_file"));

        let key_only = TlsConfig::builder()
            .client_key_file("/path/to/client.key")
            .build();
        let err = key_only.to_client_tls_config().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("client_cert_file"));
    }

    #[test]
    fn test_missing_client_cert_is_configuration_error() {
        let config = TlsConfig::builder()
            .client_cert_file("/nonexistent/client.crt")
            .client_key_file("/nonexistent/client.key")
            .build();
        assert!(config.is_mtls_configured());
        let err = config.to_client_tls_config().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
