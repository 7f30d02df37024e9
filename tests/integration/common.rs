//! Common test harness for integration tests.

use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use spicedb_facade::prelude::*;

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Installs a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Connects to the SpiceDB under test, reading fully consistent snapshots.
pub async fn client() -> Result<Client> {
    init_tracing();
    let config = ClientConfig::from_lookup(|key| {
        env::var(key).ok().or_else(|| match key {
            "SPICEDB_TOKEN" => Some("integration-tests".to_owned()),
            "SPICEDB_INSECURE" => Some("true".to_owned()),
            _ => None,
        })
    })
    .context("invalid SpiceDB configuration")?;

    ClientBuilder::from_config(config)
        .read_consistency(Consistency::FullyConsistent)
        .build()
        .await
        .context("failed to build client")
}

/// Returns an object id no other test in this run uses.
pub fn unique_id(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{}-{}-{}", prefix, nanos, COUNTER.fetch_add(1, Ordering::Relaxed))
}
