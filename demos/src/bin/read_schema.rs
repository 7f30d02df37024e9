//! Prints the schema of a SpiceDB instance.
//!
//! # Running
//!
//! ```bash
//! export SPICEDB_ENDPOINT="localhost:50051"
//! export SPICEDB_TOKEN="somerandomkeyhere"
//! export SPICEDB_INSECURE=1
//!
//! cargo run -p spicedb-facade-demos --bin read_schema
//! ```

use spicedb_facade::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = ClientBuilder::from_config(ClientConfig::from_env()?).build().await?;

    let schema = client.read_schema().await?;
    println!("{schema}");
    Ok(())
}
