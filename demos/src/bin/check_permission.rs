//! Checks one permission, then the same question in bulk.
//!
//! # Running
//!
//! ```bash
//! export SPICEDB_ENDPOINT="localhost:50051"
//! export SPICEDB_TOKEN="somerandomkeyhere"
//! export SPICEDB_INSECURE=1
//!
//! # subject_type subject_id resource_type resource_id permission
//! cargo run -p spicedb-facade-demos --bin check_permission -- user 1 game_portal/battle 1 battle_view
//! ```

use std::env;

use spicedb_facade::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let [subject_type, subject_id, resource_type, resource_id, permission] = args.as_slice() else {
        eprintln!("usage: check_permission <subject_type> <subject_id> <resource_type> <resource_id> <permission>");
        std::process::exit(2);
    };

    let client = ClientBuilder::from_config(ClientConfig::from_env()?).build().await?;

    let request = CheckRequest::new(subject_type, subject_id, resource_type, resource_id, permission);
    let access = client.check(&request, Consistency::FullyConsistent).await?;
    println!("{request}: {access}");

    // Access::Undefined means SpiceDB could not give a definitive answer.
    if access == Access::Undefined {
        println!("  (conditional on caveat context that was not supplied)");
    }

    let batch = client
        .is_allowed_many(std::slice::from_ref(&request), Consistency::MinimizeLatency)
        .await?;
    println!("bulk: {}", batch[&request]);
    Ok(())
}
