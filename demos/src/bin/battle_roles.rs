//! Assigns and removes battle roles, then inspects the result.
//!
//! Expects a schema along the lines of:
//!
//! ```text
//! definition user {}
//!
//! definition game_portal/battle {
//!     relation solo_attacker: user
//!     relation solo_defender: user
//!     permission battle_view = solo_attacker + solo_defender
//! }
//! ```
//!
//! # Running
//!
//! ```bash
//! export SPICEDB_ENDPOINT="localhost:50051"
//! export SPICEDB_TOKEN="somerandomkeyhere"
//! export SPICEDB_INSECURE=1
//!
//! RUST_LOG=spicedb_facade=debug cargo run -p spicedb-facade-demos --bin battle_roles
//! ```

use spicedb_facade::prelude::*;
use tracing_subscriber::EnvFilter;

const BATTLE: &str = "game_portal/battle";
const USER: &str = "user";
const ATTACKER: &str = "solo_attacker";
const DEFENDER: &str = "solo_defender";

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::from_env()?;
    let client = ClientBuilder::from_config(config)
        .read_consistency(Consistency::FullyConsistent)
        .build()
        .await?;

    let battle = ObjectRef::new(BATTLE, 1);
    let user_one = SubjectRef::new(USER, 1);
    let user_two = SubjectRef::new(USER, 2);

    client.grant(&battle, ATTACKER, &user_one).await?;
    client.grant(&battle, DEFENDER, &user_two).await?;

    // user 1 never was a defender; revoking is still fine.
    client.revoke(&battle, DEFENDER, &user_one).await?;
    client.revoke(&battle, DEFENDER, &user_two).await?;

    let resources = client
        .resources_with_relations(BATTLE, &user_one, Some(ATTACKER), Pagination::default())
        .await?;
    println!("resources_with_relations: {}", serde_json::to_string_pretty(&resources)?);

    let subjects = client
        .subjects_with_relations(BATTLE, Some(1.into()), Some(USER), Pagination::default())
        .await?;
    println!("subjects_with_relations: {}", serde_json::to_string_pretty(&subjects)?);

    let relations = client.relations(&battle, &user_one, Pagination::default()).await?;
    println!("relations: {relations:?}");

    let request = CheckRequest::new(USER, 1, BATTLE, 1, "battle_view");
    let access = client.check(&request, Consistency::FullyConsistent).await?;
    println!("{request}: {access}");

    let is_attacker = client.check_relation(&battle, ATTACKER, &user_one).await?;
    println!("{battle}#{ATTACKER}@{user_one}: {is_attacker}");

    Ok(())
}
