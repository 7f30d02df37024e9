//! Integration tests for spicedb-facade.
//!
//! These tests run against a live SpiceDB loaded with `bootstrap.yaml`:
//!
//! ```bash
//! spicedb serve-testing --load-configs tests/integration/bootstrap.yaml
//! ```
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --features integration-tests --test integration
//!
//! # Run with verbose output
//! RUST_LOG=spicedb_facade=debug cargo test --features integration-tests --test integration -- --nocapture
//! ```
//!
//! # Environment Variables
//!
//! - `SPICEDB_ENDPOINT`: gRPC endpoint (default: `localhost:50051`)
//! - `SPICEDB_TOKEN`: preshared key (default: `integration-tests`)
//! - `SPICEDB_INSECURE`: plaintext channel (default: `true`)

mod common;
mod facade_tests;
