//! Error types for the SpiceDB facade.
//!
//! Every fallible operation returns [`Error`], categorized by [`ErrorKind`].
//! Three families matter to callers:
//!
//! - remote failures raised by SpiceDB or the gRPC channel, mapped from
//!   [`tonic::Status`] and [`tonic::transport::Error`];
//! - response-shape failures ([`ErrorKind::InvalidResponse`]), where SpiceDB
//!   answered successfully but left out a field the facade depends on, such
//!   as the write token of a relationship update;
//! - validation failures ([`ErrorKind::InvalidArgument`]), raised locally
//!   before any request leaves the process.
//!
//! ## Key Invariant
//!
//! A denied check is not an error. `check()` returns [`Access::Forbid`] and
//! `is_allowed()` returns `Ok(false)`.
//!
//! [`Access::Forbid`]: crate::Access::Forbid

mod core;
mod kind;

pub use self::core::Error;
pub use kind::ErrorKind;

/// A specialized `Result` type for facade operations.
pub type Result<T> = std::result::Result<T, Error>;
