//! Read consistency selection and write revision tokens.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Consistency requirement attached to a read.
///
/// SpiceDB evaluates reads against a snapshot of the relationship store.
/// `ServerDefault` (the default) sends no requirement and lets the server
/// decide, which for SpiceDB means minimize latency.
///
/// The enum makes "fully consistent and minimize latency at once"
/// unrepresentable. Callers that hold the two choices as independent flags
/// go through [`Consistency::from_flags`], which gives minimize latency
/// precedence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    /// Defer to the server's default consistency policy.
    #[default]
    ServerDefault,

    /// Evaluate against the newest snapshot (read-your-writes).
    FullyConsistent,

    /// Evaluate against whichever snapshot is cheapest; may be stale.
    MinimizeLatency,
}

impl Consistency {
    /// Resolves a pair of consistency flags.
    ///
    /// `minimize_latency` takes precedence when both are set; neither set
    /// yields [`Consistency::ServerDefault`].
    ///
    /// ```rust
    /// use spicedb_facade::Consistency;
    ///
    /// assert_eq!(Consistency::from_flags(true, true), Consistency::MinimizeLatency);
    /// assert_eq!(Consistency::from_flags(true, false), Consistency::FullyConsistent);
    /// assert_eq!(Consistency::from_flags(false, false), Consistency::ServerDefault);
    /// ```
    pub fn from_flags(full_consistency: bool, minimize_latency: bool) -> Self {
        match (full_consistency, minimize_latency) {
            (_, true) => Consistency::MinimizeLatency,
            (true, false) => Consistency::FullyConsistent,
            (false, false) => Consistency::ServerDefault,
        }
    }
}

/// The revision token SpiceDB returns for a successful write.
///
/// Tokens are opaque; they are never parsed or built client-side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZedToken(String);

impl ZedToken {
    /// Wraps a token value received from the server.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw token value.
    #[inline]
    pub fn value(&self) -> &str {
        &self.0
    }

    /// Consumes the token and returns the inner value.
    #[inline]
    pub fn into_value(self) -> String {
        self.0
    }

    /// Returns `true` if the token value is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ZedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ZedToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(false, false, Consistency::ServerDefault)]
    #[test_case(true, false, Consistency::FullyConsistent)]
    #[test_case(false, true, Consistency::MinimizeLatency)]
    #[test_case(true, true, Consistency::MinimizeLatency ; "minimize latency wins")]
    fn test_from_flags(full: bool, minimize: bool, expected: Consistency) {
        assert_eq!(Consistency::from_flags(full, minimize), expected);
    }

    #[test]
    fn test_default_defers_to_server() {
        assert_eq!(Consistency::default(), Consistency::ServerDefault);
    }

    #[test]
    fn test_zed_token_accessors() {
        let token = ZedToken::new("GhUKEzE2");
        assert_eq!(token.value(), "GhUKEzE2");
        assert_eq!(token.to_string(), "GhUKEzE2");
        assert!(!token.is_empty());
        assert!(ZedToken::new("").is_empty());
    }
}
