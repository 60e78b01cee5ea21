use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identifier for a quiz session.
///
/// Backed by a version-4 UUID. The bytes may come from any random source, which
/// lets a seeded engine hand out reproducible ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a `SessionId` from an existing UUID.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Builds a v4-layout id from 16 random bytes.
    #[must_use]
    pub fn from_random_bytes(bytes: [u8; 16]) -> Self {
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

// ─── FromStr ───────────────────────────────────────────────────────────────────

/// Error type for parsing a `SessionId` from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    raw: String,
}

impl ParseIdError {
    /// The rejected input.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse SessionId from {:?}", self.raw)
    }
}

impl std::error::Error for ParseIdError {}

/// Length of the lowercase hyphenated form produced by `Display`.
const HYPHENATED_LEN: usize = 36;

/// Only the exact form `Display` produces is accepted, so each session has a
/// single spelling. Braced, simple, `urn:uuid:`, uppercase, and padded inputs
/// are rejected.
impl FromStr for SessionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let reject = || ParseIdError { raw: s.to_string() };
        if s.len() != HYPHENATED_LEN || s.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(reject());
        }
        Uuid::parse_str(s).map(SessionId::new).map_err(|_| reject())
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
