//! Order identifiers
//!
//! Orders are keyed by ULIDs: 48 bits of millisecond timestamp followed by
//! 80 bits of randomness, rendered as 26 Crockford base32 characters. The
//! canonical (upper-case) text form sorts the same way the timestamps do,
//! which is what makes a customer's orders come back in creation order.

use parking_lot::Mutex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;
use ulid::{Generator, Ulid};

/// Process-wide generator: ids minted within the same millisecond increment
/// the random part instead of drawing a fresh one.
static GENERATOR: LazyLock<Mutex<Generator>> = LazyLock::new(|| Mutex::new(Generator::new()));

/// Rejected order identifier
#[derive(Debug, Error)]
#[error("invalid order id {input:?}: must be a valid ulid ({source})")]
pub struct InvalidOrderId {
    input: String,
    #[source]
    source: ulid::DecodeError,
}

impl InvalidOrderId {
    /// The text that failed to parse
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// Validated order identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderId(Ulid);

impl OrderId {
    /// Parse an identifier, accepting either letter case.
    pub fn parse(input: &str) -> Result<Self, InvalidOrderId> {
        Ulid::from_string(input)
            .map(Self)
            .map_err(|source| InvalidOrderId {
                input: input.to_string(),
                source,
            })
    }

    /// Mint a new identifier, monotonic within this process.
    pub fn generate() -> Self {
        let mut generator = GENERATOR.lock();
        // Overflow needs 2^80 ids in one millisecond; fall back to a fresh draw.
        Self(generator.generate().unwrap_or_else(|_| Ulid::new()))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = InvalidOrderId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
