//! Human-presentable order reference.

use core::fmt;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Prefix carried by every Meridian order reference.
pub const REFERENCE_PREFIX: &str = "MER";

/// Characters drawn for the random suffix.
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of the random suffix.
const SUFFIX_LENGTH: usize = 6;

/// Errors that can occur when parsing an [`OrderReference`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum OrderReferenceError {
    /// The input does not match `MER-YYYY-XXXXXX`.
    #[error("order reference must be of the form {REFERENCE_PREFIX}-YYYY-XXXXXX")]
    Malformed,
}

/// A human-presentable order identifier: `MER-<year>-<random6>`.
///
/// The reference is what customers see on receipts and quote in support
/// conversations; it carries no PII. The suffix is drawn from a 36-character
/// alphabet, so a collision within a year is a ~1-in-2-billion event per
/// pair. Generation does NOT guarantee global uniqueness - the `UNIQUE`
/// constraint on the orders table does, and a collision surfaces as a
/// persistence conflict rather than being silently swallowed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OrderReference(String);

impl OrderReference {
    /// Generate a fresh reference for the current year.
    #[must_use]
    pub fn generate() -> Self {
        use rand::Rng;

        let mut rng = rand::rng();
        let mut suffix = String::with_capacity(SUFFIX_LENGTH);
        for _ in 0..SUFFIX_LENGTH {
            let idx = rng.random_range(0..SUFFIX_ALPHABET.len());
            suffix.push(char::from(SUFFIX_ALPHABET[idx]));
        }

        Self(format!(
            "{REFERENCE_PREFIX}-{}-{suffix}",
            Utc::now().year()
        ))
    }

    /// Parse a reference from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns [`OrderReferenceError::Malformed`] unless the input is
    /// `MER-<4 digits>-<6 chars from A-Z0-9>`.
    pub fn parse(s: &str) -> Result<Self, OrderReferenceError> {
        let mut parts = s.splitn(3, '-');

        let prefix = parts.next().unwrap_or("");
        let year = parts.next().unwrap_or("");
        let suffix = parts.next().unwrap_or("");

        let year_ok = year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit());
        let suffix_ok = suffix.len() == SUFFIX_LENGTH
            && suffix.bytes().all(|b| SUFFIX_ALPHABET.contains(&b));

        if prefix != REFERENCE_PREFIX || !year_ok || !suffix_ok {
            return Err(OrderReferenceError::Malformed);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OrderReference {
    type Err = OrderReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderReference {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderReference {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderReference {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generated_reference_parses() {
        let reference = OrderReference::generate();
        assert!(OrderReference::parse(reference.as_str()).is_ok());
    }

    #[test]
    fn test_generated_reference_shape() {
        let reference = OrderReference::generate();
        let parts: Vec<&str> = reference.as_str().split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], REFERENCE_PREFIX);
        assert_eq!(parts[1], Utc::now().year().to_string());
        assert_eq!(parts[2].len(), SUFFIX_LENGTH);
        assert!(
            parts[2]
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        );
    }

    #[test]
    fn test_successive_calls_differ() {
        let mut previous = OrderReference::generate();
        for _ in 0..10_000 {
            let next = OrderReference::generate();
            assert_ne!(previous, next);
            previous = next;
        }
    }

    #[test]
    fn test_suffix_varies_across_sample() {
        // With a 36^6 suffix space, a small sample should be collision-free.
        let sample: HashSet<String> = (0..100)
            .map(|_| OrderReference::generate().as_str().to_owned())
            .collect();
        assert_eq!(sample.len(), 100);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(OrderReference::parse("MER-2025-ABC123").is_ok());
        assert!(OrderReference::parse("mer-2025-ABC123").is_err());
        assert!(OrderReference::parse("MER-25-ABC123").is_err());
        assert!(OrderReference::parse("MER-2025-abc123").is_err());
        assert!(OrderReference::parse("MER-2025-ABC12").is_err());
        assert!(OrderReference::parse("MER-2025-ABC1234").is_err());
        assert!(OrderReference::parse("OTHER-2025-ABC123").is_err());
        assert!(OrderReference::parse("").is_err());
    }
}
