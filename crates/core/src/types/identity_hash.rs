//! One-way customer identity digest.

use core::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::email::Email;

/// A one-way digest standing in for a customer's contact address.
///
/// Orders never store the raw address. They store this SHA-256 digest of the
/// normalized (trimmed, lowercased) address instead, so the order record is
/// non-identifying on its own while still allowing correlation: the same
/// address always produces the same hash, which answers "has this address
/// ordered before?" without the address ever being retained.
///
/// The digest is fixed-width 64-character lowercase hex.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct IdentityHash(String);

impl IdentityHash {
    /// Length of the hex-encoded digest.
    pub const HEX_LENGTH: usize = 64;

    /// Digest a contact address.
    ///
    /// Normalization (trim + lowercase) happens here, so `A@B.com` and
    /// ` a@b.com ` hash identically.
    #[must_use]
    pub fn of(address: &str) -> Self {
        let normalized = address.trim().to_lowercase();
        let digest = Sha256::digest(normalized.as_bytes());
        Self(hex::encode(digest))
    }

    /// Digest a parsed [`Email`].
    #[must_use]
    pub fn of_email(email: &Email) -> Self {
        Self::of(email.as_str())
    }

    /// Returns the hex digest as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for IdentityHash {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for IdentityHash {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for IdentityHash {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
