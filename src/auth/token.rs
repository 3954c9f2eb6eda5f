//! Verification of the JSON web tokens issued by the payments backend.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// The role a user needs to use the admin dashboard.
pub const ADMIN_ROLE: &str = "Admin";

/// The claims the dashboard cares about. Any other claims are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Expiry as seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<f64>,
    /// The user's role, e.g. "Admin".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl TokenClaims {
    /// Whether the token has expired at `now`. A token without an expiry is
    /// treated as expired.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        match self.exp {
            Some(exp) => now.unix_timestamp() as f64 >= exp,
            None => true,
        }
    }

    /// Whether the role is exactly [ADMIN_ROLE].
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}

/// Checks token signatures against the shared HMAC secret.
///
/// Expiry is left to the caller so that it can be checked against an
/// injected clock.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier for tokens signed with `secret` using HS256, HS384
    /// or HS512.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Verify the signature of `token` and decode its claims.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidToken] if the token is malformed, was signed
    /// with another secret or an unsupported algorithm, or its claims have the
    /// wrong types.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, Error> {
        decode::<TokenClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|error| Error::InvalidToken(error.to_string()))
    }
}
