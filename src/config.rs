//! Settings the server is started with.

use std::fmt;

use crate::{
    Error, date_range::UnknownPresetPolicy, transaction::MalformedAmountPolicy,
};

/// The environment variable holding the secret the backend signs tokens with.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET_KEY";

/// Everything needed to build the [AppState](crate::AppState).
#[derive(Clone)]
pub struct AppConfig {
    /// Base URL of the payments backend API, e.g. "https://api.example.com/".
    pub backend_url: String,
    /// The HMAC secret shared with the payments backend.
    pub jwt_secret: String,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Karachi".
    pub local_timezone: String,
    /// How date filter names that are not presets are handled.
    pub unknown_preset_policy: UnknownPresetPolicy,
    /// How transaction amounts that are not numbers are handled.
    pub malformed_amount_policy: MalformedAmountPolicy,
}

impl AppConfig {
    /// A config with the default policies.
    pub fn new(backend_url: &str, jwt_secret: &str, local_timezone: &str) -> Self {
        Self {
            backend_url: backend_url.to_owned(),
            jwt_secret: jwt_secret.to_owned(),
            local_timezone: local_timezone.to_owned(),
            unknown_preset_policy: UnknownPresetPolicy::default(),
            malformed_amount_policy: MalformedAmountPolicy::default(),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("backend_url", &self.backend_url)
            .field("jwt_secret", &"********")
            .field("local_timezone", &self.local_timezone)
            .field("unknown_preset_policy", &self.unknown_preset_policy)
            .field("malformed_amount_policy", &self.malformed_amount_policy)
            .finish()
    }
}

/// Read the JWT secret from [JWT_SECRET_ENV].
///
/// # Errors
///
/// Returns [Error::MissingJwtSecret] if the variable is unset or empty.
pub fn jwt_secret_from_env() -> Result<String, Error> {
    match std::env::var(JWT_SECRET_ENV) {
        Ok(secret) if !secret.is_empty() => Ok(secret),
        _ => Err(Error::MissingJwtSecret(JWT_SECRET_ENV.to_owned())),
    }
}
