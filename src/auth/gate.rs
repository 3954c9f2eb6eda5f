//! Decides whether a request may reach a protected page based on the token
//! in its auth cookie.

use std::{fmt, sync::Arc};

use crate::{
    auth::{CookieStore, TOKEN_COOKIE, TokenVerifier},
    clock::Clock,
};

/// What the gate found out about a request's token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// The request has no token cookie.
    NoToken,
    /// The token is malformed, has a bad signature, uses an unsupported
    /// algorithm or has claims of the wrong type.
    TokenInvalid,
    /// The token has expired or never expires.
    TokenExpired,
    /// The token does not belong to an admin.
    TokenWrongRole,
    /// The token is an unexpired admin token.
    TokenValid,
}

impl GateState {
    /// Only a valid token is let through.
    pub fn decision(self) -> GateDecision {
        match self {
            GateState::TokenValid => GateDecision::Allow,
            _ => GateDecision::RedirectToLogIn,
        }
    }

    /// Whether the token cookie should be deleted.
    ///
    /// A request without a token has nothing to delete.
    pub fn clears_cookie(self) -> bool {
        !matches!(self, GateState::NoToken | GateState::TokenValid)
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            GateState::NoToken => "no token",
            GateState::TokenInvalid => "invalid token",
            GateState::TokenExpired => "expired token",
            GateState::TokenWrongRole => "token without the admin role",
            GateState::TokenValid => "valid token",
        };

        f.write_str(description)
    }
}

/// What happens to a request for a protected page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Let the request through unchanged.
    Allow,
    /// Send the user to the log-in page.
    RedirectToLogIn,
}

/// Checks auth tokens against the shared secret and the current time.
#[derive(Clone)]
pub struct AccessGate {
    verifier: TokenVerifier,
    clock: Arc<dyn Clock>,
}

impl AccessGate {
    /// Create a gate that accepts admin tokens signed with `secret`.
    pub fn new(secret: &[u8], clock: Arc<dyn Clock>) -> Self {
        Self {
            verifier: TokenVerifier::new(secret),
            clock,
        }
    }

    /// Classify `token`. The first failing check wins.
    pub fn evaluate(&self, token: Option<&str>) -> GateState {
        let token = match token {
            Some(token) if !token.is_empty() => token,
            _ => return GateState::NoToken,
        };

        let claims = match self.verifier.verify(token) {
            Ok(claims) => claims,
            Err(error) => {
                tracing::debug!("Rejected token: {error}");
                return GateState::TokenInvalid;
            }
        };

        if claims.is_expired_at(self.clock.now_utc()) {
            GateState::TokenExpired
        } else if !claims.is_admin() {
            GateState::TokenWrongRole
        } else {
            GateState::TokenValid
        }
    }

    /// Check the token in `cookies`, deleting it if it is unusable.
    pub fn check(&self, cookies: &mut impl CookieStore) -> GateDecision {
        let token = cookies.get(TOKEN_COOKIE);
        let state = self.evaluate(token.as_deref());

        if state != GateState::TokenValid {
            tracing::info!("Redirecting to log-in page: {state}");
        }

        if state.clears_cookie() {
            cookies.clear(TOKEN_COOKIE);
        }

        state.decision()
    }
}
