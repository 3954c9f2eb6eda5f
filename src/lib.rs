//! Sahulat Admin is the back office for the Sahulat payments gateway.
//!
//! This library provides a web server that sits in front of the payments
//! backend. It gates every page behind the admin role in the backend's JWT,
//! serves the log-in page, and shapes the backend's dashboard summary into
//! display-ready cards and transaction rows for a chosen date range.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use time::Date;
use tokio::signal;

mod amount;
mod app_state;
mod auth;
mod backend;
mod clock;
mod config;
mod dashboard;
mod date_range;
mod endpoints;
mod html;
mod logging;
mod not_found;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    ADMIN_ROLE, AccessGate, CookieStore, EXEMPT_PREFIXES, GateDecision, GateState,
    JarCookieStore, TOKEN_COOKIE, TokenClaims, TokenVerifier, is_exempt_path,
};
pub use backend::BackendClient;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, JWT_SECRET_ENV, jwt_secret_from_env};
pub use dashboard::{
    AggregateValue, DashboardAggregates, DashboardData, DashboardEnvelope, DashboardLoader,
    DashboardSource, SummaryCard, transform_envelope,
};
pub use date_range::{DateInterval, DatePreset, DateRangeResolver, UnknownPresetPolicy, WireInterval};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::{
    DisplayTransaction, MalformedAmountPolicy, ProviderDetails, RawTransaction, TransactionStatus,
    TransactionType, transform, transform_with_policy,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("Failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A date filter name that is not one of the known presets.
    #[error("unknown date range \"{0}\"")]
    UnknownDatePreset(String),

    /// A custom range date that is not a valid "YYYY-MM-DD" date.
    #[error("\"{0}\" is not a valid date, expected YYYY-MM-DD")]
    InvalidDate(String),

    /// A custom range whose start date is after its end date.
    #[error("the start date {start} is after the end date {end}")]
    InvertedDateRange {
        /// The requested first day.
        start: Date,
        /// The requested last day.
        end: Date,
    },

    /// Only one of the start and end dates of a custom range was given.
    #[error("a custom date range needs both a start and an end date")]
    IncompleteCustomRange,

    /// A transaction amount that is not a finite decimal number.
    #[error("transaction {transaction_id} has an invalid amount \"{amount}\"")]
    MalformedAmount {
        /// The backend's ID for the transaction.
        transaction_id: String,
        /// The amount as the backend sent it.
        amount: String,
    },

    /// The payments backend replied with a non-success status.
    #[error("HTTP Error: {status} - {reason}")]
    BackendStatus {
        /// The HTTP status code.
        status: u16,
        /// The canonical reason phrase for `status`.
        reason: String,
    },

    /// The request to the payments backend could not be sent or completed.
    #[error("could not reach the payments backend: {0}")]
    BackendRequest(String),

    /// The payments backend replied with a body that could not be decoded.
    #[error("unexpected response from the payments backend: {0}")]
    BackendResponse(String),

    /// The payments backend refused the log-in.
    ///
    /// The message is meant for the user.
    #[error("{0}")]
    LogInRejected(String),

    /// A token that is not a well-formed JWT signed with the shared secret.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// A timestamp could not be formatted as ISO-8601.
    #[error("could not format timestamp: {0}")]
    TimestampFormat(String),

    /// The payments backend URL is not an absolute http(s) URL.
    #[error("invalid backend URL \"{0}\"")]
    InvalidBackendUrl(String),

    /// Could not acquire the lock on the dashboard load tracker.
    #[error("could not acquire the session lock")]
    SessionLockError,

    /// The request has no auth token.
    #[error("not logged in")]
    NotAuthenticated,

    /// The JWT secret environment variable is unset or empty.
    #[error("the environment variable {0} must be set to the JWT secret")]
    MissingJwtSecret(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Error::UnknownDatePreset(_)
            | Error::InvalidDate(_)
            | Error::InvertedDateRange { .. }
            | Error::IncompleteCustomRange => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::NotAuthenticated | Error::InvalidToken(_) | Error::LogInRejected(_) => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            Error::BackendStatus { .. } | Error::MalformedAmount { .. } => {
                tracing::warn!("{self}");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            Error::BackendRequest(_) | Error::BackendResponse(_) => {
                tracing::error!("{self}");
                (
                    StatusCode::BAD_GATEWAY,
                    "the payments backend is unavailable, please try again later".to_owned(),
                )
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an internal error occurred, check the server logs for more details".to_owned(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
