//! A client for the payments backend's REST API.

use std::future::Future;

use reqwest::{Client, Response, StatusCode, Url, header::COOKIE};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::TOKEN_COOKIE,
    dashboard::{DashboardData, DashboardEnvelope, DashboardSource},
    date_range::DateInterval,
    endpoints,
};

/// Talks to the payments backend on behalf of logged-in admins.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

#[derive(Serialize)]
struct LogInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LogInReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<LogInReplyData>,
}

#[derive(Debug, Deserialize)]
struct LogInReplyData {
    #[serde(default)]
    token: Option<String>,
}

impl BackendClient {
    /// Create a client for the API at `base_url`, e.g. "https://api.example.com/".
    ///
    /// A missing trailing slash is added.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidBackendUrl] if `base_url` is not an absolute
    /// HTTP(S) URL.
    pub fn new(base_url: &str) -> Result<Self, Error> {
        let base_url = if base_url.ends_with('/') {
            base_url.to_owned()
        } else {
            format!("{base_url}/")
        };

        match Url::parse(&base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(Error::InvalidBackendUrl(base_url)),
        }

        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    /// The base URL, always ending in a slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the admin dashboard for `interval`, authenticating with `token`.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [Error::BackendStatus] if the backend replies with a non-success status,
    /// - [Error::BackendRequest] if the request could not be sent,
    /// - [Error::BackendResponse] if the reply is not a dashboard envelope.
    pub async fn fetch_dashboard(
        &self,
        token: &str,
        interval: &DateInterval,
    ) -> Result<DashboardData, Error> {
        let url = format!("{}{}", self.base_url, endpoints::BACKEND_ADMIN_DASHBOARD);
        tracing::debug!("Fetching dashboard from {url} for {interval:?}");

        let response = self
            .http
            .get(&url)
            .query(&interval.query_params()?)
            .header(COOKIE, format!("{TOKEN_COOKIE}={token}"))
            .send()
            .await
            .map_err(|error| Error::BackendRequest(error.to_string()))?;

        let response = ensure_success(response)?;

        let envelope: DashboardEnvelope = response
            .json()
            .await
            .map_err(|error| Error::BackendResponse(error.to_string()))?;

        Ok(envelope.data.unwrap_or_default())
    }

    /// Log in to the backend and return the token it issues.
    ///
    /// # Errors
    ///
    /// Returns [Error::LogInRejected] with a message for the user if the
    /// backend refuses the credentials, otherwise [Error::BackendRequest] or
    /// [Error::BackendResponse] if the backend could not be reached or
    /// understood.
    pub async fn log_in(&self, email: &str, password: &str) -> Result<String, Error> {
        let url = format!("{}{}", self.base_url, endpoints::BACKEND_LOG_IN);

        let response = self
            .http
            .post(&url)
            .json(&LogInRequest { email, password })
            .send()
            .await
            .map_err(|error| Error::BackendRequest(error.to_string()))?;

        let status = response.status();
        let reply = response.json::<LogInReply>().await;

        if !status.is_success() {
            let message = reply
                .ok()
                .and_then(|reply| reply.message)
                .unwrap_or_else(|| {
                    format!("Login api call failed with status {}", status.as_u16())
                });

            return Err(Error::LogInRejected(message));
        }

        let reply = reply.map_err(|error| Error::BackendResponse(error.to_string()))?;

        if !reply.success {
            return Err(Error::LogInRejected("Invalid email or password.".to_owned()));
        }

        reply
            .data
            .and_then(|data| data.token)
            .ok_or_else(|| Error::BackendResponse("the log-in reply has no token".to_owned()))
    }
}

fn ensure_success(response: Response) -> Result<Response, Error> {
    let status: StatusCode = response.status();

    if status.is_success() {
        return Ok(response);
    }

    tracing::warn!("The payments backend replied with {status}");

    Err(Error::BackendStatus {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_owned(),
    })
}

impl DashboardSource for BackendClient {
    fn fetch(
        &self,
        token: &str,
        interval: &DateInterval,
    ) -> impl Future<Output = Result<DashboardData, Error>> + Send {
        self.fetch_dashboard(token, interval)
    }
}

#[cfg(test)]
mod backend_client_tests {
    use std::collections::HashMap;

    use axum::{
        Json, Router,
        extract::Query,
        http::{HeaderMap, StatusCode, header::COOKIE},
        response::IntoResponse,
        routing::{get, post},
    };
    use serde_json::{Value, json};
    use time::macros::datetime;

    use crate::{
        Error,
        backend::BackendClient,
        dashboard::AggregateValue,
        date_range::DateInterval,
    };

    async fn admin_dashboard(
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        let cookie = headers.get(COOKIE).and_then(|value| value.to_str().ok());
        if cookie != Some("token=abc") {
            return (StatusCode::UNAUTHORIZED, Json(json!({}))).into_response();
        }

        Json(json!({
            "data": {
                "latestTransactions": [],
                "todayIncome": query.get("start"),
                "totalIncome": query.get("end"),
                "totalMerchants": query.len()
            }
        }))
        .into_response()
    }

    async fn log_in(Json(body): Json<Value>) -> impl IntoResponse {
        match (body["email"].as_str(), body["password"].as_str()) {
            (Some("admin@example.com"), Some("hunter22")) => (
                StatusCode::OK,
                Json(json!({ "success": true, "data": { "token": "jwt" } })),
            ),
            (Some("nobody@example.com"), _) => (
                StatusCode::OK,
                Json(json!({ "success": false, "data": null })),
            ),
            (Some("locked@example.com"), _) => {
                (StatusCode::FORBIDDEN, Json(json!({ "success": false })))
            }
            _ => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "success": false, "message": "Invalid credentials" })),
            ),
        }
    }

    /// Start a stand-in payments backend and return its base URL.
    async fn spawn_backend() -> String {
        let router = Router::new()
            .route("/api/dashboard/admin", get(admin_dashboard))
            .route("/api/auth/login", post(log_in))
            .route(
                "/down/dashboard/admin",
                get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
            )
            .route("/garbled/dashboard/admin", get(|| async { "not json" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        format!("http://{address}")
    }

    #[test]
    fn new_adds_trailing_slash() {
        let client = BackendClient::new("https://api.example.com/api").unwrap();

        assert_eq!(client.base_url(), "https://api.example.com/api/");
    }

    #[test]
    fn new_rejects_invalid_url() {
        assert_eq!(
            BackendClient::new("not a url").unwrap_err(),
            Error::InvalidBackendUrl("not a url/".to_owned())
        );
        assert!(BackendClient::new("ftp://example.com").is_err());
    }

    #[tokio::test]
    async fn fetch_dashboard_sends_interval_and_token() {
        let client = BackendClient::new(&format!("{}/api", spawn_backend().await)).unwrap();
        let interval = DateInterval::Bounded {
            start: datetime!(2025-06-01 00:00 +5),
            end: datetime!(2025-06-30 23:59:59.999 +5),
        };

        let data = client.fetch_dashboard("abc", &interval).await.unwrap();

        assert_eq!(
            data.aggregates.today_income,
            Some(AggregateValue::Text("2025-06-01T00:00:00+05:00".to_owned()))
        );
        assert_eq!(
            data.aggregates.total_income,
            Some(AggregateValue::Text("2025-06-30T23:59:59+05:00".to_owned()))
        );
    }

    #[tokio::test]
    async fn fetch_dashboard_omits_unbounded_interval() {
        let client = BackendClient::new(&format!("{}/api", spawn_backend().await)).unwrap();

        let data = client
            .fetch_dashboard("abc", &DateInterval::Unbounded)
            .await
            .unwrap();

        assert_eq!(
            data.aggregates.total_merchants,
            Some(AggregateValue::Number(0.0))
        );
        assert_eq!(data.aggregates.today_income, None);
    }

    #[tokio::test]
    async fn fetch_dashboard_reports_http_status() {
        let client = BackendClient::new(&format!("{}/down", spawn_backend().await)).unwrap();

        let error = client
            .fetch_dashboard("abc", &DateInterval::Unbounded)
            .await
            .unwrap_err();

        assert_eq!(
            error,
            Error::BackendStatus {
                status: 503,
                reason: "Service Unavailable".to_owned()
            }
        );
        assert_eq!(error.to_string(), "HTTP Error: 503 - Service Unavailable");
    }

    #[tokio::test]
    async fn fetch_dashboard_rejects_unauthenticated_token() {
        let client = BackendClient::new(&format!("{}/api", spawn_backend().await)).unwrap();

        let error = client
            .fetch_dashboard("wrong", &DateInterval::Unbounded)
            .await
            .unwrap_err();

        assert!(matches!(error, Error::BackendStatus { status: 401, .. }));
    }

    #[tokio::test]
    async fn fetch_dashboard_reports_undecodable_reply() {
        let client = BackendClient::new(&format!("{}/garbled", spawn_backend().await)).unwrap();

        let error = client
            .fetch_dashboard("abc", &DateInterval::Unbounded)
            .await
            .unwrap_err();

        assert!(matches!(error, Error::BackendResponse(_)));
    }

    #[tokio::test]
    async fn fetch_dashboard_reports_unreachable_backend() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);
        let client = BackendClient::new(&format!("http://{address}/")).unwrap();

        let error = client
            .fetch_dashboard("abc", &DateInterval::Unbounded)
            .await
            .unwrap_err();

        assert!(matches!(error, Error::BackendRequest(_)));
    }

    #[tokio::test]
    async fn log_in_returns_token() {
        let client = BackendClient::new(&format!("{}/api", spawn_backend().await)).unwrap();

        let token = client.log_in("admin@example.com", "hunter22").await;

        assert_eq!(token, Ok("jwt".to_owned()));
    }

    #[tokio::test]
    async fn log_in_uses_backend_message_on_error_status() {
        let client = BackendClient::new(&format!("{}/api", spawn_backend().await)).unwrap();

        let got = client.log_in("admin@example.com", "wrong-password").await;

        assert_eq!(got, Err(Error::LogInRejected("Invalid credentials".to_owned())));
    }

    #[tokio::test]
    async fn log_in_falls_back_to_status_message() {
        let client = BackendClient::new(&format!("{}/api", spawn_backend().await)).unwrap();

        let got = client.log_in("locked@example.com", "hunter22").await;

        assert_eq!(
            got,
            Err(Error::LogInRejected(
                "Login api call failed with status 403".to_owned()
            ))
        );
    }

    #[tokio::test]
    async fn log_in_rejects_unsuccessful_reply() {
        let client = BackendClient::new(&format!("{}/api", spawn_backend().await)).unwrap();

        let got = client.log_in("nobody@example.com", "hunter22").await;

        assert_eq!(
            got,
            Err(Error::LogInRejected("Invalid email or password.".to_owned()))
        );
    }
}
