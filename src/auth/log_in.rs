//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! Credentials are checked by the payments backend, which issues the auth token.

use std::sync::{Arc, LazyLock};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use maud::{Markup, html};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{AccessGate, GateState, set_token_cookie},
    backend::BackendClient,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, base, email_input, log_in_card, password_input},
};

/// The shortest password the log-in form accepts.
pub const MIN_PASSWORD_LENGTH: u8 = 6;

pub const NOT_AUTHORISED_ERROR_MSG: &str = "You are not authorised to use the admin dashboard.";
pub const INTERNAL_ERROR_MSG: &str = "An internal error occurred. Please try again later.";

fn log_in_form(email: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            method="post"
            action=(endpoints::LOG_IN_API)
            class="space-y-4 md:space-y-6"
        {
            @if let Some(error_message) = error_message
            {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            (email_input(email))
            (password_input(MIN_PASSWORD_LENGTH))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                "Sign in"
            }
        }
    }
}

fn log_in_page(email: &str, error_message: Option<&str>) -> Markup {
    let form = log_in_form(email, error_message);
    let content = log_in_card("Sign in to your account", &form);
    base("Log In", &content)
}

/// Display the log-in page.
pub async fn get_log_in_page() -> Response {
    log_in_page("", None).into_response()
}

/// The state needed to perform a login.
#[derive(Clone)]
pub struct LogInState {
    pub backend: BackendClient,
    pub gate: Arc<AccessGate>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            backend: state.backend.clone(),
            gate: state.gate.clone(),
        }
    }
}

/// The raw data entered by the user in the log-in form.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LogInData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogInData")
            .field("email", &self.email)
            .field("password", &"********")
            .finish()
    }
}

/// Check the log-in form before bothering the backend with it.
///
/// Returns the message to show the user for the first problem found.
pub fn validate_log_in(data: &LogInData) -> Result<(), &'static str> {
    if data.email.is_empty() {
        return Err("Email is required");
    }

    if !looks_like_email(&data.email) {
        return Err("Please enter a valid email address");
    }

    if data.password.is_empty() {
        return Err("Password is required");
    }

    if data.password.chars().count() < usize::from(MIN_PASSWORD_LENGTH) {
        return Err("Password must be at least 6 characters long");
    }

    Ok(())
}

/// Whether `email` contains something of the form "x@y.z", where x, y and z
/// are runs of non-whitespace characters.
fn looks_like_email(email: &str) -> bool {
    static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\S+@\S+\.\S+").expect("the email pattern is a valid regex")
    });

    EMAIL_PATTERN.is_match(email)
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in the backend's token is stored in the auth cookie
/// and the client is redirected to the dashboard. Otherwise, the log-in page
/// is returned with an error message explaining the problem.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: CookieJar,
    Form(data): Form<LogInData>,
) -> Response {
    if let Err(message) = validate_log_in(&data) {
        return log_in_page(&data.email, Some(message)).into_response();
    }

    let token = match state.backend.log_in(&data.email, &data.password).await {
        Ok(token) => token,
        Err(Error::LogInRejected(message)) => {
            tracing::info!("Log-in for {} rejected: {message}", data.email);
            return log_in_page(&data.email, Some(&message)).into_response();
        }
        Err(error) => {
            tracing::error!("Could not log in via the payments backend: {error}");
            return (
                StatusCode::BAD_GATEWAY,
                log_in_page(&data.email, Some(INTERNAL_ERROR_MSG)),
            )
                .into_response();
        }
    };

    match state.gate.evaluate(Some(&token)) {
        GateState::TokenValid => {
            tracing::info!("Admin {} logged in", data.email);
            (
                set_token_cookie(jar, &token),
                Redirect::to(endpoints::ROOT),
            )
                .into_response()
        }
        rejection => {
            tracing::info!("Log-in for {} refused: {rejection}", data.email);
            log_in_page(&data.email, Some(NOT_AUTHORISED_ERROR_MSG)).into_response()
        }
    }
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::Arc;

    use axum::{
        Form, Json, Router,
        extract::State,
        http::{StatusCode, header::CONTENT_TYPE},
        response::IntoResponse,
        routing::post,
    };
    use axum_extra::extract::CookieJar;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::{Value, json};
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        auth::{AccessGate, TOKEN_COOKIE},
        backend::BackendClient,
        clock::FixedClock,
        endpoints,
        test_utils::{
            assert_form_error_message, assert_form_input, assert_form_submit_button,
            assert_valid_html, get_header, must_get_form, parse_html_document,
        },
    };

    use super::{
        INTERNAL_ERROR_MSG, LogInData, LogInState, NOT_AUTHORISED_ERROR_MSG, get_log_in_page,
        looks_like_email, post_log_in, validate_log_in,
    };

    const SECRET: &[u8] = b"a-very-secret-key";
    const NOW: OffsetDateTime = datetime!(2025-06-15 12:00 UTC);

    fn mint(role: &str) -> String {
        encode(
            &Header::default(),
            &json!({ "exp": NOW.unix_timestamp() + 3600, "role": role }),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap()
    }

    async fn stub_backend_log_in(Json(body): Json<Value>) -> impl IntoResponse {
        match body["email"].as_str() {
            Some("admin@example.com") => (
                StatusCode::OK,
                Json(json!({ "success": true, "data": { "token": mint("Admin") } })),
            ),
            Some("merchant@example.com") => (
                StatusCode::OK,
                Json(json!({ "success": true, "data": { "token": mint("Merchant") } })),
            ),
            _ => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "success": false, "message": "Invalid credentials" })),
            ),
        }
    }

    async fn get_state() -> LogInState {
        let router = Router::new().route("/auth/login", post(stub_backend_log_in));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        LogInState {
            backend: BackendClient::new(&format!("http://{address}/")).unwrap(),
            gate: Arc::new(AccessGate::new(SECRET, Arc::new(FixedClock(NOW)))),
        }
    }

    /// A state whose backend refuses connections.
    async fn get_unreachable_state() -> LogInState {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        LogInState {
            backend: BackendClient::new(&format!("http://{address}/")).unwrap(),
            gate: Arc::new(AccessGate::new(SECRET, Arc::new(FixedClock(NOW)))),
        }
    }

    fn form(email: &str, password: &str) -> Form<LogInData> {
        Form(LogInData {
            email: email.to_owned(),
            password: password.to_owned(),
        })
    }

    #[tokio::test]
    async fn log_in_page_displays_form() {
        let response = get_log_in_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(get_header(&response, CONTENT_TYPE.as_str()).starts_with("text/html"));

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_eq!(form.value().attr("action"), Some(endpoints::LOG_IN_API));
        assert_eq!(form.value().attr("method"), Some("post"));
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "password", "password");
        assert_form_submit_button(&form);
    }

    #[tokio::test]
    async fn admin_log_in_sets_cookie_and_redirects() {
        let state = get_state().await;

        let response = post_log_in(
            State(state),
            CookieJar::new(),
            form("admin@example.com", "hunter22"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(get_header(&response, "location"), endpoints::ROOT);
        let set_cookie = get_header(&response, "set-cookie");
        assert!(set_cookie.starts_with(&format!("{TOKEN_COOKIE}={}", mint("Admin"))));
    }

    #[tokio::test]
    async fn non_admin_log_in_is_refused() {
        let state = get_state().await;

        let response = post_log_in(
            State(state),
            CookieJar::new(),
            form("merchant@example.com", "hunter22"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("set-cookie").is_none());
        let document = parse_html_document(response).await;
        assert_form_error_message(&must_get_form(&document), NOT_AUTHORISED_ERROR_MSG);
    }

    #[tokio::test]
    async fn backend_rejection_message_is_shown() {
        let state = get_state().await;

        let response = post_log_in(
            State(state),
            CookieJar::new(),
            form("someone@example.com", "hunter22"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        let form = must_get_form(&document);
        assert_form_error_message(&form, "Invalid credentials");
    }

    #[tokio::test]
    async fn unreachable_backend_shows_internal_error() {
        let state = get_unreachable_state().await;

        let response = post_log_in(
            State(state),
            CookieJar::new(),
            form("admin@example.com", "hunter22"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let document = parse_html_document(response).await;
        assert_form_error_message(&must_get_form(&document), INTERNAL_ERROR_MSG);
    }

    #[tokio::test]
    async fn invalid_form_is_not_sent_to_backend() {
        // The backend is unreachable, so reaching it would give a 502.
        let state = get_unreachable_state().await;

        let response = post_log_in(State(state), CookieJar::new(), form("admin", "hunter22")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_form_error_message(
            &must_get_form(&document),
            "Please enter a valid email address",
        );
    }

    #[test]
    fn validation_messages_in_order() {
        let cases = [
            ("", "", Err("Email is required")),
            ("admin", "", Err("Please enter a valid email address")),
            ("admin@example.com", "", Err("Password is required")),
            (
                "admin@example.com",
                "12345",
                Err("Password must be at least 6 characters long"),
            ),
            ("admin@example.com", "123456", Ok(())),
        ];

        for (email, password, want) in cases {
            let data = LogInData {
                email: email.to_owned(),
                password: password.to_owned(),
            };

            assert_eq!(validate_log_in(&data), want, "email {email:?}");
        }
    }

    #[test]
    fn email_shape() {
        for email in ["a@b.c", "first.last@mail.example.com", "a@b.c.d"] {
            assert!(looks_like_email(email), "{email} should be accepted");
        }

        for email in ["a@b", "@b.c", "a@.c", "a@b.", "a @b.c", "a@ b.c"] {
            assert!(!looks_like_email(email), "{email} should be rejected");
        }
    }

    #[test]
    fn email_shape_may_appear_anywhere_in_the_input() {
        assert!(looks_like_email("write to a@b.c today"));
        assert!(looks_like_email("ünïcödé@bücher.de"));
        assert!(!looks_like_email("a\t@b.c"));
    }

    #[test]
    fn debug_hides_password() {
        let data = LogInData {
            email: "admin@example.com".to_owned(),
            password: "hunter22".to_owned(),
        };

        assert!(!format!("{data:?}").contains("hunter22"));
    }
}
