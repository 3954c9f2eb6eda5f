//! Middleware that keeps users without a valid admin token out of the
//! dashboard.

use std::sync::Arc;

use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::{
    AppState,
    auth::{AccessGate, GateDecision, JarCookieStore},
    endpoints,
};

/// Paths starting with one of these (after the leading slash) skip the gate.
pub const EXEMPT_PREFIXES: [&str; 5] = ["login", "public", "_next", "favicon.ico", "auth/"];

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    pub gate: Arc<AccessGate>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            gate: state.gate.clone(),
        }
    }
}

/// Whether requests for `path` are let through without a token.
pub fn is_exempt_path(path: &str) -> bool {
    let path = path.strip_prefix('/').unwrap_or(path);

    EXEMPT_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Middleware function that checks the auth token cookie.
///
/// Requests with a valid admin token, and requests for exempt paths, are run
/// normally. Everyone else is redirected to the log-in page, and any unusable
/// token is deleted.
pub async fn access_gate(
    State(state): State<AuthState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    if is_exempt_path(request.uri().path()) {
        return next.run(request).await;
    }

    let mut cookies = JarCookieStore::new(jar);

    match state.gate.check(&mut cookies) {
        GateDecision::Allow => next.run(request).await,
        GateDecision::RedirectToLogIn => {
            (cookies.into_jar(), Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
        }
    }
}

#[cfg(test)]
mod access_gate_tests {
    use std::sync::Arc;

    use axum::{Router, middleware, response::Html, routing::get};
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::{Value, json};
    use time::{Duration, OffsetDateTime, macros::datetime};

    use crate::{
        auth::{AccessGate, TOKEN_COOKIE},
        clock::FixedClock,
        endpoints,
    };

    use super::{AuthState, access_gate, is_exempt_path};

    const SECRET: &[u8] = b"nafstenoas";
    const NOW: OffsetDateTime = datetime!(2025-06-15 12:00 UTC);
    const PROTECTED_ROUTE: &str = "/protected";

    async fn test_handler() -> Html<&'static str> {
        Html("<h1>Hello, World!</h1>")
    }

    fn get_test_server() -> TestServer {
        let state = AuthState {
            gate: Arc::new(AccessGate::new(SECRET, Arc::new(FixedClock(NOW)))),
        };

        let app = Router::new()
            .route(PROTECTED_ROUTE, get(test_handler))
            .route(endpoints::LOG_IN_VIEW, get(test_handler))
            .route("/public/logo.svg", get(test_handler))
            .route("/auth/logout", get(test_handler))
            .route("/favicon.ico", get(test_handler))
            .layer(middleware::from_fn_with_state(state.clone(), access_gate))
            .with_state(state);

        TestServer::new(app)
    }

    fn mint(claims: Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    fn in_an_hour() -> i64 {
        (NOW + Duration::hours(1)).unix_timestamp()
    }

    #[tokio::test]
    async fn admin_token_passes_through() {
        let server = get_test_server();
        let token = mint(json!({ "exp": in_an_hour(), "role": "Admin" }));

        let response = server
            .get(PROTECTED_ROUTE)
            .add_cookie(Cookie::new(TOKEN_COOKIE, token))
            .await;

        response.assert_status_ok();
        response.assert_text("<h1>Hello, World!</h1>");
        assert!(response.cookies().get(TOKEN_COOKIE).is_none());
    }

    #[tokio::test]
    async fn no_token_redirects_without_clearing() {
        let server = get_test_server();

        let response = server.get(PROTECTED_ROUTE).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN_VIEW);
        assert!(response.cookies().get(TOKEN_COOKIE).is_none());
    }

    #[tokio::test]
    async fn rejected_tokens_redirect_and_clear_cookie() {
        let server = get_test_server();
        let tokens = [
            "not-a-jwt".to_owned(),
            mint(json!({ "exp": NOW.unix_timestamp() - 60, "role": "Admin" })),
            mint(json!({ "role": "Admin" })),
            mint(json!({ "exp": in_an_hour(), "role": "Merchant" })),
        ];

        for token in tokens {
            let response = server
                .get(PROTECTED_ROUTE)
                .add_cookie(Cookie::new(TOKEN_COOKIE, token.clone()))
                .await;

            response.assert_status_see_other();
            assert_eq!(response.header("location"), endpoints::LOG_IN_VIEW);
            let cookie = response.cookie(TOKEN_COOKIE);
            assert_eq!(cookie.value(), "", "token {token} was not cleared");
            assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        }
    }

    #[tokio::test]
    async fn unknown_paths_are_gated() {
        let server = get_test_server();

        let response = server.get("/no/such/page").await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN_VIEW);
    }

    #[tokio::test]
    async fn exempt_paths_skip_the_gate() {
        let server = get_test_server();

        for path in [
            endpoints::LOG_IN_VIEW,
            "/public/logo.svg",
            "/auth/logout",
            "/favicon.ico",
        ] {
            server
                .get(path)
                .add_cookie(Cookie::new(TOKEN_COOKIE, "not-a-jwt"))
                .await
                .assert_status_ok();
        }
    }

    #[test]
    fn exempt_prefixes_match_first_segment() {
        assert!(is_exempt_path("/login"));
        assert!(is_exempt_path("/public/css/main.css"));
        assert!(is_exempt_path("/_next/static/chunk.js"));
        assert!(is_exempt_path("/favicon.ico"));
        assert!(is_exempt_path("/auth/login"));

        assert!(!is_exempt_path("/"));
        assert!(!is_exempt_path("/dashboard"));
        assert!(!is_exempt_path("/auth"));
        assert!(!is_exempt_path("/dashboard/login"));
    }
}
