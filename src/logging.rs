//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::TOKEN_COOKIE;

/// Bodies longer than this many bytes are truncated in `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords and auth tokens are never logged.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_text = match body_to_text(body).await {
        Ok(text) => text,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let is_form = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));
    let display_text = if is_form {
        redact_form_field(&body_text, "password")
    } else {
        body_text.clone()
    };

    log_body(
        &format!("Received request: {} {}", parts.method, parts.uri),
        &redact_headers(&parts.headers),
        &display_text,
    );

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_text = match body_to_text(body).await {
        Ok(text) => text,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    log_body(
        &format!("Sending response: {}", parts.status),
        &redact_headers(&parts.headers),
        &body_text,
    );

    Response::from_parts(parts, body_text.into())
}

async fn body_to_text(body: Body) -> Result<String, axum::Error> {
    let bytes = axum::body::to_bytes(body, usize::MAX).await?;

    Ok(String::from_utf8_lossy(&bytes).to_string())
}

/// Replace the value of `field_name` in a URL encoded form.
fn redact_form_field(form_text: &str, field_name: &str) -> String {
    form_text
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) if name == field_name => format!("{name}={REDACTED}"),
            _ => pair.to_owned(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// A copy of `headers` with the auth token hidden.
fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut redacted = headers.clone();
    let token_prefix = format!("{TOKEN_COOKIE}=");

    for name in [COOKIE, SET_COOKIE] {
        let has_token = headers
            .get_all(&name)
            .iter()
            .any(|value| value.to_str().map_or(true, |value| value.contains(&token_prefix)));

        if has_token {
            redacted.insert(name, HeaderValue::from_static(REDACTED));
        }
    }

    redacted
}

fn log_body(summary: &str, headers: &HeaderMap, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        let cut = (0..=LOG_BODY_LENGTH_LIMIT)
            .rev()
            .find(|&index| body.is_char_boundary(index))
            .unwrap_or(0);

        tracing::info!("{summary}\nheaders: {headers:#?}\nbody: {}...", &body[..cut]);
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{summary}\nheaders: {headers:#?}\nbody: {body:?}");
    }
}

#[cfg(test)]
mod logging_tests {
    use axum::http::{HeaderMap, header::COOKIE};

    use super::{redact_form_field, redact_headers};

    #[test]
    fn redacts_password_field() {
        let got = redact_form_field("email=admin%40example.com&password=hunter22", "password");

        assert_eq!(got, "email=admin%40example.com&password=********");
    }

    #[test]
    fn leaves_other_fields_alone() {
        let got = redact_form_field("password_hint=cat&email=a%40b.c", "password");

        assert_eq!(got, "password_hint=cat&email=a%40b.c");
    }

    #[test]
    fn redacts_token_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "theme=dark; token=eyJhbGciOi".parse().unwrap());
        headers.insert("accept", "application/json".parse().unwrap());

        let got = redact_headers(&headers);

        assert_eq!(got.get(COOKIE).unwrap(), "********");
        assert_eq!(got.get("accept").unwrap(), "application/json");
    }
}
