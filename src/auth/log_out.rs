//! Log-out route handler that deletes the auth cookie and redirects users.

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;

use crate::{auth::clear_token_cookie, endpoints};

/// Delete the auth cookie and redirect the client to the log-in page.
pub async fn get_log_out(jar: CookieJar) -> Response {
    let jar = clear_token_cookie(jar);

    (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}
