//! Application router configuration.
//!
//! Every route sits behind the access gate, which lets the log-in, log-out
//! and static file routes through without a token.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{access_gate, get_log_in_page, get_log_out, post_log_in},
    dashboard::get_dashboard,
    endpoints,
    not_found::get_404_not_found,
};

/// The directory static files are served from.
pub const PUBLIC_DIR: &str = "public/";

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD, get(get_dashboard))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .nest_service(endpoints::PUBLIC, ServeDir::new(PUBLIC_DIR))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn_with_state(state.clone(), access_gate))
        .with_state(state)
}

/// The root path '/' redirects to the dashboard.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD)
}
