//! The endpoint URIs served by the dashboard, and the paths it calls on the
//! payments backend.

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The dashboard data for a date filter.
pub const DASHBOARD: &str = "/dashboard";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/login";
/// The route for logging in a user.
pub const LOG_IN_API: &str = "/auth/login";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/auth/logout";
/// The route for static files.
pub const PUBLIC: &str = "/public";

/// The admin dashboard, relative to the backend's base URL.
pub const BACKEND_ADMIN_DASHBOARD: &str = "dashboard/admin";
/// Log-in, relative to the backend's base URL.
pub const BACKEND_LOG_IN: &str = "auth/login";
