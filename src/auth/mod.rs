mod cookie;
mod gate;
mod log_in;
mod log_out;
mod middleware;
mod token;

pub use cookie::{
    CookieStore, JarCookieStore, TOKEN_COOKIE, clear_token_cookie, set_token_cookie,
};
pub use gate::{AccessGate, GateDecision, GateState};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{EXEMPT_PREFIXES, access_gate, is_exempt_path};
pub use token::{ADMIN_ROLE, TokenClaims, TokenVerifier};
