//! Cookie-based sessions with rotating refresh tokens.
//!
//! Dual-token system: short-lived access tokens (1 hour, stateless) and
//! long-lived single-use refresh tokens (30 days, tracked by hash in the
//! database). Protected routes run behind [`require_session`], which renews
//! an expired access token transparently.

mod cookie;
mod errors;
mod extractors;
mod ip;
mod middleware;
mod session;

pub use cookie::{
    ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, append_set_cookies, cleared_session_cookies,
    get_cookie, session_cookies,
};
pub use errors::{AuthError, LOGIN_PATH, SessionRejection};
pub use extractors::CurrentUser;
pub use ip::extract_client_ip;
pub use middleware::require_session;
pub use session::{Authenticated, AuthenticatedUser, SessionAuthority, SessionState};
