//! Session cookie construction.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::auth::token::REMEMBERED_SESSION_DAYS;

pub const SESSION_COOKIE: &str = "ei_session";

/// http-only session cookie. Remembered logins persist across browser
/// restarts; others end with the browser session.
pub fn session_cookie(token: String, remember: bool) -> Cookie<'static> {
    let mut builder = Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/");
    if remember {
        builder = builder.max_age(Duration::days(REMEMBERED_SESSION_DAYS));
    }
    builder.build()
}

/// Expired cookie that clears the session.
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}
