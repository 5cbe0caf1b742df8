//! The `token` session cookie.

use cookie::{Cookie, SameSite, time::Duration};

/// Name of the cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "token";

/// Lifetime the browser is told to keep the cookie.
///
/// Longer than the token inside it: once the token expires the cookie is
/// still sent and the session resolver rejects it.
pub const COOKIE_MAX_AGE_DAYS: i64 = 30;

/// Cookie set at login.
#[must_use]
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::days(COOKIE_MAX_AGE_DAYS))
        .secure(secure)
        .build()
}

/// Immediately-expired empty cookie that makes the browser drop the session.
#[must_use]
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .build();
    cookie.make_removal();
    cookie
}

/// Find the session token among the request's `Cookie` header values.
pub fn find_session_token<'a>(headers: impl IntoIterator<Item = &'a str>) -> Option<String> {
    headers
        .into_iter()
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_COOKIE && !c.value().is_empty())
        .map(|c| c.value().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let rendered = session_cookie("abc".to_owned(), false).to_string();
        assert!(rendered.starts_with("token=abc"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=2592000"));
        assert!(!rendered.contains("Secure"));

        assert!(session_cookie("abc".to_owned(), true).to_string().contains("Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie(false);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }

    #[test]
    fn test_find_session_token() {
        assert_eq!(
            find_session_token(["theme=dark; token=abc.def.ghi"]),
            Some("abc.def.ghi".to_owned())
        );
        assert_eq!(
            find_session_token(["theme=dark", "token=xyz"]),
            Some("xyz".to_owned())
        );
        assert_eq!(find_session_token(["theme=dark"]), None);
        assert_eq!(find_session_token(["token="]), None);
        assert_eq!(find_session_token([]), None);
    }
}
