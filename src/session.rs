//! Session cookie carrying the signed token.
//!
//! The cookie value is URL-safe base64 of `{"jwt": "<token>"}`.

use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE: &str = "session";

/// Server-side session contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub jwt: String,
}

impl Session {
    pub fn encode(&self) -> String {
        // Serializing a single string field cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// `None` for anything that is not a valid encoded session.
    pub fn decode(value: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(value.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

/// Build the session cookie for `jwt`.
pub fn session_cookie(jwt: &str, secure: bool) -> Cookie<'static> {
    let session = Session {
        jwt: jwt.to_string(),
    };
    Cookie::build((SESSION_COOKIE, session.encode()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Expired session cookie that clears the browser's copy.
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = session_cookie("", secure);
    cookie.set_value("");
    cookie.make_removal();
    cookie
}

/// Token from the session cookie, falling back to an `Authorization: Bearer` header.
pub fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(session) = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Session::decode(cookie.value()))
    {
        if !session.jwt.is_empty() {
            return Some(session.jwt);
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_encoding_round_trips() {
        let session = Session {
            jwt: "a.b.c".to_string(),
        };
        let encoded = session.encode();
        assert!(!encoded.contains('+') && !encoded.contains('/'));
        assert_eq!(Session::decode(&encoded), Some(session));
        assert_eq!(Session::decode("!!!"), None);
    }

    #[test]
    fn cookie_attributes() {
        let cookie = session_cookie("a.b.c", true);
        assert_eq!(cookie.name(), "session");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn removal_cookie_is_expired() {
        let cookie = removal_cookie(false);
        assert_eq!(cookie.value(), "");
        assert!(cookie.max_age().is_some_and(|age| age.is_zero()));
    }

    #[test]
    fn token_prefers_cookie_over_header() {
        let jar = CookieJar::new().add(session_cookie("from-cookie", false));
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer from-header".parse().unwrap());

        assert_eq!(extract_token(&jar, &headers).as_deref(), Some("from-cookie"));
        assert_eq!(
            extract_token(&CookieJar::new(), &headers).as_deref(),
            Some("from-header")
        );
        assert_eq!(extract_token(&CookieJar::new(), &HeaderMap::new()), None);
    }
}
