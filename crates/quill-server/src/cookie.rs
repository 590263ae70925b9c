//! Minimal `Cookie` / `Set-Cookie` handling for the session cookie.

use axum::http::{HeaderMap, HeaderValue, header};

pub const SESSION_COOKIE: &str = "quill-session";

/// Value of cookie `name` from the request's `Cookie` headers, if any.
pub fn read<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(k, _)| *k == name)
    .map(|(_, v)| v)
    .filter(|v| !v.is_empty())
}

/// `Set-Cookie` value that stores `token` for `max_age_secs`.
pub fn set_session(token: &str, max_age_secs: i64, secure: bool) -> Option<HeaderValue> {
  let mut value = format!(
    "{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
    max_age_secs.max(0)
  );
  if secure {
    value.push_str("; Secure");
  }
  HeaderValue::from_str(&value).ok()
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session(secure: bool) -> HeaderValue {
  if secure {
    HeaderValue::from_static(
      "quill-session=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0; Secure",
    )
  } else {
    HeaderValue::from_static("quill-session=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
  }
}
