//! Session credentials.
//!
//! The catalog reads the cookie header and the anti-forgery token from a
//! [`SessionStore`]; it never logs in, refreshes or persists credentials itself.

use parking_lot::RwLock;

/// Cookie carrying the anti-forgery token.
pub const CSRF_COOKIE: &str = "bili_jct";
/// Cookie carrying the login session.
pub const SESSION_COOKIE: &str = "SESSDATA";

/// Extract a specific cookie value from a cookie string.
///
/// ```
/// use bili_catalog::session::extract_cookie_value;
///
/// let cookies = "SESSDATA=abc123; bili_jct=xyz789";
/// assert_eq!(extract_cookie_value(cookies, "bili_jct"), Some("xyz789".to_string()));
/// ```
pub fn extract_cookie_value(cookies: &str, name: &str) -> Option<String> {
    parse_cookie_string(cookies)
        .into_iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v)
}

/// Split `name1=value1; name2=value2` into pairs, keeping order.
///
/// Newlines are accepted as separators too, for pasted cookie files. Pairs with
/// an empty name or value are dropped.
pub fn parse_cookie_string(cookies: &str) -> Vec<(String, String)> {
    cookies
        .split(&[';', '\n'][..])
        .map(str::trim)
        .filter_map(|part| part.split_once('='))
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, value)| !name.is_empty() && !value.is_empty())
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .collect()
}

/// Source of the active session's credentials.
pub trait SessionStore: Send + Sync {
    /// Value for the `Cookie` header, if any.
    fn cookie_header(&self) -> Option<String>;

    /// Anti-forgery token of the session, read from the `bili_jct` cookie.
    fn csrf_token(&self) -> Option<String> {
        self.cookie_header()
            .and_then(|cookies| extract_cookie_value(&cookies, CSRF_COOKIE))
    }

    fn is_logged_in(&self) -> bool {
        self.cookie_header()
            .and_then(|cookies| extract_cookie_value(&cookies, SESSION_COOKIE))
            .is_some()
    }
}

/// Anonymous access.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSession;

impl SessionStore for NoSession {
    fn cookie_header(&self) -> Option<String> {
        None
    }
}

/// Cookies held in memory, replaceable at runtime.
#[derive(Debug, Default)]
pub struct StaticSession {
    cookies: RwLock<Vec<(String, String)>>,
}

impl StaticSession {
    pub fn from_cookie_string(cookies: &str) -> Self {
        Self {
            cookies: RwLock::new(parse_cookie_string(cookies)),
        }
    }

    /// Replace all cookies.
    pub fn set_cookies_from_string(&self, cookies: &str) {
        *self.cookies.write() = parse_cookie_string(cookies);
    }

    /// Insert or update one cookie.
    pub fn set_cookie(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let mut cookies = self.cookies.write();
        match cookies.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => cookies.push((name, value)),
        }
    }

    pub fn clear(&self) {
        self.cookies.write().clear();
    }
}

impl SessionStore for StaticSession {
    fn cookie_header(&self) -> Option<String> {
        let cookies = self.cookies.read();
        if cookies.is_empty() {
            return None;
        }
        let header = cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ");
        Some(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_string() {
        let pairs = parse_cookie_string("SESSDATA=abc; bili_jct=xyz\nbuvid3=1=2; =x; empty=");
        assert_eq!(
            pairs,
            vec![
                ("SESSDATA".to_string(), "abc".to_string()),
                ("bili_jct".to_string(), "xyz".to_string()),
                ("buvid3".to_string(), "1=2".to_string()),
            ]
        );
    }

    #[test]
    fn test_static_session() {
        let session = StaticSession::from_cookie_string("SESSDATA=abc; bili_jct=token");
        assert!(session.is_logged_in());
        assert_eq!(session.csrf_token().as_deref(), Some("token"));
        assert_eq!(
            session.cookie_header().as_deref(),
            Some("SESSDATA=abc; bili_jct=token")
        );

        session.set_cookie("bili_jct", "rotated");
        assert_eq!(session.csrf_token().as_deref(), Some("rotated"));

        session.clear();
        assert!(session.cookie_header().is_none());
        assert!(!session.is_logged_in());
    }

    #[test]
    fn test_no_session() {
        assert!(NoSession.csrf_token().is_none());
        assert!(!NoSession.is_logged_in());
    }

    #[test]
    fn test_session_without_csrf() {
        let session = StaticSession::from_cookie_string("SESSDATA=abc");
        assert!(session.csrf_token().is_none());
    }
}
