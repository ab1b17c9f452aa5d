use axum::http::{HeaderMap, header};

/// SessionCredential
///
/// The caller's proof of identity, passed explicitly into every identity and session call
/// instead of being read from ambient state. The value is forwarded untouched; it is never
/// decoded, validated or persisted here.
#[derive(Clone, PartialEq, Eq)]
pub enum SessionCredential {
    /// No credential was presented. Probes still run and resolve to anonymous.
    None,
    /// Value of the session cookie, forwarded as `Cookie: <name>=<value>`.
    Cookie { name: String, value: String },
    /// Bearer token, forwarded as `Authorization: Bearer <token>`.
    Bearer(String),
}

impl SessionCredential {
    pub fn cookie(name: impl Into<String>, value: impl Into<String>) -> Self {
        SessionCredential::Cookie {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        SessionCredential::Bearer(token.into())
    }

    /// Pulls the credential out of incoming request headers. The named session cookie wins
    /// over an Authorization header when both are present.
    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Self {
        let cookie = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|raw| cookie_value(raw, cookie_name));
        if let Some(value) = cookie {
            return SessionCredential::cookie(cookie_name, value);
        }

        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .map(SessionCredential::bearer)
            .unwrap_or(SessionCredential::None)
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, SessionCredential::None)
    }

    /// Attaches the credential to an outgoing identity-service request.
    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            SessionCredential::None => request,
            SessionCredential::Cookie { name, value } => {
                request.header(reqwest::header::COOKIE, format!("{name}={value}"))
            }
            SessionCredential::Bearer(token) => request.bearer_auth(token),
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionCredential::None => f.write_str("SessionCredential::None"),
            SessionCredential::Cookie { name, .. } => {
                write!(f, "SessionCredential::Cookie({name}=<redacted>)")
            }
            SessionCredential::Bearer(_) => f.write_str("SessionCredential::Bearer(<redacted>)"),
        }
    }
}

fn cookie_value(cookie_header: &str, cookie_name: &str) -> Option<String> {
    cookie_header.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        let value = value.trim();
        (name.trim() == cookie_name && !value.is_empty()).then(|| value.to_string())
    })
}

fn bearer_token(header_value: &str) -> Option<String> {
    let mut parts = header_value.split_whitespace();
    let scheme = parts.next()?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_is_picked_from_multi_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=abc123; lang=en"),
        );

        let credential = SessionCredential::from_headers(&headers, "session");
        assert_eq!(credential, SessionCredential::cookie("session", "abc123"));
    }

    #[test]
    fn test_bearer_fallback_and_malformed_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
        assert_eq!(
            SessionCredential::from_headers(&headers, "session"),
            SessionCredential::bearer("tok")
        );

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(
            SessionCredential::from_headers(&headers, "session"),
            SessionCredential::None
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", SessionCredential::cookie("session", "top-secret"));
        assert!(!rendered.contains("top-secret"));
        assert!(rendered.contains("session"));
    }
}
