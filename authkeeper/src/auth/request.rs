//! Transport-neutral view of an inbound request.

use axum::http::{HeaderMap, Request, header};

/// What an authenticator may inspect: the path and the headers.
#[derive(Debug, Clone, Default)]
pub struct RequestView {
    pub path: String,
    pub headers: HeaderMap,
}

impl RequestView {
    pub fn new(path: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            path: path.into(),
            headers,
        }
    }

    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self::new(request.uri().path(), request.headers().clone())
    }

    /// The raw `Authorization` header, if present and valid ASCII.
    pub fn authorization_header(&self) -> Option<&str> {
        self.headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok())
    }

    /// Value of cookie `name` across all `Cookie` headers.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_cookie_lookup_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; lang=en"));
        headers.append(header::COOKIE, HeaderValue::from_static("session_id=abc-123"));
        let view = RequestView::new("/", headers);

        assert_eq!(view.cookie("session_id").as_deref(), Some("abc-123"));
        assert_eq!(view.cookie("lang").as_deref(), Some("en"));
        assert_eq!(view.cookie("missing"), None);
    }

    #[test]
    fn test_cookie_name_must_match_exactly() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("my_session_id=nope"));
        let view = RequestView::new("/", headers);
        assert_eq!(view.cookie("session_id"), None);
    }

    #[test]
    fn test_authorization_header() {
        let request = Request::builder()
            .uri("/api/v1/users/me?x=1")
            .header(header::AUTHORIZATION, "Basic Zm9vOmJhcg==")
            .body(())
            .unwrap();
        let view = RequestView::from_request(&request);
        assert_eq!(view.path, "/api/v1/users/me");
        assert_eq!(view.authorization_header(), Some("Basic Zm9vOmJhcg=="));
    }
}
