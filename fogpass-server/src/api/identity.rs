//! Submitter identity and client address from request headers.

use axum::http::HeaderMap;

const USER_HEADER: &str = "x-user";
const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// The `X-User` header, if present and not blank.
pub fn uploaded_by(headers: &HeaderMap) -> Option<String> {
    header(headers, USER_HEADER).map(str::to_string)
}

/// First non-blank of `X-Forwarded-For` and `X-Real-IP`, cut at the first comma.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    [FORWARDED_FOR, REAL_IP]
        .iter()
        .find_map(|name| header(headers, name))
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn test_forwarded_for_first_hop() {
        let h = headers(&[
            ("x-forwarded-for", "203.0.113.9, 10.0.0.1"),
            ("x-real-ip", "10.0.0.2"),
        ]);
        assert_eq!(client_ip(&h).as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_blank_forwarded_for_falls_back() {
        let h = headers(&[("x-forwarded-for", "  "), ("x-real-ip", "10.0.0.2")]);
        assert_eq!(client_ip(&h).as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn test_no_address_headers() {
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn test_user_header() {
        assert_eq!(
            uploaded_by(&headers(&[("x-user", " asha ")])).as_deref(),
            Some("asha")
        );
        assert_eq!(uploaded_by(&headers(&[("x-user", "")])), None);
    }
}
