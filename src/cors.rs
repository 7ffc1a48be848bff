//! CORS policy from the `CORS_ALLOWED_ORIGINS` allow-list.

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Entries are exact origins (`https://app.example.com`) or host wildcards
/// (`*.vercel.app`, which matches any subdomain on any scheme or port).
pub fn origin_allowed(origin: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|p| matches_origin(p, origin))
}

fn matches_origin(pattern: &str, origin: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(suffix) => origin_host(origin)
            .and_then(|host| host.strip_suffix(suffix))
            .is_some_and(|rest| rest.ends_with('.') && rest.len() > 1),
        None => pattern == origin,
    }
}

fn origin_host(origin: &str) -> Option<&str> {
    let (_, rest) = origin.split_once("://")?;
    Some(rest.split(':').next().unwrap_or(rest))
}

pub fn layer(allowed: Vec<String>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|origin| origin_allowed(origin, &allowed))
                .unwrap_or(false)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["http://localhost:3000".into(), "*.vercel.app".into()]
    }

    #[test]
    fn exact_origin_matches() {
        assert!(origin_allowed("http://localhost:3000", &allowed()));
        assert!(!origin_allowed("http://localhost:3001", &allowed()));
    }

    #[test]
    fn wildcard_matches_subdomains_only() {
        assert!(origin_allowed("https://preview.vercel.app", &allowed()));
        assert!(origin_allowed("http://a.b.vercel.app:8080", &allowed()));
        assert!(!origin_allowed("https://vercel.app", &allowed()));
        assert!(!origin_allowed("https://evilvercel.app", &allowed()));
        assert!(!origin_allowed("https://vercel.app.evil.com", &allowed()));
    }

    #[test]
    fn origin_without_scheme_is_rejected() {
        assert!(!origin_allowed("pregmed.vercel.app", &allowed()));
    }
}
