//! Security headers middleware.
//!
//! Every response gets the same locked-down header set. The CSP is built once
//! at startup (see [`AppState::content_security_policy`]) because `img-src`
//! must name the object storage origin the cat photos are served from.

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::{CACHE_CONTROL, CONTENT_SECURITY_POLICY},
    },
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Browser features the app never uses.
const PERMISSIONS_POLICY: &str = "accelerometer=(), autoplay=(), browsing-topics=(), \
     camera=(), display-capture=(), encrypted-media=(), fullscreen=(), geolocation=(), \
     gyroscope=(), hid=(), idle-detection=(), magnetometer=(), microphone=(), midi=(), \
     payment=(), picture-in-picture=(), publickey-credentials-get=(), screen-wake-lock=(), \
     serial=(), usb=(), web-share=(), xr-spatial-tracking=()";

/// Headers that do not depend on the request.
const FIXED_HEADERS: &[(&str, &str)] = &[
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("referrer-policy", "same-origin"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    // Photos come from a storage origin that sends no CORP headers
    ("cross-origin-embedder-policy", "credentialless"),
    ("x-dns-prefetch-control", "off"),
    ("permissions-policy", PERMISSIONS_POLICY),
];

/// Add security headers to all responses.
///
/// Pages are marked `no-store` since they show a user's own cats; files
/// under `/static` keep whatever caching `ServeDir` chose.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let is_static = request.uri().path().starts_with("/static/");
    let mut response = next.run(request).await;

    apply_headers(
        response.headers_mut(),
        state.content_security_policy(),
        is_static,
    );

    response
}

fn apply_headers(headers: &mut HeaderMap, csp: &HeaderValue, is_static: bool) {
    for &(name, value) in FIXED_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers.insert(CONTENT_SECURITY_POLICY, csp.clone());

    if !is_static {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }
}

#[cfg(test)]
mod tests {
    use axum::http::header::{REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS};

    use super::*;

    #[test]
    fn test_pages_are_not_cached() {
        let mut headers = HeaderMap::new();
        apply_headers(&mut headers, &HeaderValue::from_static("default-src 'none'"), false);

        assert_eq!(headers[X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[CONTENT_SECURITY_POLICY], "default-src 'none'");
        assert_eq!(headers[CACHE_CONTROL], "no-store");
        assert_eq!(headers["cross-origin-embedder-policy"], "credentialless");
        assert_eq!(headers[REFERRER_POLICY], "same-origin");
        assert_eq!(headers.len(), FIXED_HEADERS.len() + 2);
    }

    #[test]
    fn test_static_files_keep_cache_control() {
        let mut headers = HeaderMap::new();
        apply_headers(&mut headers, &HeaderValue::from_static("default-src 'none'"), true);

        assert!(!headers.contains_key(CACHE_CONTROL));
        assert_eq!(headers[X_CONTENT_TYPE_OPTIONS], "nosniff");
    }
}
