//! Request guards: developer identity, optional API key and anti-forgery tokens.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};

/// Header carrying the authenticated developer, set by the upstream session layer.
pub const DEVELOPER_HEADER: &str = "X-Designer-Developer";
/// Header echoing the anti-forgery token on mutating requests.
pub const XSRF_HEADER: &str = "X-XSRF-TOKEN";
/// Cookie holding the anti-forgery token.
pub const XSRF_COOKIE: &str = "XSRF-TOKEN";

/// The developer a request acts on behalf of. Inserted into request extensions
/// by [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Developer(pub String);

/// Security configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct SecurityConfig {
    /// API key required as a bearer token (from DESIGNER_API_KEY)
    pub api_key: Option<String>,
    /// Allowed CORS origins (from DESIGNER_CORS_ORIGINS, comma-separated)
    pub cors_origins: Option<Vec<String>>,
    /// Require matching anti-forgery header and cookie on mutating requests
    /// (DESIGNER_ANTIFORGERY=false disables)
    pub antiforgery: bool,
}

impl SecurityConfig {
    /// Load security configuration from environment variables.
    pub fn from_env() -> Self {
        let api_key = std::env::var("DESIGNER_API_KEY").ok();

        let cors_origins = std::env::var("DESIGNER_CORS_ORIGINS")
            .ok()
            .map(|s| s.split(',').map(|s| s.trim().to_string()).collect());

        let antiforgery = std::env::var("DESIGNER_ANTIFORGERY")
            .map(|v| !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        Self {
            api_key,
            cors_origins,
            antiforgery,
        }
    }

    /// No API key and no anti-forgery check (for local development/testing).
    /// Developer identity is still required.
    pub fn disabled() -> Self {
        Self {
            api_key: None,
            cors_origins: None,
            antiforgery: false,
        }
    }

    /// Create a config with authentication enabled (for testing).
    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            ..Self::disabled()
        }
    }

    /// Create a config with anti-forgery checks enabled (for testing).
    pub fn with_antiforgery() -> Self {
        Self {
            antiforgery: true,
            ..Self::disabled()
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Authentication middleware: resolves the developer and checks the API key if one is set.
pub async fn auth_middleware(
    State(config): State<SecurityConfig>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(expected_key) = &config.api_key {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) if token == expected_key => {}
            Some(_) => {
                tracing::warn!("Invalid API key provided");
                return Err(StatusCode::UNAUTHORIZED);
            }
            None => {
                tracing::warn!("Missing or malformed Authorization header");
                return Err(StatusCode::UNAUTHORIZED);
            }
        }
    }

    let developer = request
        .headers()
        .get(DEVELOPER_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let Some(developer) = developer else {
        tracing::warn!("Request without developer identity");
        return Err(StatusCode::UNAUTHORIZED);
    };
    if !is_valid_developer(&developer) {
        tracing::warn!("Rejected developer name {:?}", developer);
        return Err(StatusCode::UNAUTHORIZED);
    }

    request.extensions_mut().insert(Developer(developer));
    Ok(next.run(request).await)
}

/// Anti-forgery middleware: mutating requests must echo the token cookie in a header.
pub async fn antiforgery_middleware(
    State(config): State<SecurityConfig>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if !config.antiforgery || is_safe_method(request.method()) {
        return Ok(next.run(request).await);
    }

    let header_token = request
        .headers()
        .get(XSRF_HEADER)
        .and_then(|h| h.to_str().ok());
    let cookie_token = cookie_value(request.headers(), XSRF_COOKIE);

    match (header_token, cookie_token) {
        (Some(h), Some(c)) if !h.is_empty() && h == c => Ok(next.run(request).await),
        _ => {
            tracing::warn!("Anti-forgery validation failed for {}", request.uri());
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Developer names become a path segment of the working copy location.
fn is_valid_developer(name: &str) -> bool {
    name.len() <= 100
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
