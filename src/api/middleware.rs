//! API Middleware
//!
//! Bearer authentication, per-IP rate limiting and request logging.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::net::{IpAddr, SocketAddr};
use uuid::Uuid;

use crate::auth::AuthError;
use crate::domain::OperationContext;
use crate::error::AppError;

use super::AppState;

/// Header carrying the request correlation id
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Customer identity taken from a valid access token
#[derive(Debug, Clone)]
pub struct AuthenticatedCustomer {
    pub customer_id: Uuid,
}

fn correlation_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
}

/// Client address: first `X-Forwarded-For` hop, then the socket peer.
pub fn client_ip(request: &Request<Body>) -> Option<IpAddr> {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|hop| hop.trim().parse::<IpAddr>().ok());

    forwarded.or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    })
}

// =========================================================================
// Bearer Authentication Middleware
// =========================================================================

/// Validate `Authorization: Bearer <access token>`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let token = match header_value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            token.trim()
        }
        _ => return Err(AuthError::MalformedHeader.into()),
    };

    let claims = state.tokens.validate_access(token)?;

    let mut context = OperationContext::new().with_customer(claims.customer_id);
    if let Some(id) = correlation_id(request.headers()) {
        context = context.with_correlation_id(id);
    }
    context.ensure_correlation_id();
    if let Some(ip) = client_ip(&request) {
        context = context.with_client_ip(ip);
    }

    request.extensions_mut().insert(AuthenticatedCustomer {
        customer_id: claims.customer_id,
    });
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

// =========================================================================
// Rate Limiting Middleware
// =========================================================================

/// Fixed-window request counter per client IP, kept in the cache.
///
/// Fails open: when the cache cannot count, the request goes through.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let limit = state.config.rate_limit_per_second;
    let window = state.config.rate_limit_window();

    let ip = client_ip(&request)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let window_index = Utc::now().timestamp() as u64 / window.as_secs().max(1);
    let key = format!("rate_limit:{}:{}", ip, window_index);

    let (count, reset_in) = match state.cache.store().increment(&key, window).await {
        Ok(counted) => counted,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Rate limit check failed, allowing request");
            return next.run(request).await;
        }
    };

    let remaining = (limit - count).max(0);
    let reset_secs = reset_in.as_secs().max(1);
    let reset_at = Utc::now().timestamp() + reset_secs as i64;

    let mut response = if count > limit {
        tracing::warn!(client_ip = %ip, count, limit, "Rate limit exceeded");
        let mut response = AppError::RateLimitExceeded.into_response();
        set_header(&mut response, header::RETRY_AFTER, reset_secs);
        response
    } else {
        next.run(request).await
    };

    set_header(&mut response, HeaderName::from_static("x-ratelimit-limit"), limit);
    set_header(
        &mut response,
        HeaderName::from_static("x-ratelimit-remaining"),
        remaining,
    );
    set_header(&mut response, HeaderName::from_static("x-ratelimit-reset"), reset_at);

    response
}

fn set_header(response: &mut Response, name: HeaderName, value: impl ToString) {
    if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
        response.headers_mut().insert(name, value);
    }
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware
///
/// Outermost layer. Stamps a correlation id on the request (keeping a valid
/// incoming one) so the auth layer and handlers log under the same id, and
/// echoes it on the response.
pub async fn logging_middleware(mut request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();

    let correlation_id = correlation_id(request.headers()).unwrap_or_else(Uuid::new_v4);
    if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
        request
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, value);
    }

    // Mask sensitive headers
    let headers = mask_headers_for_logging(request.headers());

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        version = ?version,
        correlation_id = %correlation_id,
        headers = ?headers,
        "Incoming request"
    );

    let mut response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        correlation_id = %correlation_id,
        "Request completed"
    );

    set_header(
        &mut response,
        HeaderName::from_static(CORRELATION_ID_HEADER),
        correlation_id,
    );

    response
}
