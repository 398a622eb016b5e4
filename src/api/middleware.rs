//! Request gates that run before the lot handlers.
//!
//! Order on protected routes: client limit, then `require_auth`, then the user
//! limit (it keys on the claims `require_auth` attaches).

use crate::{
    api::{
        error::ApiError,
        rate_limit::{RateLimit, RateLimitDecision},
    },
    auth::{AuthError, Claims, TokenKeys},
};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{debug, warn};

const UNKNOWN_CLIENT: &str = "unknown";

// auth scheme names are case-insensitive
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let (scheme, token) = headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .trim_start()
        .split_once(' ')?;

    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(
            || UNKNOWN_CLIENT.to_string(),
            |ConnectInfo(addr)| addr.ip().to_string(),
        )
}

fn enforce(limiter: &RateLimit, key: &str) -> Result<(), ApiError> {
    match limiter.check(key) {
        RateLimitDecision::Allowed => Ok(()),
        RateLimitDecision::Limited { retry_after } => {
            warn!(
                "{} rate limit hit by {key}, retry in {}s",
                limiter.name(),
                retry_after.as_secs()
            );
            Err(ApiError::RateLimited { retry_after })
        }
    }
}

/// Validate the bearer token and attach its [`Claims`] to the request.
///
/// # Errors
/// Returns 401 when the header is missing or the token is invalid.
pub async fn require_auth(
    State(keys): State<Arc<TokenKeys>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).ok_or(AuthError::MissingToken)?;
    let claims = keys.validate(token)?;

    debug!("authenticated {}", claims.sub);
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Limit by client IP.
///
/// # Errors
/// Returns 429 when the client's bucket is empty.
pub async fn limit_by_client(
    State(limiter): State<Arc<RateLimit>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(&limiter, &client_key(&request))?;
    Ok(next.run(request).await)
}

/// Limit by authenticated user. Must run after [`require_auth`].
///
/// # Errors
/// Returns 429 when the user's bucket is empty, 401 if no claims are attached.
pub async fn limit_by_user(
    State(limiter): State<Arc<RateLimit>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let subject = request
        .extensions()
        .get::<Claims>()
        .map(|claims| claims.sub.clone())
        .ok_or(AuthError::MissingToken)?;

    enforce(&limiter, &subject)?;
    Ok(next.run(request).await)
}
