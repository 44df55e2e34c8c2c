//! Authentication middleware — Bearer token extraction and format check.

use axum::http::header::AUTHORIZATION;
use axum::{extract::Request, middleware::Next, response::Response};
use companion_core::auth::token_subject;
use tracing::debug;

use crate::error::AppError;

/// Caller identity stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Username parsed from the token.
    pub username: String,
    /// Raw bearer token, used as the session key.
    pub token: String,
}

/// Credentials of an `Authorization` header value using the bearer scheme.
///
/// The scheme name is matched case-insensitively.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim_start().split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
}

/// Axum middleware: extracts `Authorization: Bearer <token>`, checks that it
/// looks like an issued token, and injects `AuthenticatedUser` into request
/// extensions.
///
/// Tokens are unsigned, so only their shape can be verified.
pub async fn require_auth(mut request: Request, next: Next) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;

    let token = bearer_token(header)
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme".into()))?;

    let username = token_subject(token)
        .ok_or_else(|| {
            debug!("rejected malformed bearer token");
            AppError::Unauthorized("Invalid token".into())
        })?
        .to_string();

    let user = AuthenticatedUser {
        username,
        token: token.to_string(),
    };
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
