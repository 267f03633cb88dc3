//! Middleware for JWT token validation and authentication

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{AppState, error::ApiError, models::Role};

/// Authenticated user information extracted from the session token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

/// Extract and validate the JWT from the Authorization header
///
/// A missing or malformed header yields 401; a token that fails signature
/// or expiry checks yields 403. The embedded claims are inserted into the
/// request extensions as [`AuthUser`] for handlers to consume.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            ApiError::Unauthorized(
                "Token missing or malformed (must be a Bearer token)".to_string(),
            )
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::Unauthorized("Token missing or malformed (must be a Bearer token)".to_string())
    })?;

    let claims = state.jwt_service.validate(token).map_err(|e| {
        warn!("Rejected token: {e}");
        ApiError::Forbidden("Invalid or expired token".to_string())
    })?;

    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    });

    Ok(next.run(req).await)
}
