//! Registration, login and token verification endpoints

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::{
    AppState,
    error::{ApiError, is_unique_violation},
    extract::ApiJson,
    models::NewUser,
    validation,
};

/// Request body for user registration
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Register a new user
///
/// The role always defaults to `cliente`; it is never taken from the
/// request body.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_password_confirmation(&payload.password, &payload.confirm_password)
        .map_err(ApiError::Validation)?;
    validation::validate_email(&payload.email).map_err(ApiError::Validation)?;

    let new_user = NewUser {
        full_name: payload.full_name,
        email: payload.email,
        password: payload.password,
    };

    match state.user_repository.create(&new_user).await {
        Ok(_) => Ok(Json(json!({
            "error": false,
            "msg": "User created successfully"
        }))),
        Err(e) => {
            if e.downcast_ref::<sqlx::Error>()
                .is_some_and(is_unique_violation)
            {
                return Err(ApiError::Validation(
                    "This email is already registered. Please use another email.".to_string(),
                ));
            }
            error!("Failed to create user: {e:#}");
            Err(ApiError::Internal)
        }
    }
}

/// Log a user in and issue a session token
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_repository
        .find_by_email(&payload.email)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {e:#}");
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound("The user does not exist".to_string()))?;

    let password_ok = state
        .user_repository
        .verify_password(&user, &payload.password)
        .map_err(|e| {
            error!("Failed to verify password: {e:#}");
            ApiError::Internal
        })?;

    if !password_ok {
        return Err(ApiError::Forbidden("Incorrect password".to_string()));
    }

    let token = state.jwt_service.issue(&user).map_err(|e| {
        error!("Failed to issue token: {e:#}");
        ApiError::Internal
    })?;

    Ok(Json(json!({
        "error": false,
        "user": {
            "id": user.id,
            "full_name": user.full_name,
            "email": user.email,
            "role": user.role,
            "token": format!("Bearer {token}"),
        }
    })))
}

/// Verify a session token and echo its claims
pub async fn verify_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;

    let claims = state
        .jwt_service
        .validate(token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    Ok(Json(json!({
        "error": false,
        "id": claims.sub,
        "email": claims.email,
        "role": claims.role,
    })))
}
