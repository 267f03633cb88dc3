//! JWT service for session token issuance and validation
//!
//! Tokens are signed with HS256 using a shared secret. Expiry is optional:
//! when `JWT_TOKEN_EXPIRY` is unset, issued tokens carry no `exp` claim and
//! remain valid until the secret changes. There is no revocation list;
//! validity is purely signature plus expiry.

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::{Role, User};

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret for signing and verifying tokens
    pub secret: String,
    /// Token expiry in seconds; tokens never expire when unset
    pub token_expiry: Option<u64>,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: shared HS256 secret (required)
    /// - `JWT_TOKEN_EXPIRY`: token expiry in seconds (optional)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        let token_expiry = std::env::var("JWT_TOKEN_EXPIRY")
            .ok()
            .and_then(|s| s.parse().ok());

        Ok(JwtConfig {
            secret,
            token_expiry,
        })
    }
}

/// Session token claims
///
/// The role is embedded at issuance and trusted as-is on later requests;
/// it is not re-checked against the user record.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: i64,
    /// User email
    pub email: String,
    /// User role
    pub role: Role,
    /// Issued at time
    pub iat: u64,
    /// Expiration time, absent when no expiry is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_expiry: Option<u64>,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: &JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` stays optional: checked when present, tolerated when absent
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = true;

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            token_expiry: config.token_expiry,
        }
    }

    /// Issue a signed session token embedding id, email and role
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: self.token_expiry.map(|expiry| now + expiry),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token and return the embedded claims unchanged
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn service(secret: &str, token_expiry: Option<u64>) -> JwtService {
        JwtService::new(&JwtConfig {
            secret: secret.to_string(),
            token_expiry,
        })
    }

    fn sample_user() -> User {
        User {
            id: 42,
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "irrelevant".to_string(),
            is_active: false,
            activation_token: None,
            role: Role::Admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn issue_then_validate_returns_embedded_claims() {
        let service = service("test-secret", None);
        let user = sample_user();

        let token = service.issue(&user).expect("token issuance failed");
        let claims = service.validate(&token).expect("validation failed");

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn validate_rejects_wrong_secret() {
        let issuer = service("one-secret", None);
        let verifier = service("another-secret", None);

        let token = issuer.issue(&sample_user()).expect("token issuance failed");
        assert!(verifier.validate(&token).is_err());
    }

    #[test]
    fn validate_rejects_tampered_token() {
        let service = service("test-secret", None);
        let token = service.issue(&sample_user()).expect("token issuance failed");

        let mut tampered = token.into_bytes();
        let last = tampered.len() - 1;
        tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(tampered).unwrap();

        assert!(service.validate(&tampered).is_err());
    }

    #[test]
    fn validate_rejects_expired_token() {
        let service = service("test-secret", None);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        let claims = Claims {
            sub: 1,
            email: "expired@example.com".to_string(),
            role: Role::Cliente,
            iat: now - 600,
            // beyond the default leeway
            exp: Some(now - 300),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(service.validate(&token).is_err());
    }

    #[test]
    fn configured_expiry_is_embedded() {
        let service = service("test-secret", Some(900));
        let token = service.issue(&sample_user()).expect("token issuance failed");
        let claims = service.validate(&token).expect("validation failed");

        let exp = claims.exp.expect("expiry missing");
        assert!(exp > claims.iat);
        assert_eq!(exp - claims.iat, 900);
    }
}
