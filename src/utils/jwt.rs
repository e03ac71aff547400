//! Token codec: creation and verification of signed session tokens.
//!
//! Two kinds of token exist. Access tokens are short-lived and authenticate
//! ordinary API calls; refresh tokens are long-lived, carry a `jti` and are
//! accepted only by the refresh endpoint. Both are HS256 JWTs signed with the
//! process-wide secret from [`JwtConfig`].

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::modules::auth::model::{Claims, RefreshTokenClaims};
use crate::modules::identity::model::Role;
use crate::utils::errors::AppError;

/// Why a presented token was rejected.
///
/// Decoding fails closed: anything that is not a clean signature or expiry
/// failure is reported as `Malformed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Malformed,
    BadSignature,
    Expired,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "Malformed token"),
            TokenError::BadSignature => write!(f, "Invalid token signature"),
            TokenError::Expired => write!(f, "Token has expired"),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            _ => TokenError::Malformed,
        }
    }
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    // The default 60s leeway would let freshly expired tokens through.
    validation.leeway = 0;
    validation
}

pub fn create_access_token(
    subject_id: i64,
    role: Role,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry as usize;

    let claims = Claims {
        sub: subject_id.to_string(),
        role: role.as_str().to_string(),
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create access token: {}", e)))
}

pub fn create_refresh_token(
    subject_id: i64,
    role: Role,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.refresh_token_expiry as usize;

    let claims = RefreshTokenClaims {
        sub: subject_id.to_string(),
        role: role.as_str().to_string(),
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create refresh token: {}", e)))
}

pub fn verify_access_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, TokenError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation(),
    )
    .map(|data| data.claims)
    .map_err(TokenError::from)
}

pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshTokenClaims, TokenError> {
    decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation(),
    )
    .map(|data| data.claims)
    .map_err(TokenError::from)
}
