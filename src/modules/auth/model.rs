use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::modules::identity::model::Role;

/// Access token claims.
///
/// `sub` is the subject id rendered as a string, `role` is the lowercase
/// role name; both are parsed back through a single boundary when the
/// request principal is built. Unknown fields are rejected so a refresh
/// token (which carries `jti`) can never pass as an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    /// Expiry, whole seconds since epoch.
    pub exp: usize,
    /// Issued-at, whole seconds since epoch.
    pub iat: usize,
}

/// Refresh token claims. Long-lived, accepted only by the refresh endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshTokenClaims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
    /// Unique token id, so two refresh tokens minted in the same second
    /// still differ.
    pub jti: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequestDto {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisteredIdentity {
    pub id: i64,
    pub role: Role,
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub subject_id: i64,
    pub role: Role,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
}
