use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::modules::auth::model::Claims;
use crate::utils::jwt::TokenError;

/// The two user classes of the platform.
///
/// Roles travel through tokens and responses as lowercase strings;
/// [`Role::parse`] is the only place a string becomes a `Role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Listener,
    Specialist,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Listener => "listener",
            Role::Specialist => "specialist",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "listener" => Some(Role::Listener),
            "specialist" => Some(Role::Specialist),
            _ => None,
        }
    }
}

/// The authenticated identity attached to a request.
///
/// Produced only from a successfully verified access token, lives in the
/// request extensions for the duration of one request and is never
/// persisted. Handlers trust these fields and nothing the client sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub subject_id: i64,
    pub role: Role,
}

impl TryFrom<&Claims> for Principal {
    type Error = TokenError;

    /// Builds a principal from verified claims. A subject that is not an
    /// integer or a role outside the closed set means the token content is
    /// not something this server issued, so the decode fails closed.
    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        let subject_id = claims.sub.parse().map_err(|_| TokenError::Malformed)?;
        let role = Role::parse(&claims.role).ok_or(TokenError::Malformed)?;
        Ok(Principal { subject_id, role })
    }
}

/// An identity record as stored by one of the two identity kinds.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: i64,
    pub role: Role,
    pub email: String,
    pub password_hash: String,
}

/// Payload for inserting a new identity at registration.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub role: Role,
    pub email: String,
    pub password_hash: String,
}
