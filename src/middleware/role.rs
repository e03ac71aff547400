//! Authorization guards evaluated after the authentication middleware.
//!
//! Routes fall into four classes: public (no checks), authenticated-any
//! ([`super::auth::AuthPrincipal`] alone), role-restricted
//! ([`RequireListener`] / [`RequireSpecialist`]) and owner-restricted
//! (role extractor plus [`check_ownership`] against the stored owner id).
//! A missing principal is always 401; a present principal failing a check
//! is always 403.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::middleware::auth::AuthPrincipal;
use crate::modules::identity::model::{Principal, Role};
use crate::utils::errors::AppError;

/// Role check: the principal's role must be in `allowed`.
pub fn check_role(principal: &Principal, allowed: &[Role]) -> Result<(), AppError> {
    if !allowed.contains(&principal.role) {
        return Err(AppError::forbidden(format!(
            "Access denied. Required role: {}",
            allowed
                .iter()
                .map(Role::as_str)
                .collect::<Vec<_>>()
                .join(" or ")
        )));
    }
    Ok(())
}

/// Ownership check: the principal must be the resource's declared owner.
pub fn check_ownership(principal: &Principal, owner_id: i64) -> Result<(), AppError> {
    if principal.subject_id != owner_id {
        return Err(AppError::forbidden(
            "Access denied. You do not own this resource",
        ));
    }
    Ok(())
}

/// Extractor for listener-only routes.
#[derive(Debug, Clone, Copy)]
pub struct RequireListener(pub Principal);

impl<S> FromRequestParts<S> for RequireListener
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthPrincipal(principal) = AuthPrincipal::from_request_parts(parts, state).await?;
        check_role(&principal, &[Role::Listener])?;
        Ok(RequireListener(principal))
    }
}

/// Extractor for specialist-only routes.
#[derive(Debug, Clone, Copy)]
pub struct RequireSpecialist(pub Principal);

impl<S> FromRequestParts<S> for RequireSpecialist
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthPrincipal(principal) = AuthPrincipal::from_request_parts(parts, state).await?;
        check_role(&principal, &[Role::Specialist])?;
        Ok(RequireSpecialist(principal))
    }
}
