//! Per-request authentication pipeline.
//!
//! [`authenticate`] runs once before route dispatch. It reads the bearer
//! credential, decodes it and attaches either a [`Principal`] or the decode
//! failure reason to the request extensions, then always lets the request
//! continue. A missing header is not an error at this stage; non-public
//! routes reject later through [`AuthPrincipal`], which is the single point
//! where an unauthenticated request turns into a 401 response.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::modules::identity::model::Principal;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::{TokenError, verify_access_token};

/// Recorded when a token was presented but did not verify. Kept in the
/// request extensions so the rejection point can report the reason.
#[derive(Debug, Clone, Copy)]
pub struct TokenRejection(pub TokenError);

/// Middleware: extract the bearer token, decode it, attach the outcome.
///
/// Touches nothing but this request's extensions, so concurrent requests
/// never observe each other's state.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    // An absent header or a non-bearer scheme both mean "no token".
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned);

    if let Some(token) = token {
        let outcome = verify_access_token(&token, &state.jwt_config)
            .and_then(|claims| Principal::try_from(&claims));
        match outcome {
            Ok(principal) => {
                req.extensions_mut().insert(principal);
            }
            Err(reason) => {
                req.extensions_mut().insert(TokenRejection(reason));
            }
        }
    }

    next.run(req).await
}

/// Extractor that yields the request's authenticated principal.
///
/// Rejects with `Unauthorized` (never `Forbidden`) when no principal was
/// attached, surfacing the decode failure recorded by [`authenticate`] if
/// there was one.
#[derive(Debug, Clone, Copy)]
pub struct AuthPrincipal(pub Principal);

impl<S> FromRequestParts<S> for AuthPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(AuthPrincipal(*principal));
        }

        let message = match parts.extensions.get::<TokenRejection>() {
            Some(rejection) => rejection.0.to_string(),
            None => "Missing authorization token".to_string(),
        };

        Err(AppError::unauthorized(message))
    }
}
