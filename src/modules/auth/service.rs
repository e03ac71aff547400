use tracing::instrument;

use crate::modules::identity::model::{NewIdentity, Principal, Role};
use crate::modules::identity::store::IdentityStore;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::{create_access_token, create_refresh_token, verify_refresh_token};
use crate::utils::password::{hash_password, verify_password};

use super::model::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequestDto,
    RegisteredIdentity,
};

/// The one client-visible message for every authentication miss. An unknown
/// email and a wrong password must be indistinguishable to the caller.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub struct AuthService;

impl AuthService {
    /// Turns an (email, password) pair into an authenticated principal.
    ///
    /// The lookup covers both identity kinds; listeners are checked before
    /// specialists. Any miss, whether the email is unknown or the password
    /// is wrong, returns the same generic `Unauthorized`.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn authenticate(
        identities: &dyn IdentityStore,
        email: &str,
        password: &str,
    ) -> Result<Principal, AppError> {
        let identity = identities
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;

        if !verify_password(password, &identity.password_hash)? {
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        Ok(Principal {
            subject_id: identity.id,
            role: identity.role,
        })
    }

    /// Registers a new identity of the given kind.
    ///
    /// Emails must be unique across both kinds, so the joint lookup runs
    /// before the insert; the per-kind unique index backs it up.
    #[instrument(skip_all, fields(role = role.as_str()))]
    pub async fn register(
        state: &AppState,
        role: Role,
        dto: RegisterRequestDto,
    ) -> Result<RegisteredIdentity, AppError> {
        if state.identities.find_by_email(&dto.email).await?.is_some() {
            return Err(AppError::conflict("Email is already registered"));
        }

        let password_hash = hash_password(&dto.password)?;
        let identity = state
            .identities
            .insert(NewIdentity {
                role,
                email: dto.email,
                password_hash,
            })
            .await?;

        Ok(RegisteredIdentity {
            id: identity.id,
            role: identity.role,
            email: identity.email,
        })
    }

    /// Authenticates and mints the access/refresh token pair. This is the
    /// only path that creates fresh tokens from credentials.
    #[instrument(skip_all)]
    pub async fn login(state: &AppState, dto: LoginRequest) -> Result<LoginResponse, AppError> {
        let principal =
            Self::authenticate(state.identities.as_ref(), &dto.email, &dto.password).await?;

        let access_token =
            create_access_token(principal.subject_id, principal.role, &state.jwt_config)?;
        let refresh_token =
            create_refresh_token(principal.subject_id, principal.role, &state.jwt_config)?;

        Ok(LoginResponse {
            subject_id: principal.subject_id,
            role: principal.role,
            access_token,
            refresh_token,
        })
    }

    /// Mints a new access token from a refresh token.
    ///
    /// Only refresh tokens are accepted here; an access token presented to
    /// this path fails decode. The subject is re-resolved against the
    /// identity store so a deleted account cannot keep refreshing.
    #[instrument(skip_all)]
    pub async fn refresh(
        state: &AppState,
        dto: RefreshRequest,
    ) -> Result<RefreshResponse, AppError> {
        let claims = verify_refresh_token(&dto.refresh_token, &state.jwt_config)
            .map_err(|e| AppError::unauthorized(e.to_string()))?;

        let subject_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized("Malformed token"))?;
        let role =
            Role::parse(&claims.role).ok_or_else(|| AppError::unauthorized("Malformed token"))?;

        state
            .identities
            .find_by_id(subject_id, role)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;

        let access_token = create_access_token(subject_id, role, &state.jwt_config)?;

        Ok(RefreshResponse { access_token })
    }
}
