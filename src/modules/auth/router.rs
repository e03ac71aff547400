use axum::{Router, routing::post};

use crate::state::AppState;

use super::controller::{login, refresh, register_listener, register_specialist};

/// Public routes: none of these require a principal.
pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register/listener", post(register_listener))
        .route("/register/specialist", post(register_specialist))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}
