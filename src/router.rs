use axum::{Router, middleware};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::middleware::auth::authenticate;
use crate::modules::auth::router::init_auth_router;
use crate::modules::enrollments::router::init_enrollments_router;
use crate::state::AppState;

/// Builds the application router.
///
/// The authentication middleware wraps every route and only attaches
/// request context; which routes actually require a principal (and which
/// role) is decided by the extractors each handler uses.
pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest(
            "/api",
            Router::new()
                .nest("/auth", init_auth_router())
                .nest("/enrollments", init_enrollments_router()),
        )
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state, authenticate))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
