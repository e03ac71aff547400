use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequestDto,
    RegisteredIdentity,
};
use crate::modules::enrollments::model::{
    ApplicationStatus, ApplyRequest, CourseApplication, EnrollmentResponse, ProgressStat,
    SetStatusRequest,
};
use crate::modules::identity::model::Role;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register_listener,
        crate::modules::auth::controller::register_specialist,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::refresh,
        crate::modules::enrollments::controller::apply,
        crate::modules::enrollments::controller::list_my_applications,
        crate::modules::enrollments::controller::list_course_applications,
        crate::modules::enrollments::controller::set_status,
        crate::modules::enrollments::controller::record_lesson_completed,
        crate::modules::enrollments::controller::record_test_passed,
        crate::modules::enrollments::controller::get_progress,
    ),
    components(
        schemas(
            Role,
            RegisterRequestDto,
            RegisteredIdentity,
            LoginRequest,
            LoginResponse,
            RefreshRequest,
            RefreshResponse,
            ApplicationStatus,
            ApplyRequest,
            SetStatusRequest,
            CourseApplication,
            ProgressStat,
            EnrollmentResponse,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and token refresh"),
        (name = "Enrollments", description = "Course applications and progress tracking")
    ),
    info(
        title = "Lektora API",
        version = "0.1.0",
        description = "Course platform backend with JWT-based authentication for listeners and specialists.",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
