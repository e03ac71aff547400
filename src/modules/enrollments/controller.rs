use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::instrument;

use crate::middleware::role::{RequireListener, RequireSpecialist};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    ApplyRequest, CourseApplication, EnrollmentResponse, ProgressStat, SetStatusRequest,
};
use super::service::EnrollmentService;

/// Apply for enrollment in a course
#[utoipa::path(
    post,
    path = "/api/enrollments",
    request_body = ApplyRequest,
    responses(
        (status = 201, description = "Application created", body = EnrollmentResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - Listeners only", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "Application already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state, listener, dto))]
pub async fn apply(
    State(state): State<AppState>,
    RequireListener(listener): RequireListener,
    ValidatedJson(dto): ValidatedJson<ApplyRequest>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), AppError> {
    let outcome = EnrollmentService::apply(&state, &listener, dto.course_id).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// List the authenticated listener's applications
#[utoipa::path(
    get,
    path = "/api/enrollments/mine",
    responses(
        (status = 200, description = "Applications", body = [CourseApplication]),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - Listeners only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state, listener))]
pub async fn list_my_applications(
    State(state): State<AppState>,
    RequireListener(listener): RequireListener,
) -> Result<Json<Vec<CourseApplication>>, AppError> {
    let applications = EnrollmentService::applications_for_listener(&state, &listener).await?;
    Ok(Json(applications))
}

/// List applications for a course owned by the authenticated specialist
#[utoipa::path(
    get,
    path = "/api/enrollments/courses/{course_id}",
    params(("course_id" = i64, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Applications", body = [CourseApplication]),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - not the course owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state, specialist))]
pub async fn list_course_applications(
    State(state): State<AppState>,
    RequireSpecialist(specialist): RequireSpecialist,
    Path(course_id): Path<i64>,
) -> Result<Json<Vec<CourseApplication>>, AppError> {
    let applications =
        EnrollmentService::applications_for_course(&state, &specialist, course_id).await?;
    Ok(Json(applications))
}

/// Approve or reject an application (course owner only)
#[utoipa::path(
    patch,
    path = "/api/enrollments/{id}/status",
    params(("id" = i64, Path, description = "Application ID")),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = CourseApplication),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - not the course owner", body = ErrorResponse),
        (status = 404, description = "Application or course not found", body = ErrorResponse),
        (status = 409, description = "Application is already resolved", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state, specialist))]
pub async fn set_status(
    State(state): State<AppState>,
    RequireSpecialist(specialist): RequireSpecialist,
    Path(id): Path<i64>,
    Json(dto): Json<SetStatusRequest>,
) -> Result<Json<CourseApplication>, AppError> {
    let application = EnrollmentService::set_status(&state, &specialist, id, dto.status).await?;
    Ok(Json(application))
}

/// Record a completed lesson for the authenticated listener
#[utoipa::path(
    post,
    path = "/api/enrollments/progress/{course_id}/lessons",
    params(("course_id" = i64, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Progress updated", body = ProgressStat),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - Listeners only", body = ErrorResponse),
        (status = 404, description = "No approved enrollment", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state, listener))]
pub async fn record_lesson_completed(
    State(state): State<AppState>,
    RequireListener(listener): RequireListener,
    Path(course_id): Path<i64>,
) -> Result<Json<ProgressStat>, AppError> {
    let stat = EnrollmentService::record_lesson_completed(&state, &listener, course_id).await?;
    Ok(Json(stat))
}

/// Record a passed test for the authenticated listener
#[utoipa::path(
    post,
    path = "/api/enrollments/progress/{course_id}/tests",
    params(("course_id" = i64, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Progress updated", body = ProgressStat),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - Listeners only", body = ErrorResponse),
        (status = 404, description = "No approved enrollment", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state, listener))]
pub async fn record_test_passed(
    State(state): State<AppState>,
    RequireListener(listener): RequireListener,
    Path(course_id): Path<i64>,
) -> Result<Json<ProgressStat>, AppError> {
    let stat = EnrollmentService::record_test_passed(&state, &listener, course_id).await?;
    Ok(Json(stat))
}

/// Get the authenticated listener's progress for a course
#[utoipa::path(
    get,
    path = "/api/enrollments/progress/{course_id}",
    params(("course_id" = i64, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Progress", body = ProgressStat),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - Listeners only", body = ErrorResponse),
        (status = 404, description = "No approved enrollment", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state, listener))]
pub async fn get_progress(
    State(state): State<AppState>,
    RequireListener(listener): RequireListener,
    Path(course_id): Path<i64>,
) -> Result<Json<ProgressStat>, AppError> {
    let stat = EnrollmentService::progress_for(&state, &listener, course_id).await?;
    Ok(Json(stat))
}
