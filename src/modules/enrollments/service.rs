use tracing::instrument;

use crate::middleware::role::check_ownership;
use crate::modules::identity::model::Principal;
use crate::state::AppState;
use crate::utils::errors::AppError;

use super::model::{
    ApplicationStatus, CourseApplication, EnrollmentResponse, NewCourseApplication, ProgressStat,
};
use super::store::{CourseApplicationStore as _, CourseStore as _, ProgressStatStore as _};

pub struct EnrollmentService;

impl EnrollmentService {
    /// Creates a course application for the authenticated listener.
    ///
    /// Applications are approved on creation instead of waiting for the
    /// owning specialist; see DESIGN.md. This mirrors the production
    /// policy even though it leaves the pending state mostly unused. The
    /// store insert is atomic, so two concurrent applies for the same pair
    /// yield exactly one stored record and one `Conflict`.
    #[instrument(skip(state, listener), fields(listener_id = listener.subject_id))]
    pub async fn apply(
        state: &AppState,
        listener: &Principal,
        course_id: i64,
    ) -> Result<EnrollmentResponse, AppError> {
        state
            .courses
            .find_owner(course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course not found"))?;

        let application = state
            .applications
            .insert(NewCourseApplication {
                listener_id: listener.subject_id,
                course_id,
                status: ApplicationStatus::Approved,
            })
            .await?;

        let progress = state
            .progress
            .create_if_absent(listener.subject_id, course_id)
            .await?;

        Ok(EnrollmentResponse {
            application,
            progress,
        })
    }

    /// Moves an application to a new status on behalf of the course's
    /// owning specialist.
    ///
    /// Only the owner may touch applications under their course; anyone
    /// else gets `Forbidden`. Approved and rejected are terminal:
    /// re-asserting the current status is a no-op, any other change to a
    /// resolved application is a `Conflict`. Entering (or re-asserting)
    /// approved creates the progress counters if they are missing.
    #[instrument(skip(state, specialist), fields(specialist_id = specialist.subject_id))]
    pub async fn set_status(
        state: &AppState,
        specialist: &Principal,
        application_id: i64,
        new_status: ApplicationStatus,
    ) -> Result<CourseApplication, AppError> {
        let application = state
            .applications
            .find_by_id(application_id)
            .await?
            .ok_or_else(|| AppError::not_found("Application not found"))?;

        let owner_id = state
            .courses
            .find_owner(application.course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course not found"))?;
        check_ownership(specialist, owner_id)?;

        if application.status == new_status {
            if new_status == ApplicationStatus::Approved {
                state
                    .progress
                    .create_if_absent(application.listener_id, application.course_id)
                    .await?;
            }
            return Ok(application);
        }

        if application.status.is_terminal() {
            return Err(AppError::conflict("Application is already resolved"));
        }

        let updated = state
            .applications
            .update_status(application_id, new_status)
            .await?;

        if new_status == ApplicationStatus::Approved {
            state
                .progress
                .create_if_absent(updated.listener_id, updated.course_id)
                .await?;
        }

        Ok(updated)
    }

    /// Records one completed lesson for the listener's enrollment.
    #[instrument(skip(state, listener), fields(listener_id = listener.subject_id))]
    pub async fn record_lesson_completed(
        state: &AppState,
        listener: &Principal,
        course_id: i64,
    ) -> Result<ProgressStat, AppError> {
        let mut stat = Self::enrolled_progress(state, listener, course_id).await?;
        let totals = state
            .courses
            .totals(course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course not found"))?;

        stat.lessons_completed += 1;
        stat.recompute(&totals);
        state.progress.save(&stat).await?;
        Ok(stat)
    }

    /// Records one passed test for the listener's enrollment.
    #[instrument(skip(state, listener), fields(listener_id = listener.subject_id))]
    pub async fn record_test_passed(
        state: &AppState,
        listener: &Principal,
        course_id: i64,
    ) -> Result<ProgressStat, AppError> {
        let mut stat = Self::enrolled_progress(state, listener, course_id).await?;
        let totals = state
            .courses
            .totals(course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course not found"))?;

        stat.tests_passed += 1;
        stat.recompute(&totals);
        state.progress.save(&stat).await?;
        Ok(stat)
    }

    /// Returns the listener's progress for a course.
    #[instrument(skip(state, listener), fields(listener_id = listener.subject_id))]
    pub async fn progress_for(
        state: &AppState,
        listener: &Principal,
        course_id: i64,
    ) -> Result<ProgressStat, AppError> {
        Self::enrolled_progress(state, listener, course_id).await
    }

    /// Lists the listener's own applications, newest first.
    #[instrument(skip(state, listener), fields(listener_id = listener.subject_id))]
    pub async fn applications_for_listener(
        state: &AppState,
        listener: &Principal,
    ) -> Result<Vec<CourseApplication>, AppError> {
        state
            .applications
            .list_for_listener(listener.subject_id)
            .await
    }

    /// Lists the applications under a course for its owning specialist.
    #[instrument(skip(state, specialist), fields(specialist_id = specialist.subject_id))]
    pub async fn applications_for_course(
        state: &AppState,
        specialist: &Principal,
        course_id: i64,
    ) -> Result<Vec<CourseApplication>, AppError> {
        let owner_id = state
            .courses
            .find_owner(course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course not found"))?;
        check_ownership(specialist, owner_id)?;

        state.applications.list_for_course(course_id).await
    }

    /// Progress counters exist only for approved enrollments, so a missing
    /// row means the listener is not enrolled.
    async fn enrolled_progress(
        state: &AppState,
        listener: &Principal,
        course_id: i64,
    ) -> Result<ProgressStat, AppError> {
        state
            .progress
            .find_by_pair(listener.subject_id, course_id)
            .await?
            .ok_or_else(|| AppError::not_found("No approved enrollment for this course"))
    }
}
