use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    apply, get_progress, list_course_applications, list_my_applications, record_lesson_completed,
    record_test_passed, set_status,
};

pub fn init_enrollments_router() -> Router<AppState> {
    Router::new()
        .route("/", post(apply))
        .route("/mine", get(list_my_applications))
        .route("/courses/{course_id}", get(list_course_applications))
        .route("/{id}/status", patch(set_status))
        .route("/progress/{course_id}", get(get_progress))
        .route("/progress/{course_id}/lessons", post(record_lesson_completed))
        .route("/progress/{course_id}/tests", post(record_test_passed))
}
