use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Approval state of a course application.
///
/// `Pending` may move to `Approved` or `Rejected`; both of those are
/// terminal. Stored as lowercase text; [`ApplicationStatus::parse`] is the
/// only conversion back from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<ApplicationStatus> {
        match s {
            "pending" => Some(ApplicationStatus::Pending),
            "approved" => Some(ApplicationStatus::Approved),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    /// Whether the state machine allows leaving this status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }
}

/// A listener's request to enroll in a course. At most one exists per
/// (listener, course) pair.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseApplication {
    pub id: i64,
    pub listener_id: i64,
    pub course_id: i64,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCourseApplication {
    pub listener_id: i64,
    pub course_id: i64,
    pub status: ApplicationStatus,
}

/// Lesson/test counts for a course; the only course content the enrollment
/// workflow reads.
#[derive(Debug, Clone, Copy)]
pub struct CourseTotals {
    pub total_lessons: i64,
    pub total_tests: i64,
}

/// Per-(listener, course) completion counters.
///
/// Created exactly once, when the matching application enters `Approved`;
/// mutated only through the enrollment workflow.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProgressStat {
    pub listener_id: i64,
    pub course_id: i64,
    pub lessons_completed: i32,
    pub tests_passed: i32,
    pub progress_percent: f64,
}

impl ProgressStat {
    pub fn zeroed(listener_id: i64, course_id: i64) -> Self {
        Self {
            listener_id,
            course_id,
            lessons_completed: 0,
            tests_passed: 0,
            progress_percent: 0.0,
        }
    }

    /// Recomputes the percentage as two halves, lessons and tests. A course
    /// with no lessons (or no tests) contributes 0 for that half rather
    /// than dividing by zero.
    pub fn recompute(&mut self, totals: &CourseTotals) {
        let lessons_half = if totals.total_lessons > 0 {
            50.0 * f64::from(self.lessons_completed) / totals.total_lessons as f64
        } else {
            0.0
        };
        let tests_half = if totals.total_tests > 0 {
            50.0 * f64::from(self.tests_passed) / totals.total_tests as f64
        } else {
            0.0
        };
        self.progress_percent = lessons_half + tests_half;
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ApplyRequest {
    #[validate(range(min = 1))]
    pub course_id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStatusRequest {
    pub status: ApplicationStatus,
}

/// Outcome of a successful application: the stored record plus the progress
/// counters created alongside it.
#[derive(Debug, Serialize, ToSchema)]
pub struct EnrollmentResponse {
    pub application: CourseApplication,
    pub progress: ProgressStat,
}
