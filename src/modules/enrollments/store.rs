//! Persistence boundaries for the enrollment workflow.
//!
//! Three collaborator seams: [`CourseStore`] exposes the two facts this core
//! needs about courses (owner and lesson/test counts; course CRUD itself
//! lives elsewhere), [`CourseApplicationStore`] holds the application state
//! machine records and [`ProgressStatStore`] the completion counters. The
//! (listener_id, course_id) uniqueness of applications is enforced here,
//! atomically, because concurrent apply calls for the same pair must not
//! both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::utils::errors::AppError;

use super::model::{
    ApplicationStatus, CourseApplication, CourseTotals, NewCourseApplication, ProgressStat,
};

#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Resolves the owning specialist of a course, `None` if the course
    /// does not exist.
    async fn find_owner(&self, course_id: i64) -> Result<Option<i64>, AppError>;

    /// Lesson and test counts for a course, `None` if the course does not
    /// exist.
    async fn totals(&self, course_id: i64) -> Result<Option<CourseTotals>, AppError>;
}

#[async_trait]
pub trait CourseApplicationStore: Send + Sync {
    async fn find_by_pair(
        &self,
        listener_id: i64,
        course_id: i64,
    ) -> Result<Option<CourseApplication>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<CourseApplication>, AppError>;

    /// Atomic check-and-insert. Returns `Conflict` if an application for
    /// the pair already exists.
    async fn insert(&self, new: NewCourseApplication) -> Result<CourseApplication, AppError>;

    async fn update_status(
        &self,
        id: i64,
        status: ApplicationStatus,
    ) -> Result<CourseApplication, AppError>;

    async fn list_for_listener(&self, listener_id: i64)
    -> Result<Vec<CourseApplication>, AppError>;

    async fn list_for_course(&self, course_id: i64) -> Result<Vec<CourseApplication>, AppError>;
}

#[async_trait]
pub trait ProgressStatStore: Send + Sync {
    async fn find_by_pair(
        &self,
        listener_id: i64,
        course_id: i64,
    ) -> Result<Option<ProgressStat>, AppError>;

    /// Creates a zeroed stat for the pair if none exists yet and returns
    /// the stored row either way. Approving an already-approved
    /// application must not duplicate counters.
    async fn create_if_absent(
        &self,
        listener_id: i64,
        course_id: i64,
    ) -> Result<ProgressStat, AppError>;

    async fn save(&self, stat: &ProgressStat) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgCourseStore {
    pool: PgPool,
}

impl PgCourseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseStore for PgCourseStore {
    async fn find_owner(&self, course_id: i64) -> Result<Option<i64>, AppError> {
        let owner = sqlx::query_scalar::<_, i64>("SELECT specialist_id FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    async fn totals(&self, course_id: i64) -> Result<Option<CourseTotals>, AppError> {
        let row = sqlx::query_as::<_, (i64, i64)>(
            "SELECT \
                 (SELECT COUNT(*) FROM lessons l WHERE l.course_id = c.id), \
                 (SELECT COUNT(*) FROM course_tests t WHERE t.course_id = c.id) \
             FROM courses c WHERE c.id = $1",
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(total_lessons, total_tests)| CourseTotals {
            total_lessons,
            total_tests,
        }))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ApplicationRow {
    id: i64,
    listener_id: i64,
    course_id: i64,
    status: String,
    applied_at: DateTime<Utc>,
}

impl ApplicationRow {
    fn into_application(self) -> Result<CourseApplication, AppError> {
        let status = ApplicationStatus::parse(&self.status).ok_or_else(|| {
            AppError::internal(anyhow::anyhow!(
                "Unknown application status in storage: {}",
                self.status
            ))
        })?;
        Ok(CourseApplication {
            id: self.id,
            listener_id: self.listener_id,
            course_id: self.course_id,
            status,
            applied_at: self.applied_at,
        })
    }
}

const APPLICATION_COLUMNS: &str = "id, listener_id, course_id, status, applied_at";

#[derive(Clone)]
pub struct PgCourseApplicationStore {
    pool: PgPool,
}

impl PgCourseApplicationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseApplicationStore for PgCourseApplicationStore {
    async fn find_by_pair(
        &self,
        listener_id: i64,
        course_id: i64,
    ) -> Result<Option<CourseApplication>, AppError> {
        let query = format!(
            "SELECT {APPLICATION_COLUMNS} FROM course_applications \
             WHERE listener_id = $1 AND course_id = $2"
        );
        let row = sqlx::query_as::<_, ApplicationRow>(&query)
            .bind(listener_id)
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ApplicationRow::into_application).transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CourseApplication>, AppError> {
        let query = format!("SELECT {APPLICATION_COLUMNS} FROM course_applications WHERE id = $1");
        let row = sqlx::query_as::<_, ApplicationRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ApplicationRow::into_application).transpose()
    }

    async fn insert(&self, new: NewCourseApplication) -> Result<CourseApplication, AppError> {
        let query = format!(
            "INSERT INTO course_applications (listener_id, course_id, status) \
             VALUES ($1, $2, $3) RETURNING {APPLICATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ApplicationRow>(&query)
            .bind(new.listener_id)
            .bind(new.course_id)
            .bind(new.status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::conflict("An application for this course already exists");
                    }
                }
                AppError::database(e)
            })?;
        row.into_application()
    }

    async fn update_status(
        &self,
        id: i64,
        status: ApplicationStatus,
    ) -> Result<CourseApplication, AppError> {
        let query = format!(
            "UPDATE course_applications SET status = $2 WHERE id = $1 \
             RETURNING {APPLICATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ApplicationRow>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Application not found"))?;
        row.into_application()
    }

    async fn list_for_listener(
        &self,
        listener_id: i64,
    ) -> Result<Vec<CourseApplication>, AppError> {
        let query = format!(
            "SELECT {APPLICATION_COLUMNS} FROM course_applications \
             WHERE listener_id = $1 ORDER BY applied_at DESC"
        );
        let rows = sqlx::query_as::<_, ApplicationRow>(&query)
            .bind(listener_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(ApplicationRow::into_application)
            .collect()
    }

    async fn list_for_course(&self, course_id: i64) -> Result<Vec<CourseApplication>, AppError> {
        let query = format!(
            "SELECT {APPLICATION_COLUMNS} FROM course_applications \
             WHERE course_id = $1 ORDER BY applied_at DESC"
        );
        let rows = sqlx::query_as::<_, ApplicationRow>(&query)
            .bind(course_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(ApplicationRow::into_application)
            .collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProgressRow {
    listener_id: i64,
    course_id: i64,
    lessons_completed: i32,
    tests_passed: i32,
    progress_percent: f64,
}

impl From<ProgressRow> for ProgressStat {
    fn from(row: ProgressRow) -> Self {
        ProgressStat {
            listener_id: row.listener_id,
            course_id: row.course_id,
            lessons_completed: row.lessons_completed,
            tests_passed: row.tests_passed,
            progress_percent: row.progress_percent,
        }
    }
}

const PROGRESS_COLUMNS: &str =
    "listener_id, course_id, lessons_completed, tests_passed, progress_percent";

#[derive(Clone)]
pub struct PgProgressStatStore {
    pool: PgPool,
}

impl PgProgressStatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgressStatStore for PgProgressStatStore {
    async fn find_by_pair(
        &self,
        listener_id: i64,
        course_id: i64,
    ) -> Result<Option<ProgressStat>, AppError> {
        let query = format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress_stats \
             WHERE listener_id = $1 AND course_id = $2"
        );
        let row = sqlx::query_as::<_, ProgressRow>(&query)
            .bind(listener_id)
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ProgressStat::from))
    }

    async fn create_if_absent(
        &self,
        listener_id: i64,
        course_id: i64,
    ) -> Result<ProgressStat, AppError> {
        let query = format!(
            "INSERT INTO progress_stats (listener_id, course_id) VALUES ($1, $2) \
             ON CONFLICT (listener_id, course_id) DO NOTHING \
             RETURNING {PROGRESS_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, ProgressRow>(&query)
            .bind(listener_id)
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await?;

        match inserted {
            Some(row) => Ok(row.into()),
            // Lost the race or already created; read the existing row.
            None => self
                .find_by_pair(listener_id, course_id)
                .await?
                .ok_or_else(|| {
                    AppError::internal(anyhow::anyhow!("Progress row vanished after insert"))
                }),
        }
    }

    async fn save(&self, stat: &ProgressStat) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE progress_stats \
             SET lessons_completed = $3, tests_passed = $4, progress_percent = $5 \
             WHERE listener_id = $1 AND course_id = $2",
        )
        .bind(stat.listener_id)
        .bind(stat.course_id)
        .bind(stat.lessons_completed)
        .bind(stat.tests_passed)
        .bind(stat.progress_percent)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
