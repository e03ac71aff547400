//! In-memory store implementations.
//!
//! These implement the same traits as the Postgres stores using `HashMap`s
//! behind `tokio::sync::RwLock`, so the full router can be exercised in
//! tests without a database. Mutations take the write lock, which is what
//! makes the check-and-insert paths atomic within one process. Compiled for
//! tests only (the `test-utils` feature is enabled by the crate's own
//! dev-dependency).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::config::jwt::JwtConfig;
use crate::modules::enrollments::model::{
    ApplicationStatus, CourseApplication, CourseTotals, NewCourseApplication, ProgressStat,
};
use crate::modules::enrollments::store::{CourseApplicationStore, CourseStore, ProgressStatStore};
use crate::modules::identity::model::{Identity, NewIdentity, Role};
use crate::modules::identity::store::IdentityStore;
use crate::state::AppState;
use crate::utils::errors::AppError;

#[derive(Default)]
struct IdentityInner {
    listeners: HashMap<i64, Identity>,
    specialists: HashMap<i64, Identity>,
    next_listener_id: i64,
    next_specialist_id: i64,
}

#[derive(Default)]
pub struct MemoryIdentityStore {
    inner: RwLock<IdentityInner>,
}

impl IdentityInner {
    fn kind(&self, role: Role) -> &HashMap<i64, Identity> {
        match role {
            Role::Listener => &self.listeners,
            Role::Specialist => &self.specialists,
        }
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AppError> {
        let inner = self.inner.read().await;
        // Listeners first, matching the Postgres store's lookup order.
        for role in [Role::Listener, Role::Specialist] {
            if let Some(identity) = inner.kind(role).values().find(|i| i.email == email) {
                return Ok(Some(identity.clone()));
            }
        }
        Ok(None)
    }

    async fn find_by_id(&self, id: i64, role: Role) -> Result<Option<Identity>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.kind(role).get(&id).cloned())
    }

    async fn insert(&self, new: NewIdentity) -> Result<Identity, AppError> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        if inner.kind(new.role).values().any(|i| i.email == new.email) {
            return Err(AppError::conflict("Email is already registered"));
        }

        let (map, next_id) = match new.role {
            Role::Listener => (&mut inner.listeners, &mut inner.next_listener_id),
            Role::Specialist => (&mut inner.specialists, &mut inner.next_specialist_id),
        };
        *next_id += 1;
        let identity = Identity {
            id: *next_id,
            role: new.role,
            email: new.email,
            password_hash: new.password_hash,
        };
        map.insert(identity.id, identity.clone());
        Ok(identity)
    }
}

#[derive(Debug, Clone, Copy)]
struct MemoryCourse {
    specialist_id: i64,
    total_lessons: i64,
    total_tests: i64,
}

#[derive(Default)]
struct CourseInner {
    courses: HashMap<i64, MemoryCourse>,
    next_id: i64,
}

#[derive(Default)]
pub struct MemoryCourseStore {
    inner: RwLock<CourseInner>,
}

impl MemoryCourseStore {
    /// Seeds a course and returns its id.
    pub async fn add_course(
        &self,
        specialist_id: i64,
        total_lessons: i64,
        total_tests: i64,
    ) -> i64 {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = inner.next_id;
        inner.courses.insert(
            id,
            MemoryCourse {
                specialist_id,
                total_lessons,
                total_tests,
            },
        );
        id
    }
}

#[async_trait]
impl CourseStore for MemoryCourseStore {
    async fn find_owner(&self, course_id: i64) -> Result<Option<i64>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.courses.get(&course_id).map(|c| c.specialist_id))
    }

    async fn totals(&self, course_id: i64) -> Result<Option<CourseTotals>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.courses.get(&course_id).map(|c| CourseTotals {
            total_lessons: c.total_lessons,
            total_tests: c.total_tests,
        }))
    }
}

#[derive(Default)]
struct ApplicationInner {
    applications: HashMap<i64, CourseApplication>,
    next_id: i64,
}

#[derive(Default)]
pub struct MemoryCourseApplicationStore {
    inner: RwLock<ApplicationInner>,
}

#[async_trait]
impl CourseApplicationStore for MemoryCourseApplicationStore {
    async fn find_by_pair(
        &self,
        listener_id: i64,
        course_id: i64,
    ) -> Result<Option<CourseApplication>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .applications
            .values()
            .find(|a| a.listener_id == listener_id && a.course_id == course_id)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CourseApplication>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.applications.get(&id).cloned())
    }

    async fn insert(&self, new: NewCourseApplication) -> Result<CourseApplication, AppError> {
        // Check and insert under one write lock, so concurrent applies for
        // the same pair cannot both succeed.
        let mut inner = self.inner.write().await;
        if inner
            .applications
            .values()
            .any(|a| a.listener_id == new.listener_id && a.course_id == new.course_id)
        {
            return Err(AppError::conflict(
                "An application for this course already exists",
            ));
        }

        inner.next_id += 1;
        let application = CourseApplication {
            id: inner.next_id,
            listener_id: new.listener_id,
            course_id: new.course_id,
            status: new.status,
            applied_at: Utc::now(),
        };
        inner
            .applications
            .insert(application.id, application.clone());
        Ok(application)
    }

    async fn update_status(
        &self,
        id: i64,
        status: ApplicationStatus,
    ) -> Result<CourseApplication, AppError> {
        let mut inner = self.inner.write().await;
        let application = inner
            .applications
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Application not found"))?;
        application.status = status;
        Ok(application.clone())
    }

    async fn list_for_listener(
        &self,
        listener_id: i64,
    ) -> Result<Vec<CourseApplication>, AppError> {
        let inner = self.inner.read().await;
        let mut applications: Vec<_> = inner
            .applications
            .values()
            .filter(|a| a.listener_id == listener_id)
            .cloned()
            .collect();
        applications.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        Ok(applications)
    }

    async fn list_for_course(&self, course_id: i64) -> Result<Vec<CourseApplication>, AppError> {
        let inner = self.inner.read().await;
        let mut applications: Vec<_> = inner
            .applications
            .values()
            .filter(|a| a.course_id == course_id)
            .cloned()
            .collect();
        applications.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        Ok(applications)
    }
}

#[derive(Default)]
pub struct MemoryProgressStatStore {
    inner: RwLock<HashMap<(i64, i64), ProgressStat>>,
}

#[async_trait]
impl ProgressStatStore for MemoryProgressStatStore {
    async fn find_by_pair(
        &self,
        listener_id: i64,
        course_id: i64,
    ) -> Result<Option<ProgressStat>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.get(&(listener_id, course_id)).cloned())
    }

    async fn create_if_absent(
        &self,
        listener_id: i64,
        course_id: i64,
    ) -> Result<ProgressStat, AppError> {
        let mut inner = self.inner.write().await;
        let stat = inner
            .entry((listener_id, course_id))
            .or_insert_with(|| ProgressStat::zeroed(listener_id, course_id));
        Ok(stat.clone())
    }

    async fn save(&self, stat: &ProgressStat) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner.insert((stat.listener_id, stat.course_id), stat.clone());
        Ok(())
    }
}

/// Concrete handles to the stores inside a test [`AppState`], for seeding
/// data that has no API surface in this crate (courses, pending
/// applications).
pub struct TestStores {
    pub identities: Arc<MemoryIdentityStore>,
    pub courses: Arc<MemoryCourseStore>,
    pub applications: Arc<MemoryCourseApplicationStore>,
    pub progress: Arc<MemoryProgressStatStore>,
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret-key-at-least-32-characters-long".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604800,
    }
}

/// Builds an [`AppState`] backed entirely by in-memory stores.
pub fn test_app_state() -> (AppState, TestStores) {
    let identities = Arc::new(MemoryIdentityStore::default());
    let courses = Arc::new(MemoryCourseStore::default());
    let applications = Arc::new(MemoryCourseApplicationStore::default());
    let progress = Arc::new(MemoryProgressStatStore::default());

    let state = AppState {
        identities: identities.clone(),
        courses: courses.clone(),
        applications: applications.clone(),
        progress: progress.clone(),
        jwt_config: test_jwt_config(),
    };

    (
        state,
        TestStores {
            identities,
            courses,
            applications,
            progress,
        },
    )
}
