use std::sync::Arc;

use crate::config::database::init_db_pool;
use crate::config::jwt::JwtConfig;
use crate::modules::enrollments::store::{
    CourseApplicationStore, CourseStore, PgCourseApplicationStore, PgCourseStore,
    PgProgressStatStore, ProgressStatStore,
};
use crate::modules::identity::store::{IdentityStore, PgIdentityStore};

/// Shared application state.
///
/// Stores are held behind their trait seams so handlers and services never
/// depend on a concrete backend; production wires the Postgres
/// implementations, tests wire the in-memory ones. The JWT config is
/// read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub identities: Arc<dyn IdentityStore>,
    pub courses: Arc<dyn CourseStore>,
    pub applications: Arc<dyn CourseApplicationStore>,
    pub progress: Arc<dyn ProgressStatStore>,
    pub jwt_config: JwtConfig,
}

pub async fn init_app_state() -> AppState {
    let pool = init_db_pool().await;

    AppState {
        identities: Arc::new(PgIdentityStore::new(pool.clone())),
        courses: Arc::new(PgCourseStore::new(pool.clone())),
        applications: Arc::new(PgCourseApplicationStore::new(pool.clone())),
        progress: Arc::new(PgProgressStatStore::new(pool)),
        jwt_config: JwtConfig::from_env(),
    }
}
