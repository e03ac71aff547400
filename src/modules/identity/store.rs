//! Identity persistence boundary.
//!
//! The rest of the crate only sees the [`IdentityStore`] trait; the Postgres
//! implementation lives here and an in-memory implementation for tests lives
//! in [`crate::testing`]. Identities come in two disjoint kinds (listeners
//! and specialists) stored in separate tables.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::modules::identity::model::{Identity, NewIdentity, Role};
use crate::utils::errors::AppError;

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Resolves an identity by email, checking both kinds.
    ///
    /// Emails are unique across kinds, so the lookup order does not affect
    /// the result; listeners are checked first to keep it deterministic.
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AppError>;

    /// Resolves an identity by id within one kind. Ids are per-kind
    /// sequences, so the role is part of the key.
    async fn find_by_id(&self, id: i64, role: Role) -> Result<Option<Identity>, AppError>;

    /// Inserts a new identity. Returns `Conflict` if the email is already
    /// taken within the target kind.
    async fn insert(&self, new: NewIdentity) -> Result<Identity, AppError>;
}

#[derive(Debug, sqlx::FromRow)]
struct IdentityRow {
    id: i64,
    email: String,
    password_hash: String,
}

impl IdentityRow {
    fn into_identity(self, role: Role) -> Identity {
        Identity {
            id: self.id,
            role,
            email: self.email,
            password_hash: self.password_hash,
        }
    }
}

fn table_for(role: Role) -> &'static str {
    match role {
        Role::Listener => "listeners",
        Role::Specialist => "specialists",
    }
}

#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_in_kind(&self, email: &str, role: Role) -> Result<Option<Identity>, AppError> {
        let query = format!(
            "SELECT id, email, password_hash FROM {} WHERE email = $1",
            table_for(role)
        );
        let row = sqlx::query_as::<_, IdentityRow>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_identity(role)))
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AppError> {
        if let Some(identity) = self.find_in_kind(email, Role::Listener).await? {
            return Ok(Some(identity));
        }
        self.find_in_kind(email, Role::Specialist).await
    }

    async fn find_by_id(&self, id: i64, role: Role) -> Result<Option<Identity>, AppError> {
        let query = format!(
            "SELECT id, email, password_hash FROM {} WHERE id = $1",
            table_for(role)
        );
        let row = sqlx::query_as::<_, IdentityRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_identity(role)))
    }

    async fn insert(&self, new: NewIdentity) -> Result<Identity, AppError> {
        let query = format!(
            "INSERT INTO {} (email, password_hash) VALUES ($1, $2) \
             RETURNING id, email, password_hash",
            table_for(new.role)
        );
        let row = sqlx::query_as::<_, IdentityRow>(&query)
            .bind(&new.email)
            .bind(&new.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::conflict("Email is already registered");
                    }
                }
                AppError::database(e)
            })?;

        Ok(row.into_identity(new.role))
    }
}
