//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `UserStore` and `CourseStore` ports from the `core` crate. It handles all
//! interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coursehub_core::domain::{EnrolledCourse, ImageRef, DEFAULT_ROLE};
use coursehub_core::ports::{CourseStore, PortError, PortResult, UserStore};
use coursehub_core::{Course, NewUser, User, UserCredentials};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, avatar, role, is_verified, courses, created_at, updated_at";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the persistence ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Closes every pooled connection. Called once on shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Rewrites driver errors into the port taxonomy. A unique violation can only come
/// from the email index.
fn map_err(e: sqlx::Error, what: impl FnOnce() -> String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what()),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict("email".to_string())
        }
        other => PortError::Unexpected(other.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    password_hash: Option<String>,
    avatar: Option<Json<ImageRef>>,
    role: String,
    is_verified: bool,
    courses: Json<Vec<EnrolledCourse>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRecord {
    fn to_credentials(self) -> UserCredentials {
        UserCredentials {
            hashed_password: self.password_hash,
            user: User {
                id: self.id,
                name: self.name,
                email: self.email,
                avatar: self.avatar.map(|a| a.0),
                role: self.role,
                is_verified: self.is_verified,
                courses: self.courses.0,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        }
    }

    fn to_domain(self) -> User {
        self.to_credentials().user
    }
}

#[derive(FromRow)]
struct CourseRecord {
    data: Json<Course>,
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for DbAdapter {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (id, name, email, password_hash, avatar, role, is_verified) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.hashed_password)
        .bind(new_user.avatar.map(Json))
        .bind(DEFAULT_ROLE)
        .bind(new_user.is_verified)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err(e, || "user".to_string()))?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        Ok(self.get_credentials_by_id(user_id).await?.user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err(e, || format!("User with email {} not found", email)))?;
        Ok(record.to_credentials())
    }

    async fn get_credentials_by_id(&self, user_id: Uuid) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err(e, || format!("User {} not found", user_id)))?;
        Ok(record.to_credentials())
    }

    async fn email_exists(&self, email: &str) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn update_user(&self, user: &User) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET name = $2, email = $3, avatar = $4, role = $5, is_verified = $6, \
             courses = $7, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.avatar.clone().map(Json))
        .bind(&user.role)
        .bind(user.is_verified)
        .bind(Json(&user.courses))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err(e, || format!("User {} not found", user.id)))?;
        Ok(record.to_domain())
    }

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(user_id)
                .bind(hashed_password)
                .execute(&self.pool)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }
}

//=========================================================================================
// `CourseStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CourseStore for DbAdapter {
    async fn create_course(&self, course: &Course) -> PortResult<()> {
        sqlx::query("INSERT INTO courses (id, data, created_at, updated_at) VALUES ($1, $2, $3, $4)")
            .bind(course.id)
            .bind(Json(course))
            .bind(course.created_at)
            .bind(course.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn get_course_by_id(&self, course_id: Uuid) -> PortResult<Course> {
        let record = sqlx::query_as::<_, CourseRecord>("SELECT data FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_err(e, || format!("Course {} not found", course_id)))?;
        Ok(record.data.0)
    }

    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        let records =
            sqlx::query_as::<_, CourseRecord>("SELECT data FROM courses ORDER BY created_at ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.data.0).collect())
    }

    async fn save_course(&self, course: &Course) -> PortResult<()> {
        let result =
            sqlx::query("UPDATE courses SET data = $2, updated_at = $3 WHERE id = $1")
                .bind(course.id)
                .bind(Json(course))
                .bind(course.updated_at)
                .execute(&self.pool)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Course {} not found", course.id)));
        }
        Ok(())
    }
}
