//! crates/coursehub_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the document store, the cache, the mail relay and the
//! image host.

use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::{Course, ImageRef, NewUser, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Duplicate value: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Ports
//=========================================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new account. Fails with `Conflict` when the email is taken.
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_credentials_by_id(&self, user_id: Uuid) -> PortResult<UserCredentials>;

    async fn email_exists(&self, email: &str) -> PortResult<bool>;

    /// Overwrites the profile fields of an existing user and returns the stored record.
    async fn update_user(&self, user: &User) -> PortResult<User>;

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()>;
}

#[async_trait]
pub trait CourseStore: Send + Sync {
    async fn create_course(&self, course: &Course) -> PortResult<()>;

    async fn get_course_by_id(&self, course_id: Uuid) -> PortResult<Course>;

    async fn list_courses(&self) -> PortResult<Vec<Course>>;

    /// Rewrites the whole aggregate. Last write wins.
    async fn save_course(&self, course: &Course) -> PortResult<()>;
}

//=========================================================================================
// Cache Port
//=========================================================================================

#[async_trait]
pub trait CacheService: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    /// Stores `value` under `key`. `None` means the entry never expires.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> PortResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> PortResult<()>;
}

//=========================================================================================
// Notification and Media Ports
//=========================================================================================

/// The transactional emails the platform sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailTemplate {
    Activation { name: String, activation_code: String },
    QuestionReply { name: String, title: String },
}

impl EmailTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            EmailTemplate::Activation { .. } => "activation-mail",
            EmailTemplate::QuestionReply { .. } => "question-reply",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub template: EmailTemplate,
}

#[async_trait]
pub trait EmailService: Send + Sync {
    /// Renders the template and delivers it. Delivery errors propagate.
    async fn send_email(&self, message: &EmailMessage) -> PortResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub folder: String,
    pub width: Option<u32>,
}

impl UploadOptions {
    pub fn folder(folder: &str) -> Self {
        Self {
            folder: folder.to_string(),
            width: None,
        }
    }
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Uploads a base64 / data-URI encoded image.
    async fn upload_image(&self, image: &str, options: &UploadOptions) -> PortResult<ImageRef>;

    async fn destroy_image(&self, public_id: &str) -> PortResult<()>;
}
