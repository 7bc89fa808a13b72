//! Shared test harness: in-memory implementations of every port and a helper
//! that drives the real router with `oneshot`.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use coursehub_api::config::{CloudinaryConfig, Config, SmtpConfig, TokenConfig};
use coursehub_api::web::{self, AppState};
use coursehub_core::domain::{ContentDraft, CourseDraft, EnrolledCourse, ImageRef, DEFAULT_ROLE};
use coursehub_core::ports::{
    CacheService, CourseStore, EmailMessage, EmailService, ImageHost, PortError, PortResult,
    UploadOptions, UserStore,
};
use coursehub_core::{Course, NewUser, User, UserCredentials};
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

//=========================================================================================
// In-memory ports
//=========================================================================================

#[derive(Default)]
pub struct MemoryUsers {
    users: Mutex<HashMap<Uuid, UserCredentials>>,
}

impl MemoryUsers {
    pub fn count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn find_by_email(&self, email: &str) -> Option<UserCredentials> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|c| c.user.email == email)
            .cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUsers {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|c| c.user.email == new_user.email) {
            return Err(PortError::Conflict("email".into()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            avatar: new_user.avatar,
            role: DEFAULT_ROLE.to_string(),
            is_verified: new_user.is_verified,
            courses: vec![],
            created_at: now,
            updated_at: now,
        };
        users.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                hashed_password: new_user.hashed_password,
            },
        );
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        Ok(self.get_credentials_by_id(user_id).await?.user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.find_by_email(email)
            .ok_or_else(|| PortError::NotFound(format!("User with email {email} not found")))
    }

    async fn get_credentials_by_id(&self, user_id: Uuid) -> PortResult<UserCredentials> {
        self.users
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {user_id} not found")))
    }

    async fn email_exists(&self, email: &str) -> PortResult<bool> {
        Ok(self.find_by_email(email).is_some())
    }

    async fn update_user(&self, user: &User) -> PortResult<User> {
        let mut users = self.users.lock().unwrap();
        let entry = users
            .get_mut(&user.id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user.id)))?;
        entry.user = User {
            updated_at: Utc::now(),
            ..user.clone()
        };
        Ok(entry.user.clone())
    }

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()> {
        let mut users = self.users.lock().unwrap();
        let entry = users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {user_id} not found")))?;
        entry.hashed_password = Some(hashed_password.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCourses {
    courses: Mutex<HashMap<Uuid, Course>>,
    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
}

impl MemoryCourses {
    pub fn get(&self, id: Uuid) -> Course {
        self.courses.lock().unwrap()[&id].clone()
    }
}

#[async_trait]
impl CourseStore for MemoryCourses {
    async fn create_course(&self, course: &Course) -> PortResult<()> {
        self.courses.lock().unwrap().insert(course.id, course.clone());
        Ok(())
    }

    async fn get_course_by_id(&self, course_id: Uuid) -> PortResult<Course> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.courses
            .lock()
            .unwrap()
            .get(&course_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Course {course_id} not found")))
    }

    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.courses.lock().unwrap().values().cloned().collect())
    }

    async fn save_course(&self, course: &Course) -> PortResult<()> {
        let mut courses = self.courses.lock().unwrap();
        if !courses.contains_key(&course.id) {
            return Err(PortError::NotFound(format!("Course {} not found", course.id)));
        }
        courses.insert(course.id, course.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Option<Duration>)>>,
}

impl MemoryCache {
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries.lock().unwrap().get(key).and_then(|(_, ttl)| *ttl)
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).map(|(v, _)| v.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> PortResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> PortResult<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailService for RecordingMailer {
    async fn send_email(&self, message: &EmailMessage) -> PortResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("smtp unavailable".into()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeImageHost {
    pub uploads: Mutex<Vec<UploadOptions>>,
    pub destroyed: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageHost for FakeImageHost {
    async fn upload_image(&self, _image: &str, options: &UploadOptions) -> PortResult<ImageRef> {
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(options.clone());
        let public_id = format!("{}/img{}", options.folder, uploads.len());
        Ok(ImageRef {
            url: format!("https://images.example/{public_id}.png"),
            public_id,
        })
    }

    async fn destroy_image(&self, public_id: &str) -> PortResult<()> {
        self.destroyed.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

//=========================================================================================
// Test application
//=========================================================================================

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".into(),
        redis_url: "redis://unused".into(),
        log_level: tracing::Level::INFO,
        production: false,
        cors_origin: "http://localhost:3000".into(),
        tokens: TokenConfig {
            activation_secret: "activation-test-secret".into(),
            access_secret: "access-test-secret".into(),
            refresh_secret: "refresh-test-secret".into(),
            access_ttl_secs: 300,
            refresh_ttl_secs: 259_200,
        },
        smtp: SmtpConfig {
            host: "localhost".into(),
            port: 2525,
            username: "noreply@example.com".into(),
            password: String::new(),
        },
        cloudinary: CloudinaryConfig {
            cloud_name: "test".into(),
            api_key: "key".into(),
            api_secret: "secret".into(),
        },
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `Set-Cookie` headers folded into a `Cookie` request header value.
    pub fn cookie_header(&self) -> String {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn set_cookie_count(&self) -> usize {
        self.headers.get_all(header::SET_COOKIE).iter().count()
    }

    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub users: Arc<MemoryUsers>,
    pub courses: Arc<MemoryCourses>,
    pub cache: Arc<MemoryCache>,
    pub mailer: Arc<RecordingMailer>,
    pub images: Arc<FakeImageHost>,
}

impl TestApp {
    pub fn new() -> Self {
        let users = Arc::new(MemoryUsers::default());
        let courses = Arc::new(MemoryCourses::default());
        let cache = Arc::new(MemoryCache::default());
        let mailer = Arc::new(RecordingMailer::default());
        let images = Arc::new(FakeImageHost::default());
        let state = Arc::new(AppState::new(
            Arc::new(test_config()),
            users.clone(),
            courses.clone(),
            cache.clone(),
            mailer.clone(),
            images.clone(),
        ));
        Self {
            router: web::router(state.clone()),
            state,
            users,
            courses,
            cache,
            mailer,
            images,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookies: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookies) = cookies {
            builder = builder.header(header::COOKIE, cookies);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Creates a user straight in the store and opens a session for them.
    /// Returns the user and a `Cookie` header carrying both tokens.
    pub async fn seed_user(&self, name: &str, role: &str, password: Option<&str>) -> (User, String) {
        let hashed = password.map(|p| coursehub_api::auth::password::hash_password(p).unwrap());
        let mut user = self
            .users
            .create_user(NewUser {
                name: name.into(),
                email: format!("{}@example.com", name.to_lowercase()),
                hashed_password: hashed,
                avatar: None,
                is_verified: true,
            })
            .await
            .unwrap();
        if role != DEFAULT_ROLE {
            user.role = role.to_string();
            user = self.users.update_user(&user).await.unwrap();
        }
        let cookies = self.open_session(&user).await;
        (user, cookies)
    }

    pub async fn open_session(&self, user: &User) -> String {
        self.state.sessions.create_session(user).await.unwrap();
        let access = self.state.tokens.issue_access_token(user.id).unwrap();
        let refresh = self.state.tokens.issue_refresh_token(user.id).unwrap();
        format!("access_token={access}; refresh_token={refresh}")
    }

    /// Enrolls `user` in `course_id` and replaces their session.
    pub async fn enroll(&self, user: &User, course_id: Uuid) -> (User, String) {
        let mut user = user.clone();
        user.courses.push(EnrolledCourse { course_id });
        let user = self.users.update_user(&user).await.unwrap();
        let cookies = self.open_session(&user).await;
        (user, cookies)
    }

    /// Stores a course with one content item titled `Ownership`.
    pub async fn seed_course(&self) -> Course {
        let course = Course::from_draft(
            CourseDraft {
                name: "Rust from scratch".into(),
                description: "Learn Rust".into(),
                price: 29.0,
                estimated_price: Some(59.0),
                tags: "rust".into(),
                level: "Beginner".into(),
                demo_url: "https://demo.example/rust".into(),
                benefits: vec![],
                prerequisites: vec![],
                course_data: vec![ContentDraft {
                    id: None,
                    title: "Ownership".into(),
                    description: "Moves and borrows".into(),
                    video_url: "https://videos.example/v1".into(),
                    video_thumbnail: None,
                    video_section: "Basics".into(),
                    video_length: 14,
                    video_player: "vdocipher".into(),
                    links: vec![],
                    suggestion: "Rewatch the end".into(),
                }],
            },
            None,
        );
        self.courses.create_course(&course).await.unwrap();
        course
    }
}
