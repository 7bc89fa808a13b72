//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-request identity context.

use coursehub_core::ports::{CacheService, CourseStore, EmailService, ImageHost, UserStore};
use coursehub_core::User;
use std::sync::Arc;

use crate::auth::{SessionStore, TokenService};
use crate::cache::JsonCache;
use crate::config::Config;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
/// Every external collaborator is injected here; nothing is global.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub courses: Arc<dyn CourseStore>,
    pub cache: JsonCache,
    pub sessions: SessionStore,
    pub tokens: Arc<TokenService>,
    pub mailer: Arc<dyn EmailService>,
    pub images: Arc<dyn ImageHost>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        users: Arc<dyn UserStore>,
        courses: Arc<dyn CourseStore>,
        cache: Arc<dyn CacheService>,
        mailer: Arc<dyn EmailService>,
        images: Arc<dyn ImageHost>,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(&config.tokens));
        let cache = JsonCache::new(cache);
        let sessions = SessionStore::new(cache.clone(), tokens.refresh_ttl());
        Self {
            users,
            courses,
            cache,
            sessions,
            tokens,
            mailer,
            images,
            config,
        }
    }
}

//=========================================================================================
// AuthUser (Specific to One Request)
//=========================================================================================

/// The identity resolved by the auth middleware from the session cache.
/// Inserted into the request extensions and read by handlers; never mutated.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// The token pair issued while rotating a session inside the current request.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
}
