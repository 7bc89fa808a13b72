//! services/api/src/auth/session.rs
//!
//! The Session Cache: the serialized user record stored under the user's id.
//! A request bearing a valid access token is only authenticated while this
//! entry exists.

use coursehub_core::{PortResult, User};
use std::time::Duration;
use uuid::Uuid;

use crate::cache::JsonCache;

#[derive(Clone)]
pub struct SessionStore {
    cache: JsonCache,
    /// Matches the refresh token lifetime, so a session cannot outlive the last
    /// token able to renew it.
    ttl: Duration,
}

impl SessionStore {
    pub fn new(cache: JsonCache, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Creates or replaces the session of `user`.
    pub async fn create_session(&self, user: &User) -> PortResult<()> {
        self.cache
            .set_json(&user.id.to_string(), user, Some(self.ttl))
            .await
    }

    pub async fn get_session(&self, user_id: Uuid) -> PortResult<Option<User>> {
        self.cache.get_json(&user_id.to_string()).await
    }

    /// Idempotent: destroying an absent session succeeds.
    pub async fn destroy_session(&self, user_id: Uuid) -> PortResult<()> {
        self.cache.delete(&user_id.to_string()).await
    }
}
