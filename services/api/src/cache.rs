//! services/api/src/cache.rs
//!
//! Typed JSON access on top of the key-value cache port, plus the course read
//! cache keys.

use coursehub_core::{CacheService, PortError, PortResult};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Key holding the preview list of every course.
pub const ALL_COURSES_KEY: &str = "allCourses";

pub fn course_key(course_id: Uuid) -> String {
    course_id.to_string()
}

/// Stores values as JSON strings under plain keys.
#[derive(Clone)]
pub struct JsonCache {
    inner: Arc<dyn CacheService>,
}

impl JsonCache {
    pub fn new(inner: Arc<dyn CacheService>) -> Self {
        Self { inner }
    }

    /// Returns `None` for a missing key. A value that no longer deserializes is
    /// treated as missing so the caller refetches it.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> PortResult<Option<T>> {
        let Some(raw) = self.inner.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("Discarding unreadable cache entry {}: {}", key, e);
                Ok(None)
            }
        }
    }

    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> PortResult<()> {
        let raw = serde_json::to_string(value).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.inner.set(key, &raw, ttl).await
    }

    pub async fn delete(&self, key: &str) -> PortResult<()> {
        self.inner.delete(key).await
    }

    /// Drops the course list and the single-course entry after a catalog write.
    pub async fn invalidate_course(&self, course_id: Uuid) -> PortResult<()> {
        self.inner.delete(ALL_COURSES_KEY).await?;
        self.inner.delete(&course_key(course_id)).await
    }
}
