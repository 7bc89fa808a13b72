//! crates/coursehub_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database; they carry `serde` derives
//! because the Course aggregate and the session record are persisted and
//! cached as JSON documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role assigned to every newly created account.
pub const DEFAULT_ROLE: &str = "User";
/// Role allowed to create and edit courses.
pub const ADMIN_ROLE: &str = "admin";

/// A reference to an image stored on the external image host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub public_id: String,
    pub url: String,
}

//=========================================================================================
// Users
//=========================================================================================

/// A course the user has access to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourse {
    pub course_id: Uuid,
}

/// Represents a user - used throughout the app, cached as the session value.
/// Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<ImageRef>,
    pub role: String,
    pub is_verified: bool,
    pub courses: Vec<EnrolledCourse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_enrolled_in(&self, course_id: Uuid) -> bool {
        self.courses.iter().any(|c| c.course_id == course_id)
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|r| *r == self.role)
    }
}

// Only used internally for login and password changes - contains sensitive data.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    /// `None` for accounts created through social login.
    pub hashed_password: Option<String>,
}

/// Data needed to persist a brand new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub hashed_password: Option<String>,
    pub avatar: Option<ImageRef>,
    pub is_verified: bool,
}

//=========================================================================================
// Courses
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleEntry {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub title: String,
    pub url: String,
}

/// One reply inside a question's thread. Replies are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: Uuid,
    pub user: User,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub user: User,
    pub question: String,
    pub question_replies: Vec<Reply>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub user: User,
    pub rating: f64,
    pub comment: String,
}

/// A single video of a course, together with its discussion thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub video_thumbnail: Option<ImageRef>,
    pub video_section: String,
    pub video_length: u32,
    pub video_player: String,
    pub links: Vec<Link>,
    pub suggestion: String,
    pub questions: Vec<Question>,
}

/// The Course aggregate. Persisted and rewritten as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub estimated_price: Option<f64>,
    pub thumbnail: Option<ImageRef>,
    pub tags: String,
    pub level: String,
    pub demo_url: String,
    pub benefits: Vec<TitleEntry>,
    pub prerequisites: Vec<TitleEntry>,
    pub reviews: Vec<Review>,
    pub ratings: f64,
    pub purchased: u32,
    pub course_data: Vec<ContentItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//=========================================================================================
// Course input and projections
//=========================================================================================

/// A content item as submitted by an admin. An `id` that matches an existing
/// item on edit keeps that item's questions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDraft {
    pub id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub video_url: String,
    #[serde(default)]
    pub video_thumbnail: Option<ImageRef>,
    #[serde(default)]
    pub video_section: String,
    #[serde(default)]
    pub video_length: u32,
    #[serde(default)]
    pub video_player: String,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub suggestion: String,
}

impl ContentDraft {
    fn into_item(self, questions: Vec<Question>) -> ContentItem {
        ContentItem {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            title: self.title,
            description: self.description,
            video_url: self.video_url,
            video_thumbnail: self.video_thumbnail,
            video_section: self.video_section,
            video_length: self.video_length,
            video_player: self.video_player,
            links: self.links,
            suggestion: self.suggestion,
            questions,
        }
    }
}

/// The fields required to create a course. The thumbnail is handled separately
/// because it arrives as raw image data and must go through the image host.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDraft {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub estimated_price: Option<f64>,
    pub tags: String,
    pub level: String,
    pub demo_url: String,
    #[serde(default, alias = "benifits")]
    pub benefits: Vec<TitleEntry>,
    #[serde(default)]
    pub prerequisites: Vec<TitleEntry>,
    #[serde(default)]
    pub course_data: Vec<ContentDraft>,
}

impl CourseDraft {
    /// Returns the name of the first required field that is blank.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("name", &self.name),
            ("description", &self.description),
            ("tags", &self.tags),
            ("level", &self.level),
            ("demoUrl", &self.demo_url),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

/// A partial course update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub estimated_price: Option<f64>,
    pub tags: Option<String>,
    pub level: Option<String>,
    pub demo_url: Option<String>,
    #[serde(alias = "benifits")]
    pub benefits: Option<Vec<TitleEntry>>,
    pub prerequisites: Option<Vec<TitleEntry>>,
    pub course_data: Option<Vec<ContentDraft>>,
}

impl Course {
    pub fn from_draft(draft: CourseDraft, thumbnail: Option<ImageRef>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: draft.name,
            description: draft.description,
            price: draft.price,
            estimated_price: draft.estimated_price,
            thumbnail,
            tags: draft.tags,
            level: draft.level,
            demo_url: draft.demo_url,
            benefits: draft.benefits,
            prerequisites: draft.prerequisites,
            reviews: Vec::new(),
            ratings: 0.0,
            purchased: 0,
            course_data: draft
                .course_data
                .into_iter()
                .map(|mut c| {
                    c.id = None;
                    c.into_item(Vec::new())
                })
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies every field present in `patch`. Replacement content items keep the
    /// questions of the existing item that shares their identifier.
    pub fn apply_patch(&mut self, patch: CoursePatch) {
        if let Some(v) = patch.name {
            self.name = v;
        }
        if let Some(v) = patch.description {
            self.description = v;
        }
        if let Some(v) = patch.price {
            self.price = v;
        }
        if patch.estimated_price.is_some() {
            self.estimated_price = patch.estimated_price;
        }
        if let Some(v) = patch.tags {
            self.tags = v;
        }
        if let Some(v) = patch.level {
            self.level = v;
        }
        if let Some(v) = patch.demo_url {
            self.demo_url = v;
        }
        if let Some(v) = patch.benefits {
            self.benefits = v;
        }
        if let Some(v) = patch.prerequisites {
            self.prerequisites = v;
        }
        if let Some(drafts) = patch.course_data {
            let mut previous = std::mem::take(&mut self.course_data);
            self.course_data = drafts
                .into_iter()
                .map(|draft| {
                    let questions = draft
                        .id
                        .and_then(|id| previous.iter_mut().find(|item| item.id == id))
                        .map(|item| std::mem::take(&mut item.questions))
                        .unwrap_or_default();
                    draft.into_item(questions)
                })
                .collect();
        }
        self.updated_at = Utc::now();
    }

    pub fn content_item(&self, content_id: Uuid) -> Option<&ContentItem> {
        self.course_data.iter().find(|item| item.id == content_id)
    }
}

/// A content item as shown to visitors who have not purchased the course:
/// no video URL, suggestion, questions or links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPreview {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_thumbnail: Option<ImageRef>,
    pub video_section: String,
    pub video_length: u32,
    pub video_player: String,
}

/// The cached, public projection of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePreview {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub estimated_price: Option<f64>,
    pub thumbnail: Option<ImageRef>,
    pub tags: String,
    pub level: String,
    pub demo_url: String,
    pub benefits: Vec<TitleEntry>,
    pub prerequisites: Vec<TitleEntry>,
    pub reviews: Vec<Review>,
    pub ratings: f64,
    pub purchased: u32,
    pub course_data: Vec<ContentPreview>,
}

impl From<&Course> for CoursePreview {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id,
            name: course.name.clone(),
            description: course.description.clone(),
            price: course.price,
            estimated_price: course.estimated_price,
            thumbnail: course.thumbnail.clone(),
            tags: course.tags.clone(),
            level: course.level.clone(),
            demo_url: course.demo_url.clone(),
            benefits: course.benefits.clone(),
            prerequisites: course.prerequisites.clone(),
            reviews: course.reviews.clone(),
            ratings: course.ratings,
            purchased: course.purchased,
            course_data: course
                .course_data
                .iter()
                .map(|item| ContentPreview {
                    id: item.id,
                    title: item.title.clone(),
                    description: item.description.clone(),
                    video_thumbnail: item.video_thumbnail.clone(),
                    video_section: item.video_section.clone(),
                    video_length: item.video_length,
                    video_player: item.video_player.clone(),
                })
                .collect(),
        }
    }
}
