//! services/api/src/web/course.rs
//!
//! Course catalog endpoints: admin create/edit, cached public reads, the
//! enrolled-only content view, and the per-video question/answer thread.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use coursehub_core::ports::UploadOptions;
use coursehub_core::thread::{self, parse_id};
use coursehub_core::{Course, CourseDraft, CoursePatch, CoursePreview, ImageRef};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cache::{course_key, ALL_COURSES_KEY};
use crate::error::ApiError;
use crate::web::state::{AppState, AuthUser};

const THUMBNAIL_FOLDER: &str = "courses";

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize)]
pub struct CreateCourseRequest {
    #[serde(flatten)]
    pub course: CourseDraft,
    /// Base64 or data-URI encoded image.
    pub thumbnail: Option<String>,
}

#[derive(Deserialize)]
pub struct EditCourseRequest {
    #[serde(flatten)]
    pub patch: CoursePatch,
    pub thumbnail: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddQuestionRequest {
    pub question: String,
    pub course_id: String,
    pub content_id: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddAnswerRequest {
    pub answer: String,
    pub course_id: String,
    pub content_id: String,
    pub question_id: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn course_id(raw: &str) -> Result<Uuid, ApiError> {
    parse_id(raw).ok_or_else(|| ApiError::InvalidId("Invalid courseId".to_string()))
}

async fn upload_thumbnail(state: &AppState, image: &str) -> Result<ImageRef, ApiError> {
    state
        .images
        .upload_image(image, &UploadOptions::folder(THUMBNAIL_FOLDER))
        .await
        .map_err(|e| {
            error!("Thumbnail upload failed: {:?}", e);
            ApiError::upstream(StatusCode::INTERNAL_SERVER_ERROR, e)
        })
}

fn non_empty(text: &str, field: &str) -> Result<(), ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::Validation(format!("Please enter {}", field)));
    }
    Ok(())
}

//=========================================================================================
// Admin Handlers
//=========================================================================================

/// POST /courses - Create a course
#[utoipa::path(
    post,
    path = "/courses",
    request_body(content_type = "application/json", description = "Course fields plus an optional base64 `thumbnail`."),
    responses(
        (status = 201, description = "Course created"),
        (status = 400, description = "Missing required field"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn upload_course_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(field) = req.course.missing_field() {
        return Err(ApiError::Validation(format!("Please enter course {}", field)));
    }
    if req.course.price < 0.0 {
        return Err(ApiError::Validation("Course price cannot be negative".to_string()));
    }

    let thumbnail = match req.thumbnail.as_deref().filter(|t| !t.is_empty()) {
        Some(image) => Some(upload_thumbnail(&state, image).await?),
        None => None,
    };

    let course = Course::from_draft(req.course, thumbnail);
    state.courses.create_course(&course).await?;
    state.cache.invalidate_course(course.id).await?;
    info!("Created course {} ({})", course.id, course.name);

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "course": course }))))
}

/// PUT /courses/{id} - Edit a course
#[utoipa::path(
    put,
    path = "/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    request_body(content_type = "application/json", description = "Any subset of course fields plus an optional base64 `thumbnail`."),
    responses(
        (status = 201, description = "Course updated"),
        (status = 404, description = "No such course")
    )
)]
pub async fn edit_course_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<EditCourseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = course_id(&id)?;
    let mut course = state.courses.get_course_by_id(id).await?;

    if let Some(image) = req.thumbnail.as_deref().filter(|t| !t.is_empty()) {
        if let Some(old) = course.thumbnail.take() {
            state
                .images
                .destroy_image(&old.public_id)
                .await
                .map_err(|e| ApiError::upstream(StatusCode::INTERNAL_SERVER_ERROR, e))?;
        }
        course.thumbnail = Some(upload_thumbnail(&state, image).await?);
    }

    course.apply_patch(req.patch);
    state.courses.save_course(&course).await?;
    state.cache.invalidate_course(course.id).await?;
    info!("Updated course {}", course.id);

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "course": course }))))
}

//=========================================================================================
// Public Read Handlers
//=========================================================================================

/// GET /courses/{id} - Course preview, served from cache when possible
#[utoipa::path(
    get,
    path = "/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course preview without private content fields"),
        (status = 404, description = "No such course")
    )
)]
pub async fn get_single_course_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = course_id(&id)?;
    let key = course_key(id);

    let course = match state.cache.get_json::<CoursePreview>(&key).await? {
        Some(cached) => {
            debug!("Course {} served from cache", id);
            cached
        }
        None => {
            let course = state.courses.get_course_by_id(id).await?;
            let preview = CoursePreview::from(&course);
            state.cache.set_json(&key, &preview, None).await?;
            preview
        }
    };

    Ok(Json(json!({ "success": true, "course": course })))
}

/// GET /courses - Every course preview, served from cache when possible
#[utoipa::path(
    get,
    path = "/courses",
    responses(
        (status = 200, description = "All course previews")
    )
)]
pub async fn get_all_courses_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let courses = match state.cache.get_json::<Vec<CoursePreview>>(ALL_COURSES_KEY).await? {
        Some(cached) => cached,
        None => {
            let previews: Vec<CoursePreview> = state
                .courses
                .list_courses()
                .await?
                .iter()
                .map(CoursePreview::from)
                .collect();
            state.cache.set_json(ALL_COURSES_KEY, &previews, None).await?;
            previews
        }
    };

    Ok(Json(json!({ "success": true, "courses": courses })))
}

//=========================================================================================
// Enrolled-user Handlers
//=========================================================================================

/// GET /courses/{id}/content - Full content list for enrolled users
#[utoipa::path(
    get,
    path = "/courses/{id}/content",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Content items including videos, links and questions"),
        (status = 403, description = "Not enrolled in this course")
    )
)]
pub async fn get_course_content_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = course_id(&id)?;
    if !user.is_enrolled_in(id) {
        return Err(ApiError::Forbidden(
            "You are not authorized to access this course".to_string(),
        ));
    }

    let course = state.courses.get_course_by_id(id).await?;
    Ok(Json(json!({ "success": true, "content": course.course_data })))
}

/// PUT /courses/add-question - Ask a question under a video
#[utoipa::path(
    put,
    path = "/courses/add-question",
    request_body = AddQuestionRequest,
    responses(
        (status = 200, description = "Question added; body carries the updated course"),
        (status = 400, description = "Invalid contentId"),
        (status = 404, description = "No such course")
    )
)]
pub async fn add_question_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(req): Json<AddQuestionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    non_empty(&req.question, "a question")?;
    let id = course_id(&req.course_id)?;
    let mut course = state.courses.get_course_by_id(id).await?;

    thread::add_question(&mut course, &req.content_id, &req.question, user)?;
    course.updated_at = Utc::now();
    state.courses.save_course(&course).await?;

    Ok(Json(json!({ "success": true, "course": course })))
}

/// PUT /courses/add-answer - Reply to a question under a video
#[utoipa::path(
    put,
    path = "/courses/add-answer",
    request_body = AddAnswerRequest,
    responses(
        (status = 200, description = "Answer added; body carries the updated course"),
        (status = 400, description = "Invalid contentId or questionId"),
        (status = 500, description = "Answer saved but the notification email failed")
    )
)]
pub async fn add_answer_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(req): Json<AddAnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    non_empty(&req.answer, "an answer")?;
    let id = course_id(&req.course_id)?;
    let mut course = state.courses.get_course_by_id(id).await?;

    let added = thread::add_answer(
        &mut course,
        &req.content_id,
        &req.question_id,
        &req.answer,
        user,
    )?;
    course.updated_at = Utc::now();
    state.courses.save_course(&course).await?;

    // Self-answers are silent.
    if let Some(mail) = added.notification() {
        state.mailer.send_email(&mail).await.map_err(|e| {
            error!("Failed to send question reply email: {:?}", e);
            ApiError::upstream(StatusCode::INTERNAL_SERVER_ERROR, e)
        })?;
    }

    Ok(Json(json!({ "success": true, "course": course })))
}
