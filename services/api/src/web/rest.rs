//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use utoipa::OpenApi;

use crate::web::{auth, course, user};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::activate_handler,
        auth::login_handler,
        auth::social_auth_handler,
        auth::logout_handler,
        auth::refresh_handler,
        user::me_handler,
        user::update_info_handler,
        user::update_password_handler,
        user::update_avatar_handler,
        course::upload_course_handler,
        course::edit_course_handler,
        course::get_single_course_handler,
        course::get_all_courses_handler,
        course::get_course_content_handler,
        course::add_question_handler,
        course::add_answer_handler,
    ),
    components(
        schemas(
            auth::RegisterRequest,
            auth::ActivateRequest,
            auth::LoginRequest,
            auth::SocialAuthRequest,
            user::UpdateInfoRequest,
            user::UpdatePasswordRequest,
            user::UpdateAvatarRequest,
            course::AddQuestionRequest,
            course::AddAnswerRequest,
        )
    ),
    tags(
        (name = "CourseHub API", description = "Accounts, sessions, course catalog and video discussions.")
    )
)]
pub struct ApiDoc;
