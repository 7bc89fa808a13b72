pub mod auth;
pub mod cookies;
pub mod course;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod user;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub use middleware::{require_admin, require_auth, update_access_token};
pub use state::{AppState, AuthUser};

/// Builds every API route. CORS, body limits and the Swagger UI are added by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/register", post(auth::register_handler))
        .route("/activate", post(auth::activate_handler))
        .route("/login", post(auth::login_handler))
        .route("/social-auth", post(auth::social_auth_handler))
        .route("/courses", get(course::get_all_courses_handler))
        .route("/courses/{id}", get(course::get_single_course_handler));

    // Token rotation (refresh cookie required)
    let refresh_routes = Router::new()
        .route("/refresh", get(auth::refresh_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            update_access_token,
        ));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/logout", get(auth::logout_handler))
        .route("/me", get(user::me_handler))
        .route("/update-info", put(user::update_info_handler))
        .route("/update-password", put(user::update_password_handler))
        .route("/update-avatar", put(user::update_avatar_handler))
        .route("/courses/{id}/content", get(course::get_course_content_handler))
        .route("/courses/add-question", put(course::add_question_handler))
        .route("/courses/add-answer", put(course::add_answer_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Admin routes (auth + admin role required); layers run bottom-up.
    let admin_routes = Router::new()
        .route("/courses", post(course::upload_course_handler))
        .route("/courses/{id}", put(course::edit_course_handler))
        .route_layer(axum_middleware::from_fn(require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(refresh_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .with_state(app_state)
}
