pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::actions::handlers;
use crate::creations::handlers as creation_handlers;
use crate::gate::middleware::require_entitlement;
use crate::state::AppState;

/// Request body cap. Above the 5 MiB resume limit so oversized resumes reach
/// the handler and get a structured rejection instead of a bare 413.
pub const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let authenticated = Router::new()
        // AI actions
        .route(
            "/api/ai/generate-article",
            post(handlers::handle_generate_article),
        )
        .route(
            "/api/ai/generate-blog-title",
            post(handlers::handle_generate_blog_title),
        )
        .route("/api/ai/generate-image", post(handlers::handle_generate_image))
        .route(
            "/api/ai/remove-image-background",
            post(handlers::handle_remove_image_background),
        )
        .route(
            "/api/ai/remove-image-object",
            post(handlers::handle_remove_image_object),
        )
        .route("/api/ai/resume-review", post(handlers::handle_resume_review))
        // Unprefixed alias kept for existing clients
        .route("/generate-article", post(handlers::handle_generate_article))
        // Creations
        .route(
            "/api/user/creations",
            get(creation_handlers::handle_user_creations),
        )
        .route(
            "/api/user/published-creations",
            get(creation_handlers::handle_published_creations),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_entitlement,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(authenticated)
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .with_state(state)
}
