pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::extract::handlers as documents;
use crate::extract::MAX_DOCUMENT_BYTES;
use crate::generation::handlers as generation;
use crate::onboarding::handlers as onboarding;
use crate::optimization::handlers as optimization;
use crate::parser::handlers as parser;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Documents
        .route(
            "/api/v1/documents/extract",
            post(documents::handle_extract),
        )
        // Resumes
        .route(
            "/api/v1/resumes/parse-section",
            post(parser::handle_parse_section),
        )
        .route("/api/v1/resumes/generate", post(generation::handle_generate))
        .route(
            "/api/v1/resumes/generate-from-document",
            post(generation::handle_generate_from_document),
        )
        .route("/api/v1/resumes/blank", post(resumes::handle_create_blank))
        .route("/api/v1/resumes/upload", post(resumes::handle_upload))
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get_resume)
                .put(resumes::handle_update_resume)
                .delete(resumes::handle_delete_resume),
        )
        // Optimizations
        .route(
            "/api/v1/optimizations/:id/regenerate",
            post(optimization::handle_regenerate),
        )
        .route(
            "/api/v1/optimizations/:id/rewrite",
            post(optimization::handle_rewrite),
        )
        .route(
            "/api/v1/regenerated/:id",
            get(optimization::handle_get_regenerated),
        )
        // Onboarding
        .route(
            "/api/v1/onboarding/parse-cv",
            post(onboarding::handle_parse_cv),
        )
        .layer(DefaultBodyLimit::max(MAX_DOCUMENT_BYTES))
        .with_state(state)
}
