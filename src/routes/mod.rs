//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the admin and quiz endpoints under a single Axum router. Method
//! names follow the `<area>.<action>` convention of the bot's admin panel.

pub mod admin;
pub mod quiz;
pub mod response;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the API router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/admin.login", post(admin::login))
        .route("/admin.current", get(admin::current))
        .route("/admin.logout", post(admin::logout))
        .route("/quiz.add_theme", post(quiz::add_theme))
        .route("/quiz.list_themes", get(quiz::list_themes))
        .route("/quiz.add_question", post(quiz::add_question))
        .route("/quiz.list_questions", get(quiz::list_questions))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
