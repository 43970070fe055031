//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the admin and quiz repositories behind trait objects, so tests run
//! the same handlers against the in-memory store in `test_helpers`.

use std::sync::Arc;

use sqlx::PgPool;

use crate::services::admin::{AdminRepository, PgAdminRepository};
use crate::services::quiz::{PgQuizRepository, QuizRepository};

/// Shared application state. Clone is required by Axum; all fields are
/// Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub admins: Arc<dyn AdminRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    /// Whether to mark the session cookie `Secure`.
    pub cookie_secure: bool,
}

impl AppState {
    #[must_use]
    pub fn new(admins: Arc<dyn AdminRepository>, quizzes: Arc<dyn QuizRepository>, cookie_secure: bool) -> Self {
        Self { admins, quizzes, cookie_secure }
    }

    /// Postgres-backed state used in production.
    #[must_use]
    pub fn from_pool(pool: PgPool, cookie_secure: bool) -> Self {
        Self::new(
            Arc::new(PgAdminRepository::new(pool.clone())),
            Arc::new(PgQuizRepository::new(pool)),
            cookie_secure,
        )
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
