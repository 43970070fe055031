//! Quiz service: themes, questions and answers.
//!
//! DESIGN
//! ======
//! Persistence sits behind `QuizRepository` so handlers and rule checks can
//! run against an in-memory store in tests. The service functions own the
//! business rules: unique titles, an existing theme for every question, and
//! the answer invariant (at least two answers, exactly one correct).
//!
//! TRADE-OFFS
//! ==========
//! Title uniqueness is checked before insert and also enforced by a UNIQUE
//! constraint; a race between two admins surfaces as a conflict either way.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: Option<i64>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub title: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: Option<i64>,
    pub title: String,
    pub theme_id: i64,
    pub answers: Vec<Answer>,
}

/// Minimum number of answers a question must carry.
pub const MIN_ANSWERS: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0} already exists")]
    Conflict(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl crate::error::ErrorCode for QuizError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::Conflict(_) => "E_CONFLICT",
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

// =============================================================================
// REPOSITORY
// =============================================================================

#[async_trait::async_trait]
pub trait QuizRepository: Send + Sync {
    async fn get_theme_by_title(&self, title: &str) -> Result<Option<Theme>, QuizError>;
    async fn get_theme_by_id(&self, id: i64) -> Result<Option<Theme>, QuizError>;
    async fn create_theme(&self, title: &str) -> Result<Theme, QuizError>;
    async fn list_themes(&self) -> Result<Vec<Theme>, QuizError>;
    async fn get_question_by_title(&self, title: &str) -> Result<Option<Question>, QuizError>;
    async fn create_question(&self, title: &str, theme_id: i64, answers: &[Answer]) -> Result<Question, QuizError>;
    async fn list_questions(&self, theme_id: Option<i64>) -> Result<Vec<Question>, QuizError>;
}

pub struct PgQuizRepository {
    pool: PgPool,
}

impl PgQuizRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_answers(&self, question_ids: &[i64]) -> Result<Vec<(i64, Answer)>, QuizError> {
        if question_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(
            "SELECT question_id, title, is_correct
             FROM answers
             WHERE question_id = ANY($1)
             ORDER BY question_id, position",
        )
        .bind(question_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.get("question_id"), Answer { title: r.get("title"), is_correct: r.get("is_correct") }))
            .collect())
    }
}

fn theme_from_row(row: &sqlx::postgres::PgRow) -> Theme {
    Theme { id: Some(row.get("id")), title: row.get("title") }
}

/// Map a UNIQUE violation to a conflict on `what`.
fn unique_violation(e: sqlx::Error, what: &str) -> QuizError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return QuizError::Conflict(what.to_owned());
        }
    }
    QuizError::Database(e)
}

#[async_trait::async_trait]
impl QuizRepository for PgQuizRepository {
    async fn get_theme_by_title(&self, title: &str) -> Result<Option<Theme>, QuizError> {
        let row = sqlx::query("SELECT id, title FROM themes WHERE title = $1")
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(theme_from_row))
    }

    async fn get_theme_by_id(&self, id: i64) -> Result<Option<Theme>, QuizError> {
        let row = sqlx::query("SELECT id, title FROM themes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(theme_from_row))
    }

    async fn create_theme(&self, title: &str) -> Result<Theme, QuizError> {
        let row = sqlx::query("INSERT INTO themes (title) VALUES ($1) RETURNING id, title")
            .bind(title)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_violation(e, "theme"))?;
        Ok(theme_from_row(&row))
    }

    async fn list_themes(&self) -> Result<Vec<Theme>, QuizError> {
        let rows = sqlx::query("SELECT id, title FROM themes ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(theme_from_row).collect())
    }

    async fn get_question_by_title(&self, title: &str) -> Result<Option<Question>, QuizError> {
        let Some(row) = sqlx::query("SELECT id, title, theme_id FROM questions WHERE title = $1")
            .bind(title)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let id: i64 = row.get("id");
        let answers = self
            .load_answers(&[id])
            .await?
            .into_iter()
            .map(|(_, a)| a)
            .collect();
        Ok(Some(Question { id: Some(id), title: row.get("title"), theme_id: row.get("theme_id"), answers }))
    }

    async fn create_question(&self, title: &str, theme_id: i64, answers: &[Answer]) -> Result<Question, QuizError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("INSERT INTO questions (title, theme_id) VALUES ($1, $2) RETURNING id")
            .bind(title)
            .bind(theme_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| unique_violation(e, "question"))?;
        let id: i64 = row.get("id");

        for (position, answer) in answers.iter().enumerate() {
            let position = i32::try_from(position).unwrap_or(i32::MAX);
            sqlx::query("INSERT INTO answers (question_id, position, title, is_correct) VALUES ($1, $2, $3, $4)")
                .bind(id)
                .bind(position)
                .bind(&answer.title)
                .bind(answer.is_correct)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(Question { id: Some(id), title: title.to_owned(), theme_id, answers: answers.to_vec() })
    }

    async fn list_questions(&self, theme_id: Option<i64>) -> Result<Vec<Question>, QuizError> {
        let rows = sqlx::query(
            "SELECT id, title, theme_id
             FROM questions
             WHERE $1::BIGINT IS NULL OR theme_id = $1
             ORDER BY id",
        )
        .bind(theme_id)
        .fetch_all(&self.pool)
        .await?;

        let mut questions: Vec<Question> = rows
            .iter()
            .map(|r| Question { id: Some(r.get("id")), title: r.get("title"), theme_id: r.get("theme_id"), answers: Vec::new() })
            .collect();

        let ids: Vec<i64> = questions.iter().filter_map(|q| q.id).collect();
        for (question_id, answer) in self.load_answers(&ids).await? {
            if let Some(q) = questions.iter_mut().find(|q| q.id == Some(question_id)) {
                q.answers.push(answer);
            }
        }

        Ok(questions)
    }
}

// =============================================================================
// RULES
// =============================================================================

/// Check the answer invariant: at least [`MIN_ANSWERS`], exactly one correct.
///
/// # Errors
///
/// Returns [`QuizError::Validation`] describing the first violated rule.
pub fn validate_answers(answers: &[Answer]) -> Result<(), QuizError> {
    if answers.len() < MIN_ANSWERS {
        return Err(QuizError::Validation(format!("question needs at least {MIN_ANSWERS} answers")));
    }
    let correct = answers.iter().filter(|a| a.is_correct).count();
    if correct != 1 {
        return Err(QuizError::Validation(format!("question needs exactly one correct answer, got {correct}")));
    }
    Ok(())
}

/// Titles are stored exactly as sent; only all-whitespace is rejected.
fn validate_title(title: &str, what: &str) -> Result<(), QuizError> {
    if title.trim().is_empty() {
        return Err(QuizError::Validation(format!("{what} title must not be empty")));
    }
    Ok(())
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Create a theme, rejecting duplicate titles.
///
/// # Errors
///
/// [`QuizError::Conflict`] when the title is taken, [`QuizError::Validation`]
/// for an empty title.
pub async fn add_theme(repo: &dyn QuizRepository, title: &str) -> Result<Theme, QuizError> {
    validate_title(title, "theme")?;
    if repo.get_theme_by_title(title).await?.is_some() {
        return Err(QuizError::Conflict("theme".into()));
    }
    repo.create_theme(title).await
}

/// Create a question after checking its theme, title and answers.
///
/// # Errors
///
/// [`QuizError::Validation`] for a broken answer invariant,
/// [`QuizError::NotFound`] for an unknown theme, [`QuizError::Conflict`]
/// for a duplicate title.
pub async fn add_question(
    repo: &dyn QuizRepository,
    title: &str,
    theme_id: i64,
    answers: &[Answer],
) -> Result<Question, QuizError> {
    validate_title(title, "question")?;
    validate_answers(answers)?;

    if repo.get_theme_by_id(theme_id).await?.is_none() {
        return Err(QuizError::NotFound("theme".into()));
    }
    if repo.get_question_by_title(title).await?.is_some() {
        return Err(QuizError::Conflict("question".into()));
    }

    repo.create_question(title, theme_id, answers).await
}

#[cfg(test)]
#[path = "quiz_test.rs"]
mod tests;
