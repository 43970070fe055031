//! Quiz routes: theme and question CRUD. All require an admin session.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::Json;
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};

use super::admin::AuthAdmin;
use super::response::{ApiError, ok};
use crate::services::quiz::{self, Answer};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddThemeBody {
    pub title: String,
}

#[derive(Deserialize)]
pub struct AddQuestionBody {
    pub title: String,
    pub theme_id: i64,
    pub answers: Vec<Answer>,
}

#[derive(Deserialize)]
pub struct ListQuestionsQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub theme_id: Option<i64>,
}

/// `?theme_id=` with no value means "no filter"; other text must be an integer.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("theme_id: not an integer: {text}"))),
    }
}

/// `POST /quiz.add_theme`: create a theme; 409 on duplicate title.
pub async fn add_theme(
    State(state): State<AppState>,
    _auth: AuthAdmin,
    payload: Result<Json<AddThemeBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let theme = quiz::add_theme(state.quizzes.as_ref(), &body.title).await?;
    Ok(ok(theme))
}

/// `GET /quiz.list_themes`
pub async fn list_themes(State(state): State<AppState>, _auth: AuthAdmin) -> Result<Json<Value>, ApiError> {
    let themes = state.quizzes.list_themes().await?;
    Ok(ok(json!({ "themes": themes })))
}

/// `POST /quiz.add_question`: create a question with its answers.
pub async fn add_question(
    State(state): State<AppState>,
    _auth: AuthAdmin,
    payload: Result<Json<AddQuestionBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let question = quiz::add_question(state.quizzes.as_ref(), &body.title, body.theme_id, &body.answers).await?;
    Ok(ok(question))
}

/// `GET /quiz.list_questions?theme_id=`: all questions, or one theme's.
pub async fn list_questions(
    State(state): State<AppState>,
    _auth: AuthAdmin,
    query: Result<Query<ListQuestionsQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let questions = state.quizzes.list_questions(query.theme_id).await?;
    Ok(ok(json!({ "questions": questions })))
}

#[cfg(test)]
#[path = "quiz_test.rs"]
mod tests;
