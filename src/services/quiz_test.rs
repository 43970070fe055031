use super::*;
use crate::state::test_helpers::{MemoryStore, answers};

// =============================================================================
// validate_answers
// =============================================================================

#[test]
fn validate_answers_accepts_two_with_one_correct() {
    assert!(validate_answers(&answers(&[("4", true), ("5", false)])).is_ok());
}

#[test]
fn validate_answers_rejects_single_answer() {
    let err = validate_answers(&answers(&[("4", true)])).unwrap_err();
    assert!(matches!(&err, QuizError::Validation(msg) if msg.contains("at least 2")));
}

#[test]
fn validate_answers_rejects_empty() {
    assert!(matches!(validate_answers(&[]), Err(QuizError::Validation(_))));
}

#[test]
fn validate_answers_rejects_no_correct() {
    let err = validate_answers(&answers(&[("a", false), ("b", false)])).unwrap_err();
    assert!(matches!(&err, QuizError::Validation(msg) if msg.contains("got 0")));
}

#[test]
fn validate_answers_rejects_two_correct() {
    let err = validate_answers(&answers(&[("a", true), ("b", true), ("c", false)])).unwrap_err();
    assert!(matches!(&err, QuizError::Validation(msg) if msg.contains("got 2")));
}

// =============================================================================
// add_theme
// =============================================================================

#[tokio::test]
async fn add_theme_assigns_id() {
    let store = MemoryStore::default();
    let theme = add_theme(&store, "Geography").await.unwrap();
    assert_eq!(theme.title, "Geography");
    assert!(theme.id.is_some());
}

#[tokio::test]
async fn add_theme_rejects_duplicate_title() {
    let store = MemoryStore::default();
    add_theme(&store, "Geography").await.unwrap();
    let err = add_theme(&store, "Geography").await.unwrap_err();
    assert!(matches!(err, QuizError::Conflict(_)));
    assert_eq!(store.theme_count(), 1);
}

#[tokio::test]
async fn add_theme_keeps_title_as_sent() {
    let store = MemoryStore::default();
    add_theme(&store, "Geography").await.unwrap();
    let padded = add_theme(&store, " Geography").await.unwrap();
    assert_eq!(padded.title, " Geography");
    assert_eq!(store.theme_count(), 2);
}

#[tokio::test]
async fn add_theme_rejects_blank_title() {
    let store = MemoryStore::default();
    assert!(matches!(add_theme(&store, "   ").await, Err(QuizError::Validation(_))));
}

// =============================================================================
// add_question
// =============================================================================

#[tokio::test]
async fn add_question_persists_answers_in_order() {
    let store = MemoryStore::default();
    let theme = add_theme(&store, "Math").await.unwrap();
    let theme_id = theme.id.unwrap();

    let question = add_question(&store, "2+2?", theme_id, &answers(&[("3", false), ("4", true), ("5", false)]))
        .await
        .unwrap();
    assert_eq!(question.theme_id, theme_id);
    let titles: Vec<&str> = question.answers.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["3", "4", "5"]);
}

#[tokio::test]
async fn add_question_rejects_invalid_answers_before_persistence() {
    let store = MemoryStore::default();
    let theme_id = add_theme(&store, "Math").await.unwrap().id.unwrap();

    for bad in [answers(&[("4", true)]), answers(&[("3", false), ("5", false)]), answers(&[("4", true), ("four", true)])] {
        let err = add_question(&store, "2+2?", theme_id, &bad).await.unwrap_err();
        assert!(matches!(err, QuizError::Validation(_)));
    }
    assert_eq!(store.question_count(), 0);
}

#[tokio::test]
async fn add_question_unknown_theme_is_not_found() {
    let store = MemoryStore::default();
    let err = add_question(&store, "2+2?", 99, &answers(&[("4", true), ("5", false)]))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::NotFound(_)));
}

#[tokio::test]
async fn add_question_rejects_duplicate_title() {
    let store = MemoryStore::default();
    let theme_id = add_theme(&store, "Math").await.unwrap().id.unwrap();
    let ok = answers(&[("4", true), ("5", false)]);

    add_question(&store, "2+2?", theme_id, &ok).await.unwrap();
    let err = add_question(&store, "2+2?", theme_id, &ok).await.unwrap_err();
    assert!(matches!(err, QuizError::Conflict(_)));
    assert_eq!(store.question_count(), 1);
}

// =============================================================================
// PgQuizRepository (live database)
// =============================================================================

#[cfg(feature = "live-db-tests")]
#[tokio::test]
async fn pg_repository_round_trips_question() {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL required for live-db-tests");
    let pool = crate::db::init_pool(&url, 2).await.expect("pool init");
    let repo = PgQuizRepository::new(pool);

    let suffix = crate::services::admin::generate_token();
    let theme = add_theme(&repo, &format!("theme-{suffix}")).await.unwrap();
    let theme_id = theme.id.unwrap();
    let title = format!("question-{suffix}");
    add_question(&repo, &title, theme_id, &answers(&[("a", true), ("b", false)]))
        .await
        .unwrap();

    let listed = repo.list_questions(Some(theme_id)).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, title);
    assert_eq!(listed[0].answers.len(), 2);
    assert!(listed[0].answers[0].is_correct);
}
