use super::*;
use test_helpers::{MemoryStore, admin_token, answers, test_app_state};

#[tokio::test]
async fn app_state_clone_shares_repositories() {
    let (state, store) = test_app_state();
    let cloned = state.clone();
    cloned.quizzes.create_theme("Shared").await.unwrap();
    assert_eq!(store.theme_count(), 1);
    assert_eq!(state.quizzes.list_themes().await.unwrap().len(), 1);
}

#[tokio::test]
async fn memory_store_filters_questions_by_theme() {
    let store = MemoryStore::default();
    let a = store.create_theme("A").await.unwrap().id.unwrap();
    let b = store.create_theme("B").await.unwrap().id.unwrap();
    let ok = answers(&[("x", true), ("y", false)]);
    store.create_question("qa", a, &ok).await.unwrap();
    store.create_question("qb", b, &ok).await.unwrap();

    assert_eq!(store.list_questions(None).await.unwrap().len(), 2);
    let only_b = store.list_questions(Some(b)).await.unwrap();
    assert_eq!(only_b.len(), 1);
    assert_eq!(only_b[0].title, "qb");
}

#[tokio::test]
async fn admin_token_resolves_to_seeded_admin() {
    let (state, store) = test_app_state();
    let token = admin_token(&store).await;
    let admin = state.admins.get_by_session(&token).await.unwrap().unwrap();
    assert_eq!(admin.email, test_helpers::TEST_ADMIN_EMAIL);

    state.admins.delete_session(&token).await.unwrap();
    assert!(state.admins.get_by_session(&token).await.unwrap().is_none());
}
