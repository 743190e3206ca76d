use super::*;
use std::time::Duration;

use tokio::sync::broadcast::error::TryRecvError;

async fn session_with_vocabulary(entries: &[&str]) -> Arc<CheckerSession> {
    let session = CheckerSession::new(ClientConfig::default());
    session
        .search()
        .install_vocabulary(entries.iter().map(|s| s.to_string()).collect())
        .await;
    session
}

// Comfortably past the 300 ms default debounce; virtual time makes the wait
// free.
const SETTLE: Duration = Duration::from_millis(700);

#[tokio::test(start_paused = true)]
async fn whitespace_query_never_starts_a_debounce_timer() {
    let session = session_with_vocabulary(&["fever", "cough"]).await;

    session.search().set_query("   ").await;
    assert!(!session.search().has_pending_recompute().await);
    assert!(session.search().suggestions().await.is_empty());

    session.search().set_query("").await;
    assert!(!session.search().has_pending_recompute().await);
    assert!(session.search().suggestions().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn whitespace_query_cancels_a_pending_recompute() {
    let session = session_with_vocabulary(&["fever", "cough"]).await;

    session.search().set_query("fe").await;
    assert!(session.search().has_pending_recompute().await);

    session.search().set_query(" ").await;
    assert!(!session.search().has_pending_recompute().await);

    tokio::time::sleep(SETTLE).await;
    assert!(session.search().suggestions().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn rapid_queries_recompute_once_with_the_final_value() {
    let session = session_with_vocabulary(&["fever", "cough", "headache"]).await;
    let mut events = session.subscribe_events();

    session.search().set_query("f").await;
    session.search().set_query("fe").await;
    session.search().set_query("co").await;

    tokio::time::sleep(SETTLE).await;
    assert_eq!(session.search().suggestions().await, ["cough"]);

    // Exactly one recomputation, for the final query only.
    match events.try_recv() {
        Ok(SessionEvent::SuggestionsUpdated(suggestions)) => {
            assert_eq!(suggestions, ["cough"]);
        }
        other => panic!("expected a single suggestions update, got {other:?}"),
    }
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test(start_paused = true)]
async fn matching_is_case_insensitive_substring_containment() {
    let session = session_with_vocabulary(&["Fever", "Dry Cough", "Headache"]).await;

    session.search().set_query("COUGH").await;
    tokio::time::sleep(SETTLE).await;
    assert_eq!(session.search().suggestions().await, ["Dry Cough"]);

    session.search().set_query("e").await;
    tokio::time::sleep(SETTLE).await;
    assert_eq!(session.search().suggestions().await, ["Fever", "Headache"]);
}

#[tokio::test(start_paused = true)]
async fn suggestions_truncate_to_five_in_vocabulary_order() {
    let session = session_with_vocabulary(&[
        "back pain",
        "chest pain",
        "joint pain",
        "muscle pain",
        "neck pain",
        "stomach pain",
        "knee pain",
    ])
    .await;

    session.search().set_query("pain").await;
    tokio::time::sleep(SETTLE).await;

    assert_eq!(
        session.search().suggestions().await,
        [
            "back pain",
            "chest pain",
            "joint pain",
            "muscle pain",
            "neck pain"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn suggestion_click_adds_to_selection_and_clears_search() {
    let session = session_with_vocabulary(&["fever", "cough", "headache"]).await;

    session.search().set_query("fe").await;
    tokio::time::sleep(SETTLE).await;
    assert_eq!(session.search().suggestions().await, ["fever"]);

    session.select_suggestion("fever").await;

    assert_eq!(session.selection().await, ["fever"]);
    assert!(session.search().query().await.is_empty());
    assert!(session.search().suggestions().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn query_is_recorded_immediately_before_the_debounce_fires() {
    let session = session_with_vocabulary(&["fever"]).await;

    session.search().set_query("fev").await;
    assert_eq!(session.search().query().await, "fev");
    // Suggestions lag until the quiet interval elapses.
    assert!(session.search().suggestions().await.is_empty());
}
