use std::{collections::HashSet, sync::Arc, time::Duration};

use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::debug;

use crate::SessionEvent;

/// Suggestion lists are truncated to the first matches in vocabulary order.
pub const MAX_SUGGESTIONS: usize = 5;

/// Owns the session vocabulary and derives the live suggestion list from the
/// current query once input has been quiet for the debounce interval.
pub struct VocabularySearch {
    inner: Arc<Mutex<SearchState>>,
    debounce: Duration,
    events: broadcast::Sender<SessionEvent>,
}

#[derive(Default)]
struct SearchState {
    vocabulary: Vec<String>,
    query: String,
    suggestions: Vec<String>,
    // At most one debounce timer is ever pending; scheduling a new one
    // aborts the previous handle.
    pending: Option<JoinHandle<()>>,
    // Guards the window between a timer firing and it taking the lock: only
    // the latest query generation may publish suggestions.
    generation: u64,
}

impl VocabularySearch {
    pub fn new(debounce: Duration, events: broadcast::Sender<SessionEvent>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SearchState::default())),
            debounce,
            events,
        }
    }

    /// Installs the session vocabulary, dropping duplicates while preserving
    /// service order. Returns the number of entries kept.
    pub async fn install_vocabulary(&self, entries: Vec<String>) -> usize {
        let mut seen = HashSet::new();
        let vocabulary: Vec<String> = entries
            .into_iter()
            .filter(|entry| seen.insert(entry.clone()))
            .collect();

        let mut guard = self.inner.lock().await;
        guard.vocabulary = vocabulary;
        guard.vocabulary.len()
    }

    pub async fn vocabulary_len(&self) -> usize {
        self.inner.lock().await.vocabulary.len()
    }

    pub async fn query(&self) -> String {
        self.inner.lock().await.query.clone()
    }

    pub async fn suggestions(&self) -> Vec<String> {
        self.inner.lock().await.suggestions.clone()
    }

    pub async fn has_pending_recompute(&self) -> bool {
        self.inner.lock().await.pending.is_some()
    }

    /// Records the query immediately and schedules the debounced suggestion
    /// recompute. Empty or whitespace-only input clears the suggestion list
    /// right away without starting a timer.
    pub async fn set_query(&self, text: &str) {
        let mut guard = self.inner.lock().await;
        guard.query = text.to_string();
        guard.generation += 1;
        if let Some(pending) = guard.pending.take() {
            pending.abort();
        }

        if text.trim().is_empty() {
            if !guard.suggestions.is_empty() {
                guard.suggestions.clear();
                let _ = self.events.send(SessionEvent::SuggestionsUpdated(Vec::new()));
            }
            return;
        }

        let generation = guard.generation;
        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();
        let debounce = self.debounce;
        guard.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            let mut guard = inner.lock().await;
            if guard.generation != generation {
                // A newer keystroke landed between wakeup and the lock.
                return;
            }

            let matched = filter_vocabulary(&guard.vocabulary, &guard.query);
            debug!(
                query = %guard.query,
                matches = matched.len(),
                "search: suggestions recomputed"
            );
            guard.suggestions = matched.clone();
            guard.pending = None;
            let _ = events.send(SessionEvent::SuggestionsUpdated(matched));
        }));
    }

    /// Resets the query and closes the suggestion list. Used when a
    /// suggestion is clicked, whether or not it changed the selection.
    pub async fn clear(&self) {
        let mut guard = self.inner.lock().await;
        guard.query.clear();
        guard.generation += 1;
        if let Some(pending) = guard.pending.take() {
            pending.abort();
        }
        if !guard.suggestions.is_empty() {
            guard.suggestions.clear();
            let _ = self.events.send(SessionEvent::SuggestionsUpdated(Vec::new()));
        }
    }
}

/// Case-insensitive substring containment in vocabulary order, truncated to
/// [`MAX_SUGGESTIONS`]. No relevance ranking.
fn filter_vocabulary(vocabulary: &[String], query: &str) -> Vec<String> {
    let needle = query.to_lowercase();
    vocabulary
        .iter()
        .filter(|entry| entry.to_lowercase().contains(&needle))
        .take(MAX_SUGGESTIONS)
        .cloned()
        .collect()
}
