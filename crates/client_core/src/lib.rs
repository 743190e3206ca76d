use std::sync::Arc;

use reqwest::{Client, StatusCode};
use shared::protocol::{PredictRequest, PredictionResponse};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod config;
pub mod search;

pub use config::{ClientConfig, ServiceEndpoint};
pub use search::VocabularySearch;

/// Standing message when the symptom vocabulary cannot be fetched at startup.
pub const VOCABULARY_LOAD_MESSAGE: &str = "Failed to load symptoms. Please try again later.";
/// Validation message for submitting with nothing selected.
pub const EMPTY_SELECTION_MESSAGE: &str = "Please select at least one symptom";
/// Generic message for any prediction request failure. The underlying cause
/// is logged but never shown to the user.
pub const PREDICTION_FAILED_MESSAGE: &str = "Failed to get prediction. Please try again.";

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("symptom endpoint returned status {0}")]
    Status(StatusCode),
    #[error("failed to reach symptom endpoint: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("failed to parse symptom vocabulary: {0}")]
    Body(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("prediction endpoint returned status {0}")]
    Status(StatusCode),
    #[error("failed to reach prediction endpoint: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("failed to parse prediction response: {0}")]
    Body(#[source] reqwest::Error),
}

/// Lifecycle of the single outstanding prediction request. Front-ends gate
/// submission on `InFlight`; the session itself never queues a second call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredictionPhase {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

/// Everything a front-end needs to re-render, mirrored onto a broadcast
/// channel as state changes land.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    SuggestionsUpdated(Vec<String>),
    SelectionChanged(Vec<String>),
    PredictionStarted,
    PredictionReady(PredictionResponse),
    PredictionFailed(String),
    Error(String),
}

pub struct CheckerSession {
    http: Client,
    config: ClientConfig,
    search: VocabularySearch,
    inner: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

#[derive(Default)]
struct SessionState {
    selection: Vec<String>,
    phase: PredictionPhase,
    // The last successful result is kept even when a later request fails:
    // front-ends render it below the standing error.
    result: Option<PredictionResponse>,
    error: Option<String>,
}

impl CheckerSession {
    pub fn new(config: ClientConfig) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            http: Client::new(),
            search: VocabularySearch::new(config.debounce, events.clone()),
            config,
            inner: Mutex::new(SessionState::default()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn search(&self) -> &VocabularySearch {
        &self.search
    }

    pub fn base_url(&self) -> &str {
        self.config.endpoint.base_url()
    }

    /// Fetches the symptom vocabulary once at session start. On failure the
    /// standing load error is recorded, search stays non-functional and no
    /// automatic retry is attempted.
    pub async fn load_vocabulary(&self) -> Result<usize, VocabularyError> {
        match self.fetch_vocabulary().await {
            Ok(entries) => {
                let installed = self.search.install_vocabulary(entries).await;
                info!(count = installed, "vocabulary loaded");
                Ok(installed)
            }
            Err(err) => {
                warn!(error = %err, "vocabulary load failed");
                self.inner.lock().await.error = Some(VOCABULARY_LOAD_MESSAGE.to_string());
                let _ = self
                    .events
                    .send(SessionEvent::Error(VOCABULARY_LOAD_MESSAGE.to_string()));
                Err(err)
            }
        }
    }

    async fn fetch_vocabulary(&self) -> Result<Vec<String>, VocabularyError> {
        let response = self
            .http
            .get(format!("{}/symptoms", self.base_url()))
            .send()
            .await
            .map_err(VocabularyError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(VocabularyError::Status(status));
        }
        response
            .json::<Vec<String>>()
            .await
            .map_err(VocabularyError::Body)
    }

    /// Adds a clicked suggestion to the selection. Always clears the query
    /// and closes the suggestion list, even when the symptom was already
    /// selected.
    pub async fn select_suggestion(&self, symptom: &str) {
        let snapshot = {
            let mut guard = self.inner.lock().await;
            if guard.selection.iter().any(|s| s == symptom) {
                None
            } else {
                guard.selection.push(symptom.to_string());
                Some(guard.selection.clone())
            }
        };
        self.search.clear().await;
        if let Some(selection) = snapshot {
            let _ = self.events.send(SessionEvent::SelectionChanged(selection));
        }
    }

    /// Removes a symptom from the selection. No-op if it was never selected.
    pub async fn remove_symptom(&self, symptom: &str) {
        let snapshot = {
            let mut guard = self.inner.lock().await;
            let before = guard.selection.len();
            guard.selection.retain(|s| s != symptom);
            if guard.selection.len() == before {
                None
            } else {
                Some(guard.selection.clone())
            }
        };
        if let Some(selection) = snapshot {
            let _ = self.events.send(SessionEvent::SelectionChanged(selection));
        }
    }

    pub async fn selection(&self) -> Vec<String> {
        self.inner.lock().await.selection.clone()
    }

    pub async fn phase(&self) -> PredictionPhase {
        self.inner.lock().await.phase
    }

    pub async fn is_in_flight(&self) -> bool {
        self.phase().await == PredictionPhase::InFlight
    }

    pub async fn prediction(&self) -> Option<PredictionResponse> {
        self.inner.lock().await.result.clone()
    }

    pub async fn error_message(&self) -> Option<String> {
        self.inner.lock().await.error.clone()
    }

    /// Submits the current selection to the classifier ensemble. An empty
    /// selection is a synchronous validation error and never reaches the
    /// network; any request failure resolves to `Failed` with the generic
    /// message. The phase always leaves `InFlight` once the call settles.
    pub async fn submit_prediction(&self) {
        let symptoms = {
            let mut guard = self.inner.lock().await;
            if guard.selection.is_empty() {
                guard.error = Some(EMPTY_SELECTION_MESSAGE.to_string());
                let _ = self
                    .events
                    .send(SessionEvent::Error(EMPTY_SELECTION_MESSAGE.to_string()));
                return;
            }
            guard.error = None;
            guard.phase = PredictionPhase::InFlight;
            guard.selection.join(",")
        };
        let _ = self.events.send(SessionEvent::PredictionStarted);
        info!(symptoms = %symptoms, "prediction requested");

        // The lock is released while the request is outstanding so search
        // and selection stay responsive.
        let outcome = self.request_prediction(&symptoms).await;

        let mut guard = self.inner.lock().await;
        match outcome {
            Ok(prediction) => {
                info!(consensus = %prediction.final_prediction, "prediction ready");
                guard.phase = PredictionPhase::Succeeded;
                guard.result = Some(prediction.clone());
                guard.error = None;
                let _ = self.events.send(SessionEvent::PredictionReady(prediction));
            }
            Err(err) => {
                warn!(error = %err, "prediction request failed");
                guard.phase = PredictionPhase::Failed;
                guard.error = Some(PREDICTION_FAILED_MESSAGE.to_string());
                let _ = self.events.send(SessionEvent::PredictionFailed(
                    PREDICTION_FAILED_MESSAGE.to_string(),
                ));
            }
        }
    }

    async fn request_prediction(&self, symptoms: &str) -> Result<PredictionResponse, PredictionError> {
        let response = self
            .http
            .post(format!("{}/predict", self.base_url()))
            .json(&PredictRequest {
                symptoms: symptoms.to_string(),
            })
            .send()
            .await
            .map_err(PredictionError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(PredictionError::Status(status));
        }
        response
            .json::<PredictionResponse>()
            .await
            .map_err(PredictionError::Body)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/search_tests.rs"]
mod search_tests;
