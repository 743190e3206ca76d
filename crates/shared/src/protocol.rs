use serde::{Deserialize, Serialize};

/// Body of `POST /predict`. The selected symptoms travel as a single
/// comma-joined string in selection (insertion) order, which is what the
/// ensemble service expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub symptoms: String,
}

/// Successful `POST /predict` response: one label per classifier plus the
/// ensemble's consensus label. Field names follow the service contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub rf_model_prediction: String,
    pub naive_bayes_prediction: String,
    pub svm_model_prediction: String,
    pub final_prediction: String,
}
