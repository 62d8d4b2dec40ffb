use serde::Serialize;
use thiserror::Error;

/// Why a client payload could not be turned into a feature record
///
/// Every variant carries enough detail for the caller to fix the request.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("Missing required features: {}", .fields.join(", "))]
    MissingFields { fields: Vec<String> },

    #[error("Invalid data format: field '{field}' expects a number, got {value}")]
    InvalidFormat { field: String, value: String },

    #[error("Invalid value '{value}' for '{field}'. Must be one of [{}]", .permitted.join(", "))]
    InvalidCategory {
        field: String,
        value: String,
        permitted: Vec<String>,
    },
}

/// Failure reported by a classifier implementation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("Expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("Feature {index} must be {expected}")]
    FeatureKind { index: usize, expected: &'static str },

    #[error("Class index {index} is outside the label set of {classes} labels")]
    UnknownClass { index: usize, classes: usize },

    #[error("Probability output is malformed: {0}")]
    InvalidProbabilities(String),

    #[error("Invalid label set: {0}")]
    InvalidLabels(String),

    #[error("Classifier does not support {0}")]
    Unsupported(&'static str),
}

/// Everything that can go wrong between a raw payload and a labelled result
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Model is not loaded")]
    ClassifierUnavailable,

    #[error("Classifier failed: {0}")]
    UnexpectedClassifier(#[from] ClassifierError),
}

impl PredictError {
    /// True for errors the client can correct by changing the request
    pub fn is_client_error(&self) -> bool {
        matches!(self, PredictError::Validation(_))
    }
}
