//! # segserve
//!
//! A prediction server for streaming-segment classifiers.
//!
//! segserve accepts loosely-formatted feature payloads, reconciles them
//! against a typed feature schema, validates every value, and runs a
//! trained classifier that can be swapped at runtime without a restart.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! segserve --model ./model/forest.json --http-port 5000
//! curl -X POST localhost:5000/predict \
//!      -H 'content-type: application/json' \
//!      -d '{"longestsessionduration": 120, "minutes streamed per day": "45", "Subscription_Type": "Premium"}'
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use segserve::prelude::*;
//!
//! let schema = FeatureSchema::streaming_default();
//! let store = ModelStore::new("./model/forest.json", schema.len());
//! store.load().unwrap();
//!
//! let payload = serde_json::json!({
//!     "Longest_Session_Duration": 120,
//!     "Minutes_Streamed_Per_Day": 45,
//!     "Subscription_Type": "Premium"
//! });
//! let current = store.current();
//! let prediction = predict(
//!     payload.as_object().unwrap(),
//!     &schema,
//!     current.as_deref().map(LoadedModel::model),
//! ).unwrap();
//! println!("{}", prediction.prediction);
//! ```
//!
//! ## Crate Structure
//!
//! - `segserve-core` - Schema, normalization, classifier contract, prediction service
//! - `segserve-forest` - Random-forest classifier loaded from a JSON artifact
//! - `segserve-storage` - Artifact I/O and the hot-swappable model store
//! - `segserve-api` - REST API and demo form

// Re-export core types
pub use segserve_core::{
    canonical_key, normalize, predict,
    ClassProbabilities, Classifier, ClassifierError, FeatureRecord, FeatureSchema,
    FeatureValue, FieldSpec, FieldType, LabelEncoder, Model, PredictError, Prediction,
    ValidationError,
};

// Re-export the forest
pub use segserve_forest::{load_model, ArtifactError, ForestArtifact, RandomForest};

// Re-export storage
pub use segserve_storage::{load_schema, LoadedModel, ModelInfo, ModelStore};

// Re-export API
pub use segserve_api::{routes, AppState, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        normalize, predict,
        Classifier, FeatureRecord, FeatureSchema, FeatureValue,
        Model, PredictError, Prediction, ValidationError,
        ForestArtifact, RandomForest,
        LoadedModel, ModelStore,
        AppState, RestApi,
    };
}
