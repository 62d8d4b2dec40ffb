//! # segserve Core
//!
//! Core library for the segserve prediction service.
//!
//! This crate holds everything between a raw client payload and a labelled
//! prediction:
//!
//! - [`FeatureSchema`] - Ordered, typed feature definitions
//! - [`normalize`] - Key reconciliation, coercion and domain validation
//! - [`FeatureRecord`] - A validated, schema-ordered feature vector
//! - [`Classifier`] - The contract a trained model has to fulfil
//! - [`Model`] - A classifier paired with its [`LabelEncoder`]
//!
//! ## Example
//!
//! ```rust
//! use segserve_core::{normalize, FeatureSchema, FeatureValue};
//!
//! let schema = FeatureSchema::streaming_default();
//! let payload = serde_json::json!({
//!     "longestsessionduration": "120",
//!     "MINUTES_STREAMED_PER_DAY": 45,
//!     "subscription_type": "Premium"
//! });
//!
//! let record = normalize(payload.as_object().unwrap(), &schema).unwrap();
//! assert_eq!(record.get("Longest_Session_Duration"), Some(&FeatureValue::Numeric(120.0)));
//! ```

pub mod classifier;
pub mod error;
pub mod normalize;
pub mod record;
pub mod schema;
pub mod service;

pub use classifier::{ClassProbabilities, Classifier, LabelEncoder, Model, Prediction, PROBABILITY_TOLERANCE};
pub use error::{ClassifierError, PredictError, ValidationError};
pub use normalize::normalize;
pub use record::{FeatureRecord, FeatureValue};
pub use schema::{canonical_key, FeatureSchema, FieldSpec, FieldType, SchemaError};
pub use service::predict;
