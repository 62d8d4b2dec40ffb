//! # segserve Forest
//!
//! Tree-ensemble classifier for segserve.
//!
//! A trained random forest is exported to a JSON [`ForestArtifact`] and
//! loaded here into a [`RandomForest`], which implements the
//! [`segserve_core::Classifier`] contract. The artifact also carries the
//! label set, so [`load_model`] returns a ready-to-serve
//! [`segserve_core::Model`].
//!
//! ```rust
//! use segserve_forest::{load_model, ForestArtifact};
//!
//! let artifact = ForestArtifact::from_slice(br#"{
//!     "n_features": 1,
//!     "classes": ["Light", "Heavy"],
//!     "trees": [{"nodes": [
//!         {"split": {"feature": 0, "threshold": 60.0, "left": 1, "right": 2}},
//!         {"leaf": {"counts": [9.0, 1.0]}},
//!         {"leaf": {"counts": [2.0, 8.0]}}
//!     ]}]
//! }"#).unwrap();
//!
//! let model = load_model(&artifact).unwrap();
//! assert!(model.classifier().supports_probabilities());
//! ```

pub mod artifact;
pub mod forest;
pub mod tree;

pub use artifact::{ArtifactError, ForestArtifact, NodeArtifact, TreeArtifact, Voting};
pub use forest::{load_model, RandomForest};
pub use tree::DecisionTree;
