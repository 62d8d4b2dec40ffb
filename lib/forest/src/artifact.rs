//! Model artifact format
//!
//! A trained ensemble is shipped as a single JSON document:
//!
//! ```json
//! {
//!   "kind": "random_forest",
//!   "voting": "soft",
//!   "n_features": 3,
//!   "classes": ["Light", "Heavy"],
//!   "trees": [
//!     { "nodes": [
//!       { "split": { "feature": 1, "threshold": 60.0, "left": 1, "right": 2 } },
//!       { "leaf": { "counts": [8.0, 2.0] } },
//!       { "leaf": { "counts": [1.0, 9.0] } }
//!     ] }
//!   ]
//! }
//! ```
//!
//! Node 0 is the root of every tree. Children always point to a later node,
//! which keeps traversal finite.

use serde::{Deserialize, Serialize};

pub const RANDOM_FOREST_KIND: &str = "random_forest";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForestArtifact {
    /// Model family, currently always `random_forest`
    #[serde(default = "default_kind")]
    pub kind: String,

    #[serde(default)]
    pub voting: Voting,

    /// Width of the feature vector the trees were grown on
    pub n_features: usize,

    /// Label set, indexed like the leaf counts
    pub classes: Vec<String>,

    pub trees: Vec<TreeArtifact>,
}

fn default_kind() -> String {
    RANDOM_FOREST_KIND.to_string()
}

impl ForestArtifact {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, ArtifactError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

/// How per-tree outputs are combined
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Voting {
    /// Average leaf distributions; exposes class probabilities
    #[default]
    Soft,
    /// Majority vote over per-tree predictions; label only
    Hard,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeArtifact {
    pub nodes: Vec<NodeArtifact>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum NodeArtifact {
    /// Numeric test: `x <= threshold` goes left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Categorical test: `x == value` goes left
    Match {
        feature: usize,
        value: String,
        left: usize,
        right: usize,
    },
    /// Terminal node with per-class sample weights
    Leaf { counts: Vec<f64> },
}

/// Errors that can occur while loading an artifact
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Malformed model artifact: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported model kind '{0}'")]
    UnsupportedKind(String),

    #[error("Model has no trees")]
    NoTrees,

    #[error("Tree {0} has no nodes")]
    EmptyTree(usize),

    #[error("Tree {tree} node {node}: child {child} must point to a later node within the tree")]
    BadChild { tree: usize, node: usize, child: usize },

    #[error("Tree {tree} node {node}: feature {feature} is outside the {n_features} model features")]
    FeatureOutOfRange {
        tree: usize,
        node: usize,
        feature: usize,
        n_features: usize,
    },

    #[error("Tree {tree} node {node}: split threshold must be finite")]
    BadThreshold { tree: usize, node: usize },

    #[error("Tree {tree} node {node}: leaf has {actual} counts, expected {expected}")]
    LeafWidth {
        tree: usize,
        node: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Tree {tree} node {node}: leaf counts must be non-negative with a positive sum")]
    BadCounts { tree: usize, node: usize },

    #[error(transparent)]
    Labels(#[from] segserve_core::ClassifierError),
}
