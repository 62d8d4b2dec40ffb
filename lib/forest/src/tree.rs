use segserve_core::{ClassifierError, FeatureValue};

use crate::artifact::{ArtifactError, NodeArtifact, TreeArtifact};

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Match {
        feature: usize,
        value: String,
        left: usize,
        right: usize,
    },
    /// Normalized class distribution
    Leaf(Vec<f64>),
}

/// A validated decision tree
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Validate one tree of an artifact and normalize its leaves
    pub(crate) fn build(
        tree: usize,
        artifact: &TreeArtifact,
        n_features: usize,
        n_classes: usize,
    ) -> Result<Self, ArtifactError> {
        if artifact.nodes.is_empty() {
            return Err(ArtifactError::EmptyTree(tree));
        }
        let len = artifact.nodes.len();

        let check_child = |node: usize, child: usize| {
            if child <= node || child >= len {
                Err(ArtifactError::BadChild { tree, node, child })
            } else {
                Ok(())
            }
        };
        let check_feature = |node: usize, feature: usize| {
            if feature >= n_features {
                Err(ArtifactError::FeatureOutOfRange { tree, node, feature, n_features })
            } else {
                Ok(())
            }
        };

        let mut nodes = Vec::with_capacity(len);
        for (i, node) in artifact.nodes.iter().enumerate() {
            let built = match node {
                NodeArtifact::Split { feature, threshold, left, right } => {
                    check_feature(i, *feature)?;
                    check_child(i, *left)?;
                    check_child(i, *right)?;
                    if !threshold.is_finite() {
                        return Err(ArtifactError::BadThreshold { tree, node: i });
                    }
                    Node::Split {
                        feature: *feature,
                        threshold: *threshold,
                        left: *left,
                        right: *right,
                    }
                }
                NodeArtifact::Match { feature, value, left, right } => {
                    check_feature(i, *feature)?;
                    check_child(i, *left)?;
                    check_child(i, *right)?;
                    Node::Match {
                        feature: *feature,
                        value: value.clone(),
                        left: *left,
                        right: *right,
                    }
                }
                NodeArtifact::Leaf { counts } => {
                    if counts.len() != n_classes {
                        return Err(ArtifactError::LeafWidth {
                            tree,
                            node: i,
                            expected: n_classes,
                            actual: counts.len(),
                        });
                    }
                    let total: f64 = counts.iter().sum();
                    let invalid = counts.iter().any(|c| !c.is_finite() || *c < 0.0);
                    // Finite counts can still overflow to an infinite sum
                    if invalid || !total.is_finite() || total <= 0.0 {
                        return Err(ArtifactError::BadCounts { tree, node: i });
                    }
                    Node::Leaf(counts.iter().map(|c| c / total).collect())
                }
            };
            nodes.push(built);
        }

        Ok(Self { nodes })
    }

    /// Walk from the root to a leaf and return its class distribution
    pub fn distribution(&self, features: &[FeatureValue]) -> Result<&[f64], ClassifierError> {
        let mut current = 0;
        loop {
            current = match &self.nodes[current] {
                Node::Leaf(dist) => return Ok(dist.as_slice()),
                Node::Split { feature, threshold, left, right } => {
                    let x = feature_at(features, *feature)?
                        .as_f64()
                        .ok_or(ClassifierError::FeatureKind { index: *feature, expected: "numeric" })?;
                    if x <= *threshold { *left } else { *right }
                }
                Node::Match { feature, value, left, right } => {
                    let x = feature_at(features, *feature)?
                        .as_str()
                        .ok_or(ClassifierError::FeatureKind { index: *feature, expected: "categorical" })?;
                    if x == value.as_str() { *left } else { *right }
                }
            };
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

fn feature_at(features: &[FeatureValue], index: usize) -> Result<&FeatureValue, ClassifierError> {
    features.get(index).ok_or(ClassifierError::FeatureCount {
        expected: index + 1,
        actual: features.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> TreeArtifact {
        TreeArtifact {
            nodes: vec![
                NodeArtifact::Match { feature: 1, value: "Premium".to_string(), left: 1, right: 2 },
                NodeArtifact::Leaf { counts: vec![1.0, 3.0] },
                NodeArtifact::Split { feature: 0, threshold: 30.0, left: 3, right: 4 },
                NodeArtifact::Leaf { counts: vec![5.0, 0.0] },
                NodeArtifact::Leaf { counts: vec![2.0, 2.0] },
            ],
        }
    }

    #[test]
    fn test_traversal() {
        let tree = DecisionTree::build(0, &stump(), 2, 2).unwrap();

        let premium = [FeatureValue::Numeric(10.0), FeatureValue::Categorical("Premium".into())];
        assert_eq!(tree.distribution(&premium).unwrap(), &[0.25, 0.75]);

        let free_short = [FeatureValue::Numeric(30.0), FeatureValue::Categorical("Free".into())];
        assert_eq!(tree.distribution(&free_short).unwrap(), &[1.0, 0.0]);

        let free_long = [FeatureValue::Numeric(30.5), FeatureValue::Categorical("Free".into())];
        assert_eq!(tree.distribution(&free_long).unwrap(), &[0.5, 0.5]);
    }

    #[test]
    fn test_wrong_feature_kind() {
        let tree = DecisionTree::build(0, &stump(), 2, 2).unwrap();
        let swapped = [FeatureValue::Categorical("Free".into()), FeatureValue::Numeric(1.0)];
        assert_eq!(
            tree.distribution(&swapped),
            Err(ClassifierError::FeatureKind { index: 1, expected: "categorical" })
        );
    }

    #[test]
    fn test_short_feature_vector() {
        let tree = DecisionTree::build(0, &stump(), 2, 2).unwrap();
        let short = [FeatureValue::Numeric(1.0)];
        assert!(matches!(tree.distribution(&short), Err(ClassifierError::FeatureCount { .. })));
    }

    #[test]
    fn test_backward_child_rejected() {
        let mut artifact = stump();
        artifact.nodes[2] = NodeArtifact::Split { feature: 0, threshold: 1.0, left: 0, right: 4 };
        assert!(matches!(
            DecisionTree::build(3, &artifact, 2, 2),
            Err(ArtifactError::BadChild { tree: 3, node: 2, child: 0 })
        ));
    }

    #[test]
    fn test_leaf_validation() {
        let mut artifact = stump();
        artifact.nodes[3] = NodeArtifact::Leaf { counts: vec![0.0, 0.0] };
        assert!(matches!(
            DecisionTree::build(0, &artifact, 2, 2),
            Err(ArtifactError::BadCounts { node: 3, .. })
        ));

        assert!(matches!(
            DecisionTree::build(0, &stump(), 2, 3),
            Err(ArtifactError::LeafWidth { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn test_overflowing_leaf_total_rejected() {
        let mut artifact = stump();
        artifact.nodes[4] = NodeArtifact::Leaf { counts: vec![1e308, 1e308] };
        assert!(matches!(
            DecisionTree::build(0, &artifact, 2, 2),
            Err(ArtifactError::BadCounts { node: 4, .. })
        ));
    }

    #[test]
    fn test_feature_out_of_range() {
        assert!(matches!(
            DecisionTree::build(0, &stump(), 1, 2),
            Err(ArtifactError::FeatureOutOfRange { feature: 1, .. })
        ));
    }
}
