use segserve_core::{Classifier, ClassifierError, FeatureValue, LabelEncoder, Model};

use crate::artifact::{ArtifactError, ForestArtifact, Voting, RANDOM_FOREST_KIND};
use crate::tree::DecisionTree;

/// Ensemble of decision trees
///
/// Soft voting averages the trees' leaf distributions, hard voting counts
/// one vote per tree. Ties go to the lowest class index.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
    voting: Voting,
}

impl RandomForest {
    pub fn from_artifact(artifact: &ForestArtifact) -> Result<Self, ArtifactError> {
        if artifact.kind != RANDOM_FOREST_KIND {
            return Err(ArtifactError::UnsupportedKind(artifact.kind.clone()));
        }
        if artifact.trees.is_empty() {
            return Err(ArtifactError::NoTrees);
        }

        let n_classes = artifact.classes.len();
        let trees = artifact
            .trees
            .iter()
            .enumerate()
            .map(|(i, tree)| DecisionTree::build(i, tree, artifact.n_features, n_classes))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            trees,
            n_features: artifact.n_features,
            n_classes,
            voting: artifact.voting,
        })
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[inline]
    pub fn voting(&self) -> Voting {
        self.voting
    }

    fn check_width(&self, features: &[FeatureValue]) -> Result<(), ClassifierError> {
        if features.len() != self.n_features {
            return Err(ClassifierError::FeatureCount {
                expected: self.n_features,
                actual: features.len(),
            });
        }
        Ok(())
    }

    fn mean_distribution(&self, features: &[FeatureValue]) -> Result<Vec<f64>, ClassifierError> {
        let mut sum = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in sum.iter_mut().zip(tree.distribution(features)?) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        Ok(sum.into_iter().map(|s| s / n).collect())
    }

    fn votes(&self, features: &[FeatureValue]) -> Result<Vec<f64>, ClassifierError> {
        let mut votes = vec![0.0; self.n_classes];
        for tree in &self.trees {
            votes[argmax(tree.distribution(features)?)] += 1.0;
        }
        Ok(votes)
    }
}

impl Classifier for RandomForest {
    fn predict(&self, features: &[FeatureValue]) -> Result<usize, ClassifierError> {
        self.check_width(features)?;
        let scores = match self.voting {
            Voting::Soft => self.mean_distribution(features)?,
            Voting::Hard => self.votes(features)?,
        };
        Ok(argmax(&scores))
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn kind(&self) -> &'static str {
        RANDOM_FOREST_KIND
    }

    fn supports_probabilities(&self) -> bool {
        self.voting == Voting::Soft
    }

    fn predict_probability(&self, features: &[FeatureValue]) -> Result<Vec<f64>, ClassifierError> {
        if self.voting == Voting::Hard {
            return Err(ClassifierError::Unsupported("probability output with hard voting"));
        }
        self.check_width(features)?;
        self.mean_distribution(features)
    }
}

/// First index of the maximum score
fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, s) in scores.iter().enumerate().skip(1) {
        if *s > scores[best] {
            best = i;
        }
    }
    best
}

/// Build a servable [`Model`] from an artifact
pub fn load_model(artifact: &ForestArtifact) -> Result<Model, ArtifactError> {
    let labels = LabelEncoder::new(artifact.classes.clone())?;
    let forest = RandomForest::from_artifact(artifact)?;
    Ok(Model::new(Box::new(forest), labels)?)
}
