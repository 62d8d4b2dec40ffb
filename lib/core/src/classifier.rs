//! Classifier contract
//!
//! The model itself is opaque. Anything that maps a schema-ordered feature
//! vector to a class index can serve predictions; probability output is an
//! optional capability queried with [`Classifier::supports_probabilities`].

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::error::ClassifierError;
use crate::record::{FeatureRecord, FeatureValue};

/// Tolerance used when checking that a distribution sums to one
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// A trained classifier
///
/// Implementations must be safe to call concurrently from many requests.
pub trait Classifier: Send + Sync {
    /// Predict the class index for one feature vector in schema order
    fn predict(&self, features: &[FeatureValue]) -> Result<usize, ClassifierError>;

    /// Number of classes the model distinguishes
    fn n_classes(&self) -> usize;

    /// Short identifier of the model family, for status reporting
    fn kind(&self) -> &'static str;

    /// Whether [`Classifier::predict_probability`] is available
    fn supports_probabilities(&self) -> bool {
        false
    }

    /// Per-class probabilities, indexed like the label set
    fn predict_probability(&self, _features: &[FeatureValue]) -> Result<Vec<f64>, ClassifierError> {
        Err(ClassifierError::Unsupported("probability output"))
    }
}

/// Maps class indices to human-readable labels and back
#[derive(Debug, Clone, PartialEq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self, ClassifierError> {
        if classes.is_empty() {
            return Err(ClassifierError::InvalidLabels("no classes".to_string()));
        }
        for (i, class) in classes.iter().enumerate() {
            if classes[..i].contains(class) {
                return Err(ClassifierError::InvalidLabels(format!("duplicate class '{class}'")));
            }
        }
        Ok(Self { classes })
    }

    #[inline]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Class index -> label
    pub fn inverse_transform(&self, index: usize) -> Result<&str, ClassifierError> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(ClassifierError::UnknownClass {
                index,
                classes: self.classes.len(),
            })
    }

    /// Label -> class index
    pub fn transform(&self, label: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == label)
    }
}

/// A classifier paired with the label set it predicts over
pub struct Model {
    classifier: Box<dyn Classifier>,
    labels: LabelEncoder,
}

impl Model {
    pub fn new(classifier: Box<dyn Classifier>, labels: LabelEncoder) -> Result<Self, ClassifierError> {
        if classifier.n_classes() != labels.len() {
            return Err(ClassifierError::InvalidLabels(format!(
                "classifier has {} classes but {} labels were given",
                classifier.n_classes(),
                labels.len()
            )));
        }
        Ok(Self { classifier, labels })
    }

    #[inline]
    pub fn labels(&self) -> &LabelEncoder {
        &self.labels
    }

    #[inline]
    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Classify a normalized record
    ///
    /// Probabilities are attached only when the classifier supports them,
    /// and are checked to form a distribution before being returned.
    pub fn predict(&self, record: FeatureRecord) -> Result<Prediction, ClassifierError> {
        let index = self.classifier.predict(record.values())?;
        let label = self.labels.inverse_transform(index)?.to_string();

        let class_probabilities = if self.classifier.supports_probabilities() {
            let proba = self.classifier.predict_probability(record.values())?;
            check_distribution(&proba, self.labels.len())?;
            Some(ClassProbabilities(
                self.labels.classes().iter().cloned().zip(proba).collect(),
            ))
        } else {
            None
        };

        Ok(Prediction {
            prediction: label,
            input_data: record,
            class_probabilities,
        })
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("kind", &self.classifier.kind())
            .field("labels", &self.labels)
            .finish()
    }
}

fn check_distribution(proba: &[f64], classes: usize) -> Result<(), ClassifierError> {
    if proba.len() != classes {
        return Err(ClassifierError::InvalidProbabilities(format!(
            "{} values for {} classes",
            proba.len(),
            classes
        )));
    }
    if let Some(p) = proba.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(ClassifierError::InvalidProbabilities(format!("invalid entry {p}")));
    }
    let sum: f64 = proba.iter().sum();
    if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(ClassifierError::InvalidProbabilities(format!("sums to {sum}")));
    }
    Ok(())
}

/// Labelled prediction for one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Predicted label
    pub prediction: String,
    /// The normalized record the model saw
    pub input_data: FeatureRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_probabilities: Option<ClassProbabilities>,
}

/// Label -> probability pairs, in label-set order
#[derive(Debug, Clone, PartialEq)]
pub struct ClassProbabilities(pub Vec<(String, f64)>);

impl ClassProbabilities {
    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, p)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(l, p)| (l.as_str(), *p))
    }
}

impl Serialize for ClassProbabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, p) in &self.0 {
            map.serialize_entry(label, p)?;
        }
        map.end()
    }
}
