use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// A validated, type-coerced feature value
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Numeric(f64),
    Categorical(String),
}

impl FeatureValue {
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Numeric(v) => Some(*v),
            FeatureValue::Categorical(_) => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FeatureValue::Numeric(_) => None,
            FeatureValue::Categorical(s) => Some(s),
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Numeric(v) => write!(f, "{v}"),
            FeatureValue::Categorical(s) => f.write_str(s),
        }
    }
}

impl Serialize for FeatureValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FeatureValue::Numeric(v) => serializer.serialize_f64(*v),
            FeatureValue::Categorical(s) => serializer.serialize_str(s),
        }
    }
}

/// Normalized feature record
///
/// Holds exactly one value per schema field, in schema order. Only the
/// normalizer constructs records, so a record always matches the schema it
/// was built against.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    names: Vec<String>,
    values: Vec<FeatureValue>,
}

impl FeatureRecord {
    pub(crate) fn new(names: Vec<String>, values: Vec<FeatureValue>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    /// Values in schema order, as the classifier consumes them
    #[inline]
    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }

    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// Serialized as a JSON object in schema order
impl Serialize for FeatureRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_lookup_and_order() {
        let record = FeatureRecord::new(
            vec!["b".to_string(), "a".to_string()],
            vec![FeatureValue::Numeric(2.5), FeatureValue::Categorical("x".to_string())],
        );

        assert_eq!(record.get("a"), Some(&FeatureValue::Categorical("x".to_string())));
        assert_eq!(record.get("c"), None);
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"b":2.5,"a":"x"}"#);
    }
}
