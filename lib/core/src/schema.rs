//! Feature schema definitions
//!
//! Declares the ordered list of features the classifier consumes.
//! Each field is either numeric or categorical; categorical fields carry
//! the closed set of values the model was trained on.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Ordered feature schema
///
/// Field order is significant: it is the positional order in which values
/// are handed to the classifier. Built once at startup and shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawSchema")]
pub struct FeatureSchema {
    fields: Vec<FieldSpec>,

    /// Canonical field name -> position in `fields`
    #[serde(skip)]
    index: AHashMap<String, usize>,
}

#[derive(Deserialize)]
struct RawSchema {
    fields: Vec<FieldSpec>,
}

impl TryFrom<RawSchema> for FeatureSchema {
    type Error = SchemaError;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        FeatureSchema::new(raw.fields)
    }
}

impl FeatureSchema {
    /// Create a schema, rejecting definitions the normalizer could not honour
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::EmptySchema);
        }

        let mut index = AHashMap::with_capacity(fields.len());
        for (position, field) in fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(SchemaError::BlankName(position));
            }

            let canonical = canonical_key(&field.name);
            if canonical.is_empty() {
                return Err(SchemaError::NoCanonicalForm(field.name.clone()));
            }

            match field.field_type {
                FieldType::Numeric if !field.values.is_empty() => {
                    return Err(SchemaError::ValuesOnNumeric(field.name.clone()));
                }
                FieldType::Categorical if field.values.is_empty() => {
                    return Err(SchemaError::EmptyCategories(field.name.clone()));
                }
                _ => {}
            }

            if let Some(&other) = index.get(&canonical) {
                let other: &FieldSpec = &fields[other];
                return Err(SchemaError::CanonicalCollision {
                    first: other.name.clone(),
                    second: field.name.clone(),
                });
            }
            index.insert(canonical, position);
        }

        Ok(Self { fields, index })
    }

    /// Parse a schema from its JSON representation
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(json).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    /// The streaming-segment schema the bundled model was trained against
    pub fn streaming_default() -> Self {
        let fields = vec![
            FieldSpec::numeric("Longest_Session_Duration"),
            FieldSpec::numeric("Minutes_Streamed_Per_Day"),
            FieldSpec::categorical("Subscription_Type", ["Premium", "Free"]),
        ];
        // Static definition, always valid
        match Self::new(fields) {
            Ok(schema) => schema,
            Err(e) => unreachable!("built-in schema is invalid: {e}"),
        }
    }

    #[inline]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field by its declared name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Position of the field whose canonical form equals `canonical`
    #[inline]
    pub fn position_of_canonical(&self, canonical: &str) -> Option<usize> {
        self.index.get(canonical).copied()
    }

    /// Declared field names in schema order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn numeric_fields(&self) -> Vec<&str> {
        self.names_of(FieldType::Numeric)
    }

    pub fn categorical_fields(&self) -> Vec<&str> {
        self.names_of(FieldType::Categorical)
    }

    fn names_of(&self, field_type: FieldType) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.field_type == field_type)
            .map(|f| f.name.as_str())
            .collect()
    }
}

/// Reduce a key to its canonical form: lower-case, separators removed
///
/// `subscriptionType`, `subscription_type` and `SUBSCRIPTION-TYPE` all map
/// to `subscriptiontype`.
pub fn canonical_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// A single field of the feature schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    /// Field name as the model knows it
    pub name: String,

    /// Semantic type of the field
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Permitted values (categorical fields only), in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl FieldSpec {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Numeric,
            values: Vec::new(),
        }
    }

    pub fn categorical<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            field_type: FieldType::Categorical,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Case-sensitive membership test against the permitted values
    #[inline]
    pub fn permits(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

/// Field type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Parsed as a finite floating-point number
    Numeric,
    /// Taken as a string and checked against the permitted set
    Categorical,
}

/// Errors that can occur while building a schema
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum SchemaError {
    #[error("Schema cannot be empty")]
    EmptySchema,

    #[error("Field at position {0} has a blank name")]
    BlankName(usize),

    #[error("Field '{0}' has no alphanumeric characters")]
    NoCanonicalForm(String),

    #[error("Numeric field '{0}' cannot declare permitted values")]
    ValuesOnNumeric(String),

    #[error("Categorical field '{0}' must declare at least one permitted value")]
    EmptyCategories(String),

    #[error("Fields '{first}' and '{second}' are indistinguishable once canonicalized")]
    CanonicalCollision { first: String, second: String },

    #[error("Invalid schema definition: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_key() {
        assert_eq!(canonical_key("Subscription_Type"), "subscriptiontype");
        assert_eq!(canonical_key("subscriptionType"), "subscriptiontype");
        assert_eq!(canonical_key("SUBSCRIPTION-TYPE"), "subscriptiontype");
        assert_eq!(canonical_key("Repeat Song Rate (%)"), "repeatsongrate");
    }

    #[test]
    fn test_default_schema() {
        let schema = FeatureSchema::streaming_default();
        assert_eq!(
            schema.field_names(),
            vec!["Longest_Session_Duration", "Minutes_Streamed_Per_Day", "Subscription_Type"]
        );
        assert_eq!(schema.numeric_fields().len(), 2);
        assert_eq!(schema.categorical_fields(), vec!["Subscription_Type"]);
        assert_eq!(schema.position_of_canonical("minutesstreamedperday"), Some(1));
    }

    #[test]
    fn test_empty_schema_error() {
        assert_eq!(FeatureSchema::new(Vec::new()), Err(SchemaError::EmptySchema));
    }

    #[test]
    fn test_canonical_collision() {
        let result = FeatureSchema::new(vec![
            FieldSpec::numeric("Minutes_Streamed"),
            FieldSpec::numeric("minutes-streamed"),
        ]);
        assert!(matches!(result, Err(SchemaError::CanonicalCollision { .. })));
    }

    #[test]
    fn test_categorical_needs_values() {
        let result = FeatureSchema::new(vec![FieldSpec {
            name: "Plan".to_string(),
            field_type: FieldType::Categorical,
            values: Vec::new(),
        }]);
        assert_eq!(result, Err(SchemaError::EmptyCategories("Plan".to_string())));
    }

    #[test]
    fn test_from_json() {
        let schema = FeatureSchema::from_json(
            r#"{"fields": [
                {"name": "Age", "type": "numeric"},
                {"name": "Listening_Time", "type": "categorical", "values": ["Morning", "Afternoon", "Night"]}
            ]}"#,
        )
        .unwrap();

        assert_eq!(schema.len(), 2);
        let field = schema.field("Listening_Time").unwrap();
        assert!(field.permits("Night"));
        assert!(!field.permits("night"));
    }

    #[test]
    fn test_from_json_runs_validation() {
        let err = FeatureSchema::from_json(
            r#"{"fields": [{"name": "Age", "type": "numeric", "values": ["1"]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::Parse(msg) if msg.contains("Age")));
    }
}
