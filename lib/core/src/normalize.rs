//! Input normalization
//!
//! Turns an untrusted, loosely-keyed JSON object into a [`FeatureRecord`]
//! that matches the [`FeatureSchema`] exactly.
//!
//! Stages run in a fixed order and the first failing stage decides the error:
//!
//! 1. key reconciliation through [`canonical_key`]
//! 2. presence check (reports every missing field at once)
//! 3. numeric coercion
//! 4. categorical domain check
//!
//! Payload keys that match no schema field are ignored. When several payload
//! keys reduce to the same field, the last one in the order the client sent
//! them wins.

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::record::{FeatureRecord, FeatureValue};
use crate::schema::{canonical_key, FeatureSchema, FieldType};

/// Normalize and validate a client payload against the schema
pub fn normalize(
    payload: &Map<String, Value>,
    schema: &FeatureSchema,
) -> Result<FeatureRecord, ValidationError> {
    let mut matched: Vec<Option<&Value>> = vec![None; schema.len()];
    for (key, value) in payload {
        if let Some(position) = schema.position_of_canonical(&canonical_key(key)) {
            matched[position] = Some(value);
        }
    }

    let missing: Vec<String> = schema
        .fields()
        .iter()
        .zip(&matched)
        .filter(|(_, value)| value.is_none())
        .map(|(field, _)| field.name.clone())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields { fields: missing });
    }

    let mut values = Vec::with_capacity(schema.len());
    for (field, raw) in schema.fields().iter().zip(matched.into_iter().flatten()) {
        let value = match field.field_type {
            FieldType::Numeric => match coerce_numeric(raw) {
                Some(v) => FeatureValue::Numeric(v),
                None => {
                    return Err(ValidationError::InvalidFormat {
                        field: field.name.clone(),
                        value: display_value(raw),
                    })
                }
            },
            FieldType::Categorical => FeatureValue::Categorical(display_value(raw)),
        };
        values.push(value);
    }

    for (field, value) in schema.fields().iter().zip(&values) {
        if let FeatureValue::Categorical(s) = value {
            if !field.permits(s) {
                return Err(ValidationError::InvalidCategory {
                    field: field.name.clone(),
                    value: s.clone(),
                    permitted: field.values.clone(),
                });
            }
        }
    }

    let names = schema.fields().iter().map(|f| f.name.clone()).collect();
    Ok(FeatureRecord::new(names, values))
}

/// Numbers pass through; strings are trimmed and parsed. Non-finite results
/// are rejected since no trained model accepts them.
fn coerce_numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Strings verbatim, everything else as its JSON text
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn schema() -> FeatureSchema {
        FeatureSchema::streaming_default()
    }

    #[test]
    fn test_mixed_key_styles() {
        let record = normalize(
            &payload(json!({
                "longestsessionduration": "120",
                "MINUTES_STREAMED_PER_DAY": 45,
                "subscription_type": "Premium"
            })),
            &schema(),
        )
        .unwrap();

        assert_eq!(
            record.names(),
            &["Longest_Session_Duration", "Minutes_Streamed_Per_Day", "Subscription_Type"]
        );
        assert_eq!(
            record.values(),
            &[
                FeatureValue::Numeric(120.0),
                FeatureValue::Numeric(45.0),
                FeatureValue::Categorical("Premium".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_subscription_type() {
        let err = normalize(
            &payload(json!({
                "Longest_Session_Duration": 120,
                "Minutes_Streamed_Per_Day": 45
            })),
            &schema(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            ValidationError::MissingFields {
                fields: vec!["Subscription_Type".to_string()]
            }
        );
    }

    #[test]
    fn test_missing_lists_every_field_in_schema_order() {
        let err = normalize(&payload(json!({"subscriptionType": "Free", "extra": 1})), &schema())
            .unwrap_err();

        assert_eq!(
            err,
            ValidationError::MissingFields {
                fields: vec![
                    "Longest_Session_Duration".to_string(),
                    "Minutes_Streamed_Per_Day".to_string(),
                ]
            }
        );
    }

    #[test]
    fn test_invalid_category() {
        let err = normalize(
            &payload(json!({
                "longest_session_duration": 120,
                "minutes_streamed_per_day": 45,
                "subscription_type": "Gold"
            })),
            &schema(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            ValidationError::InvalidCategory {
                field: "Subscription_Type".to_string(),
                value: "Gold".to_string(),
                permitted: vec!["Premium".to_string(), "Free".to_string()],
            }
        );
        assert_eq!(
            err.to_string(),
            "Invalid value 'Gold' for 'Subscription_Type'. Must be one of [Premium, Free]"
        );
    }

    #[test]
    fn test_category_is_case_sensitive() {
        let err = normalize(
            &payload(json!({
                "longest_session_duration": 1,
                "minutes_streamed_per_day": 1,
                "subscription_type": "premium"
            })),
            &schema(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCategory { .. }));
    }

    #[test]
    fn test_non_string_category_is_rejected_not_coerced() {
        let err = normalize(
            &payload(json!({
                "longest_session_duration": 1,
                "minutes_streamed_per_day": 1,
                "subscription_type": 7
            })),
            &schema(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCategory { value, .. } if value == "7"));
    }

    #[test]
    fn test_every_permitted_value_accepted() {
        for plan in ["Premium", "Free"] {
            let record = normalize(
                &payload(json!({
                    "Longest_Session_Duration": 3,
                    "Minutes_Streamed_Per_Day": 4,
                    "Subscription_Type": plan
                })),
                &schema(),
            )
            .unwrap();
            assert_eq!(record.get("Subscription_Type").and_then(|v| v.as_str()), Some(plan));
        }
    }

    #[test]
    fn test_invalid_numeric_format() {
        for bad in [json!("abc"), json!(""), json!(true), json!(null), json!([1]), json!("NaN"), json!("inf")] {
            let err = normalize(
                &payload(json!({
                    "Longest_Session_Duration": bad,
                    "Minutes_Streamed_Per_Day": 4,
                    "Subscription_Type": "Free"
                })),
                &schema(),
            )
            .unwrap_err();
            assert!(
                matches!(&err, ValidationError::InvalidFormat { field, .. } if field == "Longest_Session_Duration"),
                "unexpected error for {bad}: {err:?}"
            );
        }
    }

    #[test]
    fn test_numeric_strings_accepted() {
        for (raw, expected) in [
            (json!(" 12.5 "), 12.5),
            (json!("-3"), -3.0),
            (json!("1e3"), 1000.0),
            (json!(7), 7.0),
            (json!(0.25), 0.25),
        ] {
            let record = normalize(
                &payload(json!({
                    "Longest_Session_Duration": raw,
                    "Minutes_Streamed_Per_Day": 4,
                    "Subscription_Type": "Free"
                })),
                &schema(),
            )
            .unwrap();
            assert_eq!(record.values()[0], FeatureValue::Numeric(expected));
        }
    }

    #[test]
    fn test_missing_reported_before_format() {
        let err = normalize(
            &payload(json!({"Longest_Session_Duration": "abc", "Subscription_Type": "Gold"})),
            &schema(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::MissingFields { .. }));
    }

    #[test]
    fn test_format_reported_before_category() {
        let err = normalize(
            &payload(json!({
                "Longest_Session_Duration": 1,
                "Minutes_Streamed_Per_Day": "lots",
                "Subscription_Type": "Gold"
            })),
            &schema(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
    }

    #[test]
    fn test_last_matching_key_wins() {
        let body = r#"{"Longest_Session_Duration": 1, "Minutes_Streamed_Per_Day": 2,
                       "Subscription_Type": "Gold", "subscription_type": "Premium"}"#;
        let record = normalize(&serde_json::from_str(body).unwrap(), &schema()).unwrap();
        assert_eq!(
            record.get("Subscription_Type"),
            Some(&FeatureValue::Categorical("Premium".to_string()))
        );

        let body = r#"{"subscription_type": "Premium", "Longest_Session_Duration": 1,
                       "Minutes_Streamed_Per_Day": 2, "Subscription_Type": "Gold"}"#;
        let err = normalize(&serde_json::from_str(body).unwrap(), &schema()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCategory { value, .. } if value == "Gold"));
    }

    fn scramble_key(name: &str, rng: &mut StdRng) -> String {
        let mut key = String::new();
        for c in name.chars() {
            if c == '_' {
                match rng.random_range(0..4u8) {
                    0 => {}
                    1 => key.push('_'),
                    2 => key.push('-'),
                    _ => key.push(' '),
                }
            } else if rng.random_bool(0.5) {
                key.extend(c.to_uppercase());
            } else {
                key.extend(c.to_lowercase());
            }
        }
        key
    }

    #[test]
    fn test_random_key_variants_normalize() {
        let schema = FeatureSchema::new(vec![
            FieldSpec::numeric("Age"),
            FieldSpec::categorical("Streaming_Platform", ["Spotify", "Apple Music", "Tidal"]),
            FieldSpec::numeric("Number_of_Songs_Liked"),
            FieldSpec::categorical("Listening_Time", ["Morning", "Afternoon", "Night"]),
        ])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..200 {
            let mut map = Map::new();
            map.insert(scramble_key("Age", &mut rng), json!(rng.random_range(12..100u32)));
            map.insert(scramble_key("Streaming_Platform", &mut rng), json!("Apple Music"));
            map.insert(
                scramble_key("Number_of_Songs_Liked", &mut rng),
                json!(rng.random_range(0..1000u32).to_string()),
            );
            map.insert(scramble_key("Listening_Time", &mut rng), json!("Night"));

            let record = normalize(&map, &schema)
                .unwrap_or_else(|e| panic!("rejected {map:?}: {e}"));
            assert_eq!(record.names(), schema.field_names().as_slice());
        }
    }

    #[test]
    fn test_random_subsets_report_exact_missing() {
        let schema = schema();
        let names = schema.field_names();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..100 {
            let mut map = Map::new();
            let mut expected_missing = Vec::new();
            for name in &names {
                if rng.random_bool(0.5) {
                    let value = if *name == "Subscription_Type" { json!("Free") } else { json!(1) };
                    map.insert(scramble_key(name, &mut rng), value);
                } else {
                    expected_missing.push(name.to_string());
                }
            }

            match normalize(&map, &schema) {
                Ok(_) => assert!(expected_missing.is_empty()),
                Err(ValidationError::MissingFields { fields }) => assert_eq!(fields, expected_missing),
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
    }
}
