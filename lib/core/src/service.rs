use serde_json::{Map, Value};

use crate::classifier::{Model, Prediction};
use crate::error::PredictError;
use crate::normalize::normalize;
use crate::schema::FeatureSchema;

/// Normalize a payload and run it through the model
///
/// Validation runs first and does not need a model, so a malformed request
/// is reported as such even while no model is loaded.
pub fn predict(
    payload: &Map<String, Value>,
    schema: &FeatureSchema,
    model: Option<&Model>,
) -> Result<Prediction, PredictError> {
    let record = normalize(payload, schema)?;
    let model = model.ok_or(PredictError::ClassifierUnavailable)?;
    Ok(model.predict(record)?)
}
