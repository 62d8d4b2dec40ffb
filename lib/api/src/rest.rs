use actix_cors::Cors;
use actix_web::error::InternalError;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer, Result as ActixResult};
use segserve_core::{FeatureSchema, PredictError, Prediction};
use segserve_forest::ArtifactError;
use segserve_storage::{LoadedModel, ModelStore};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::form;

/// Upper bound for uploaded model artifacts
const MAX_ARTIFACT_BYTES: usize = 64 * 1024 * 1024;

/// Shared, read-mostly state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub schema: Arc<FeatureSchema>,
    pub models: Arc<ModelStore>,
    /// Bearer token for the model management endpoints; they are disabled
    /// when unset
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(schema: Arc<FeatureSchema>, models: Arc<ModelStore>) -> Self {
        Self {
            schema,
            models,
            admin_token: None,
        }
    }

    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    /// Normalize and classify against whatever model is current right now
    pub fn predict(&self, payload: &Map<String, Value>) -> Result<Prediction, PredictError> {
        let current = self.models.current();
        segserve_core::predict(payload, &self.schema, current.as_deref().map(LoadedModel::model))
    }

    fn authorized(&self, req: &HttpRequest) -> Result<(), HttpResponse> {
        let Some(expected) = self.admin_token.as_deref() else {
            return Err(HttpResponse::Forbidden().json(json!({
                "error": "Model management is disabled"
            })));
        };

        let presented = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        if presented.is_some_and(|token| tokens_match(token, expected)) {
            Ok(())
        } else {
            Err(HttpResponse::Unauthorized().json(json!({
                "error": "Invalid or missing admin token"
            })))
        }
    }
}

/// Compare tokens without exiting early on the first differing byte
fn tokens_match(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: AppState, host: String, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(state.clone()))
                .configure(routes)
        })
        .bind((host.as_str(), port))?
        .run()
        .await
    }
}

/// Register every endpoint; the caller provides `web::Data<AppState>`
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(form::form_config())
        .route("/", web::get().to(home))
        .route("/health", web::get().to(health))
        .route("/predict", web::post().to(predict))
        .route("/model/reload", web::post().to(reload_model))
        .service(
            web::resource("/model")
                .app_data(web::PayloadConfig::new(MAX_ARTIFACT_BYTES))
                .route(web::put().to(install_model)),
        )
        .route("/ui", web::get().to(form::form_page))
        .route("/ui/predict", web::post().to(form::submit));
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(json!({
            "error": format!("Invalid JSON payload: {err}")
        }));
        InternalError::from_response(err, response).into()
    })
}

/// Map a prediction failure to its HTTP response
///
/// Classifier failures are logged in full and reported generically.
pub(crate) fn prediction_error_response(err: PredictError) -> HttpResponse {
    match &err {
        PredictError::Validation(validation) => HttpResponse::BadRequest().json(json!({
            "error": validation.to_string(),
            "details": validation,
        })),
        PredictError::ClassifierUnavailable => {
            warn!("Prediction requested while no model is loaded");
            HttpResponse::ServiceUnavailable().json(json!({
                "error": err.to_string()
            }))
        }
        PredictError::UnexpectedClassifier(cause) => {
            error!(error = %cause, detail = ?cause, "Classifier raised an unexpected error");
            HttpResponse::InternalServerError().json(json!({
                "error": "Prediction failed due to an internal error"
            }))
        }
    }
}

async fn home() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "service": "segserve",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Streaming segment prediction API",
        "endpoints": {
            "GET /health": "model and schema status",
            "POST /predict": "classify a JSON feature payload",
            "POST /model/reload": "re-read the model artifact (admin)",
            "PUT /model": "install a new model artifact (admin)",
            "GET /ui": "demo form",
            "POST /ui/predict": "classify a form submission"
        }
    })))
}

async fn health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let schema = &state.schema;
    let current = state.models.current();

    let expected_categories: Map<String, Value> = schema
        .fields()
        .iter()
        .filter(|f| !f.values.is_empty())
        .map(|f| (f.name.clone(), json!(f.values)))
        .collect();

    let classes = current
        .as_ref()
        .map(|m| m.model().labels().classes().to_vec())
        .unwrap_or_default();

    let status = if current.is_some() { "ok" } else { "degraded" };

    Ok(HttpResponse::Ok().json(json!({
        "status": status,
        "model_loaded": current.is_some(),
        "label_encoder_classes": classes,
        "expected_features": schema.field_names(),
        "numeric_features": schema.numeric_fields(),
        "categorical_features": schema.categorical_fields(),
        "expected_categories": expected_categories,
        "model": current.map(|m| m.info()),
    })))
}

async fn predict(
    state: web::Data<AppState>,
    body: web::Json<Value>,
) -> ActixResult<HttpResponse> {
    debug!(payload = %body.0, "Received prediction request");

    let payload = match body.into_inner() {
        Value::Object(map) => map,
        _ => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "error": "Request body must be a JSON object"
            })));
        }
    };

    match state.predict(&payload) {
        Ok(prediction) => Ok(HttpResponse::Ok().json(prediction)),
        Err(e) => Ok(prediction_error_response(e)),
    }
}

async fn reload_model(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(denied) = state.authorized(&req) {
        return Ok(denied);
    }

    match state.models.reload() {
        Ok(loaded) => Ok(HttpResponse::Ok().json(json!({
            "result": true,
            "model": loaded.info()
        }))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(json!({
            "error": format!("{e:#}")
        }))),
    }
}

async fn install_model(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> ActixResult<HttpResponse> {
    if let Err(denied) = state.authorized(&req) {
        return Ok(denied);
    }

    info!(bytes = body.len(), "Installing uploaded model artifact");
    match state.models.install(&body) {
        Ok(loaded) => Ok(HttpResponse::Ok().json(json!({
            "result": true,
            "model": loaded.info()
        }))),
        Err(e) if e.downcast_ref::<ArtifactError>().is_some() => {
            Ok(HttpResponse::BadRequest().json(json!({
                "error": format!("{e:#}")
            })))
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Model install failed");
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": format!("{e:#}")
            })))
        }
    }
}
