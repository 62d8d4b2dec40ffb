//! Demo form endpoints
//!
//! `GET /ui` renders a plain HTML form generated from the schema, and
//! `POST /ui/predict` accepts its url-encoded submission. Submissions go
//! through the same normalize + predict path as `/predict`; form values all
//! arrive as strings, which the normalizer parses for numeric fields.

use actix_web::error::InternalError;
use actix_web::{web, HttpResponse, Result as ActixResult};
use segserve_core::{FeatureSchema, FieldType, Prediction};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt::Write;

use crate::insight::insight_for;
use crate::rest::{prediction_error_response, AppState};

#[derive(Serialize)]
struct FormResult {
    #[serde(flatten)]
    prediction: Prediction,
    insight: &'static str,
}

pub(crate) fn form_config() -> web::FormConfig {
    web::FormConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(json!({
            "error": format!("Invalid form submission: {err}")
        }));
        InternalError::from_response(err, response).into()
    })
}

pub(crate) async fn form_page(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_form(&state.schema)))
}

pub(crate) async fn submit(
    state: web::Data<AppState>,
    form: web::Form<HashMap<String, String>>,
) -> ActixResult<HttpResponse> {
    let payload: Map<String, Value> = form
        .into_inner()
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();

    match state.predict(&payload) {
        Ok(prediction) => {
            let insight = insight_for(&prediction.prediction);
            Ok(HttpResponse::Ok().json(FormResult { prediction, insight }))
        }
        Err(e) => Ok(prediction_error_response(e)),
    }
}

fn render_form(schema: &FeatureSchema) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Streaming Segment Predictor</title></head>\n<body>\n\
         <h1>Streaming Segment Predictor</h1>\n<form method=\"post\" action=\"/ui/predict\">\n",
    );

    for field in schema.fields() {
        let name = escape_html(&field.name);
        let label = escape_html(&field.name.replace('_', " "));
        let _ = write!(html, "<p><label for=\"{name}\">{label}</label> ");
        match field.field_type {
            FieldType::Numeric => {
                let _ = write!(
                    html,
                    "<input type=\"number\" step=\"any\" id=\"{name}\" name=\"{name}\" required>"
                );
            }
            FieldType::Categorical => {
                let _ = write!(html, "<select id=\"{name}\" name=\"{name}\">");
                for value in &field.values {
                    let value = escape_html(value);
                    let _ = write!(html, "<option value=\"{value}\">{value}</option>");
                }
                html.push_str("</select>");
            }
        }
        html.push_str("</p>\n");
    }

    html.push_str("<button type=\"submit\">Predict</button>\n</form>\n</body>\n</html>\n");
    html
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
