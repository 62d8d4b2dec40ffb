//! # segserve API
//!
//! HTTP surface of segserve, built on actix-web:
//!
//! - `GET /` - service description
//! - `GET /health` - model and schema status
//! - `POST /predict` - classify a JSON payload
//! - `POST /model/reload`, `PUT /model` - model lifecycle (admin token)
//! - `GET /ui`, `POST /ui/predict` - demo form

mod form;
mod insight;
pub mod rest;

pub use insight::insight_for;
pub use rest::{routes, AppState, RestApi};
