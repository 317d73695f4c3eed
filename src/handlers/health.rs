use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

use crate::AppState;
use loan_eligibility::models::HealthResponse;
use loan_eligibility::FeaturePipeline;

/// Health check endpoint
///
/// The server only starts with every artifact loaded, so `model_loaded`
/// reflects whether the encoders cover any categorical field.
pub async fn health_check(state: web::Data<Arc<AppState>>) -> impl Responder {
    let registry = state.context.registry();
    let encoded_fields: Vec<String> = registry.fields().map(str::to_string).collect();

    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_loaded: !encoded_fields.is_empty(),
        feature_count: FeaturePipeline::feature_names().len(),
        encoded_fields,
    })
}
