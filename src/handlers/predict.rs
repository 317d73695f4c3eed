use actix_web::{web, HttpResponse};
use std::sync::Arc;
use tracing::{info, warn};

use crate::AppState;
use loan_eligibility::models::{LoanApplication, PredictResponse};
use loan_eligibility::{LoanError, Record};

/// Assess a typed loan application
pub async fn predict_loan(
    state: web::Data<Arc<AppState>>,
    req: web::Json<LoanApplication>,
) -> Result<HttpResponse, LoanError> {
    let assessment = state.context.assess(&req).inspect_err(|e| {
        warn!("Rejected application: {}", e);
    })?;

    info!(
        "Assessed application: {} at {}",
        assessment.eligibility,
        assessment.interest_rate_display()
    );
    Ok(HttpResponse::Ok().json(PredictResponse::from(assessment)))
}

/// Assess a raw record keyed by column name
///
/// Absent columns come back as `MissingField` rather than a deserialization
/// failure; bounds are checked as for typed applications.
pub async fn predict_record(
    state: web::Data<Arc<AppState>>,
    req: web::Json<Record>,
) -> Result<HttpResponse, LoanError> {
    let assessment = state.context.assess_record(&req)?;
    Ok(HttpResponse::Ok().json(PredictResponse::from(assessment)))
}

/// Known category labels per field, for building input forms
pub async fn categories(state: web::Data<Arc<AppState>>) -> HttpResponse {
    let registry = state.context.registry();
    let labels: std::collections::BTreeMap<&str, &[String]> = registry
        .fields()
        .filter_map(|field| registry.labels(field).map(|labels| (field, labels)))
        .collect();

    HttpResponse::Ok().json(labels)
}
