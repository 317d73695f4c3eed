use actix_web::{middleware, web, App, HttpServer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

mod handlers;

use handlers::{health, predict};
use loan_eligibility::{InferenceContext, LoanError};

/// Application state shared across handlers
pub struct AppState {
    pub context: InferenceContext,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("{}:{}", host, port);

    let model_dir = std::env::var("MODEL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("models"));

    info!("Loading models from {:?}", model_dir);

    // Without trained artifacts there is nothing to serve
    let context = match InferenceContext::load(&model_dir) {
        Ok(context) => context,
        Err(e @ LoanError::MissingArtifact { .. }) => {
            error!("{}", e);
            error!("Train the models with `loan-cli train --data <dataset.csv>` and restart");
            return Err(std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()));
        }
        Err(e) => {
            error!("Failed to load models: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()));
        }
    };

    let app_state = Arc::new(AppState { context });

    info!("Starting Loan Eligibility API server at http://{}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(health::health_check))
            .route("/categories", web::get().to(predict::categories))
            .route("/predict", web::post().to(predict::predict_loan))
            .route("/predict/record", web::post().to(predict::predict_record))
    })
    .bind(&addr)?
    .run()
    .await
}
