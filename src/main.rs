mod handlers;
mod models;
mod services;
mod webhook;

use anyhow::Result;
use dotenv::dotenv;
use std::env;
use std::sync::Arc;

use handlers::{FoodScanHandler, PrescriptionScanHandler};
use services::{
    GoogleTokenMinter, GoogleVisionClient, OpenFoodFactsClient, ServiceAccountKey, TokenProvider,
    VisionAnalyzer,
};
use webhook::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    dotenv().ok();

    log::info!("🚀 Starting Diascan image analysis service...");

    // Credentials are a hard startup requirement, not a per-request concern
    let credentials_json = env::var("GOOGLE_CLOUD_CREDENTIALS")
        .expect("GOOGLE_CLOUD_CREDENTIALS must be set (service account JSON blob)");
    let key = ServiceAccountKey::from_json(&credentials_json)
        .expect("GOOGLE_CLOUD_CREDENTIALS is not valid service account JSON");
    log::info!("✅ Service account loaded: {} ({})", key.client_email, key.project_id);

    let tokens: Arc<dyn TokenProvider> = Arc::new(GoogleTokenMinter::new(key));
    let vision: Arc<dyn VisionAnalyzer> = Arc::new(GoogleVisionClient::new());
    let nutrition = Arc::new(OpenFoodFactsClient::new());
    log::info!("✅ Vision and nutrition clients initialized");

    let state = Arc::new(AppState {
        food: FoodScanHandler::new(tokens.clone(), vision.clone(), nutrition),
        prescription: PrescriptionScanHandler::new(tokens, vision),
    });

    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("0.0.0.0:{}", port);
    let app = create_router(state);

    log::info!("🌐 Listening on {}", addr);
    log::info!("   POST /analyze-food");
    log::info!("   POST /analyze-prescription");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
