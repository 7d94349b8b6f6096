use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{FoodScanHandler, PrescriptionScanHandler};
use crate::models::FoodAnalysis;

const NO_FOOD_ERROR: &str =
    "No food detected in the image. Please try again with a clearer image of food.";
const UNMATCHED_ERROR: &str = "Food detected but nutrition information not found in database.";

/// Request body shared by both analysis endpoints: a data URL or raw base64
/// image payload.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub image: String,
}

pub struct AppState {
    pub food: FoodScanHandler,
    pub prescription: PrescriptionScanHandler,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    // Mobile clients call these endpoints cross-origin; mirror the permissive
    // headers the previous deployment sent.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/analyze-food", post(analyze_food_handler))
        .route("/analyze-prescription", post(analyze_prescription_handler))
        .layer(cors)
        .with_state(state)
}

/// Negative outcomes are routed as explicit status codes, not errors:
/// 400 = nothing food-like detected, 404 = detected but no nutrition match.
fn food_response(analysis: FoodAnalysis) -> (StatusCode, Json<Value>) {
    match analysis {
        FoodAnalysis::Matched {
            detected_food,
            all_labels,
            nutrition,
            confidence,
        } => (
            StatusCode::OK,
            Json(json!({
                "detectedFood": detected_food,
                "allDetectedLabels": all_labels,
                "nutrition": nutrition,
                "confidence": confidence,
            })),
        ),
        FoodAnalysis::Unmatched { detected_food } => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "detectedFood": detected_food,
                "error": UNMATCHED_ERROR,
            })),
        ),
        FoodAnalysis::NoFood => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": NO_FOOD_ERROR })),
        ),
    }
}

async fn analyze_food_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> (StatusCode, Json<Value>) {
    if request.image.is_empty() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Image is required" })),
        );
    }

    match state.food.analyze(&request.image).await {
        Ok(analysis) => food_response(analysis),
        Err(e) => {
            log::error!("❌ Food analysis failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

async fn analyze_prescription_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> (StatusCode, Json<Value>) {
    if request.image.is_empty() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Image is required" })),
        );
    }

    match state.prescription.analyze(&request.image).await {
        // Zero parsed medicines is still a 200; the client decides what to
        // do with an empty list.
        Ok(scan) => (
            StatusCode::OK,
            Json(json!({
                "detectedText": scan.detected_text,
                "prescriptionData": scan.data,
            })),
        ),
        Err(e) => {
            log::error!("❌ Prescription analysis failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

async fn root_handler() -> &'static str {
    "Diascan image analysis service - POST /analyze-food or /analyze-prescription"
}

async fn health_check() -> &'static str {
    "OK"
}
