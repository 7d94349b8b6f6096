pub mod auth; // Service account JWT signing + token exchange
pub mod nutrition; // Open Food Facts lookup
pub mod vision; // Google Cloud Vision annotate client

pub use auth::{AccessToken, GoogleTokenMinter, ServiceAccountKey, TokenProvider};
pub use nutrition::{NutritionLookup, OpenFoodFactsClient};
pub use vision::{GoogleVisionClient, VisionAnalyzer};
