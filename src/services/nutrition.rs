use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::FoodNutrition;

const SEARCH_ENDPOINT: &str = "https://world.openfoodfacts.org/cgi/search.pl";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Debug, Default, Deserialize)]
struct Product {
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    brands: Option<String>,
    #[serde(default)]
    nutriments: Nutriments,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

/// Open Food Facts nutriment keys, all per 100 g. Absent nutrients default
/// to 0 in the normalized record.
#[derive(Debug, Default, Deserialize)]
struct Nutriments {
    #[serde(rename = "energy-kcal_100g", default)]
    energy_kcal_100g: Option<f64>,
    #[serde(rename = "carbohydrates_100g", default)]
    carbohydrates_100g: Option<f64>,
    #[serde(rename = "proteins_100g", default)]
    proteins_100g: Option<f64>,
    #[serde(rename = "fat_100g", default)]
    fat_100g: Option<f64>,
    #[serde(rename = "fiber_100g", default)]
    fiber_100g: Option<f64>,
    #[serde(rename = "sodium_100g", default)]
    sodium_100g: Option<f64>,
}

/// Nutrition database capability. Free-text search, first candidate wins —
/// the provider already ranks by relevance, the pipeline does not re-rank.
#[async_trait::async_trait]
pub trait NutritionLookup: Send + Sync {
    async fn search(&self, food_name: &str) -> Result<Option<FoodNutrition>>;
}

pub struct OpenFoodFactsClient {
    client: reqwest::Client,
    endpoint: String,
}

impl OpenFoodFactsClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: SEARCH_ENDPOINT.to_string(),
        }
    }
}

impl Default for OpenFoodFactsClient {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(product: Product, fallback_name: &str) -> FoodNutrition {
    FoodNutrition {
        name: product
            .product_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| fallback_name.to_string()),
        brand: product.brands.unwrap_or_default(),
        calories: product.nutriments.energy_kcal_100g.unwrap_or(0.0),
        carbs: product.nutriments.carbohydrates_100g.unwrap_or(0.0),
        protein: product.nutriments.proteins_100g.unwrap_or(0.0),
        fat: product.nutriments.fat_100g.unwrap_or(0.0),
        fiber: product.nutriments.fiber_100g.unwrap_or(0.0),
        sodium: product.nutriments.sodium_100g.unwrap_or(0.0),
        barcode: product.code.unwrap_or_default(),
        image_url: product.image_url.unwrap_or_default(),
    }
}

#[async_trait::async_trait]
impl NutritionLookup for OpenFoodFactsClient {
    async fn search(&self, food_name: &str) -> Result<Option<FoodNutrition>> {
        log::info!("🔍 Searching Open Food Facts for '{}'", food_name);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "process"),
                ("search_terms", food_name),
                ("search_simple", "1"),
                ("json", "1"),
                ("page_size", "5"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ Open Food Facts error ({}): {}", status, error_text);
            anyhow::bail!("nutrition lookup failed ({})", status);
        }

        let body: SearchResponse = response
            .json()
            .await
            .context("nutrition database returned malformed JSON")?;

        let Some(product) = body.products.into_iter().next() else {
            log::info!("🤷 No nutrition candidate for '{}'", food_name);
            return Ok(None);
        };

        Ok(Some(normalize(product, food_name)))
    }
}
