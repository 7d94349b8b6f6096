use std::sync::Arc;

use anyhow::Result;

use super::strip_data_url_prefix;
use crate::models::{FoodAnalysis, VisionLabel};
use crate::services::{NutritionLookup, TokenProvider, VisionAnalyzer};

/// Coarse food vocabulary: a label survives only if its text contains, or is
/// contained by, one of these terms. Trades precision for simplicity.
const FOOD_TERMS: &[&str] = &[
    "food", "fruit", "vegetable", "meat", "bread", "drink", "snack", "dish",
];

/// Labels at or below this confidence are ignored (strict inequality).
const MIN_LABEL_SCORE: f64 = 0.70;

/// Keep food-relevant labels, lowercased, in provider order.
pub fn filter_food_labels(labels: &[VisionLabel]) -> Vec<VisionLabel> {
    labels
        .iter()
        .filter(|label| label.score > MIN_LABEL_SCORE)
        .map(|label| VisionLabel {
            description: label.description.to_lowercase(),
            score: label.score,
        })
        .filter(|label| {
            FOOD_TERMS.iter().any(|term| {
                label.description.contains(term) || term.contains(label.description.as_str())
            })
        })
        .collect()
}

/// Highest score wins; ties go to the earlier label since the provider
/// already orders by relevance.
fn primary_label(labels: &[VisionLabel]) -> &VisionLabel {
    let mut best = &labels[0];
    for label in &labels[1..] {
        if label.score > best.score {
            best = label;
        }
    }
    best
}

/// Food photo pipeline: mint token, detect labels, filter for food
/// relevance, resolve nutrition for the primary term.
///
/// One linear pass, no retries; a failure at any stage discards all
/// partial progress.
pub struct FoodScanHandler {
    tokens: Arc<dyn TokenProvider>,
    vision: Arc<dyn VisionAnalyzer>,
    nutrition: Arc<dyn NutritionLookup>,
}

impl FoodScanHandler {
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        vision: Arc<dyn VisionAnalyzer>,
        nutrition: Arc<dyn NutritionLookup>,
    ) -> Self {
        Self {
            tokens,
            vision,
            nutrition,
        }
    }

    pub async fn analyze(&self, image: &str) -> Result<FoodAnalysis> {
        let image_base64 = strip_data_url_prefix(image);

        log::info!("🔐 Authorizing food analysis");
        let token = self.tokens.get_token().await?;

        log::info!("🔎 Analyzing image");
        let labels = self.vision.detect_labels(image_base64, &token).await?;

        let food_labels = filter_food_labels(&labels);
        if food_labels.is_empty() {
            log::info!("🚫 No food-relevant label above {:.2}", MIN_LABEL_SCORE);
            return Ok(FoodAnalysis::NoFood);
        }

        let primary = primary_label(&food_labels).clone();
        log::info!("🍎 Primary food term '{}' (score {:.2})", primary.description, primary.score);

        match self.nutrition.search(&primary.description).await? {
            Some(nutrition) => Ok(FoodAnalysis::Matched {
                detected_food: primary.description,
                all_labels: food_labels
                    .iter()
                    .map(|label| label.description.clone())
                    .collect(),
                nutrition,
                confidence: primary.score,
            }),
            None => Ok(FoodAnalysis::Unmatched {
                detected_food: primary.description,
            }),
        }
    }
}
