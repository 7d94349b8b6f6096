use serde::{Deserialize, Serialize};

/// A single label annotation as returned by the vision provider.
/// Provider order is preserved end to end; the pipeline never re-sorts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionLabel {
    pub description: String,
    pub score: f64,
}

/// Nutrition facts for one food item, all values per 100 g of product.
/// Missing numeric fields default to 0; missing strings to "" (this matches
/// the Open Food Facts wire format the mobile client already consumes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodNutrition {
    pub name: String,
    pub brand: String,
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sodium: f64,
    pub barcode: String,
    pub image_url: String,
}

/// Dispensed form of a medicine, inferred from the dosage unit token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MedicineType {
    Tablet,
    Capsule,
    Other,
}

/// One medicine entry recovered from a prescription line.
/// Lines are parsed independently; the same medicine on two lines yields
/// two entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionMedicine {
    pub name: String,
    pub dosage: String,
    #[serde(rename = "type")]
    pub medicine_type: MedicineType,
    /// Occurrences per day. 1 when the line carries no explicit frequency.
    pub frequency: u32,
}

/// Parser output, in original line order. An empty list is a valid result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionData {
    pub medicines: Vec<PrescriptionMedicine>,
}

/// Outcome of one food analysis run.
///
/// `Unmatched` (food seen, no nutrition candidate) is deliberately distinct
/// from `NoFood` (nothing food-like in the image) so the caller can prompt
/// the user differently.
#[derive(Debug, Clone)]
pub enum FoodAnalysis {
    Matched {
        detected_food: String,
        all_labels: Vec<String>,
        nutrition: FoodNutrition,
        confidence: f64,
    },
    Unmatched {
        detected_food: String,
    },
    NoFood,
}

/// Outcome of one prescription analysis run. The raw OCR text rides along
/// for audit and debugging on the client side.
#[derive(Debug, Clone)]
pub struct PrescriptionScan {
    pub detected_text: String,
    pub data: PrescriptionData,
}
