use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use super::strip_data_url_prefix;
use crate::models::{MedicineType, PrescriptionData, PrescriptionMedicine, PrescriptionScan};
use crate::services::{TokenProvider, VisionAnalyzer};

/// One or more alphabetic words, then a quantity and a unit token.
static MEDICINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([A-Za-z]+(?:\s+[A-Za-z]+)*)\s+(\d+(?:\.\d+)?)\s*(mg|g|ml|tablet|capsule)")
        .unwrap()
});

/// "3 times daily", "2x per day" style phrasing. Shorthand like BID/TID is
/// not recognized.
static FREQUENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*(?:times?|x)\s*(?:daily|day|per day)").unwrap());

fn classify_unit(unit: &str) -> MedicineType {
    let unit = unit.to_lowercase();
    if unit.contains("tablet") {
        MedicineType::Tablet
    } else if unit.contains("capsule") {
        MedicineType::Capsule
    } else {
        MedicineType::Other
    }
}

/// Line-local extraction: each line is matched independently, lines without
/// a medicine pattern are skipped silently, and no cross-line merging or
/// deduplication happens. Zero matches is a valid result, not an error.
pub fn parse_prescription_text(text: &str) -> PrescriptionData {
    let mut medicines = Vec::new();

    for line in text.lines() {
        let Some(caps) = MEDICINE_RE.captures(line) else {
            continue;
        };

        let frequency = match FREQUENCY_RE.captures(line) {
            Some(freq) => freq[1].parse().unwrap_or(1),
            None => {
                log::debug!("💊 No explicit frequency on {:?}, assuming once daily", line);
                1
            }
        };

        medicines.push(PrescriptionMedicine {
            name: caps[1].trim().to_string(),
            dosage: format!("{}{}", &caps[2], &caps[3]),
            medicine_type: classify_unit(&caps[3]),
            frequency,
        });
    }

    log::info!("💊 Parsed {} medicine entries", medicines.len());
    PrescriptionData { medicines }
}

/// Prescription photo pipeline: mint token, OCR the image, extract medicine
/// entries from the recognized text.
pub struct PrescriptionScanHandler {
    tokens: Arc<dyn TokenProvider>,
    vision: Arc<dyn VisionAnalyzer>,
}

impl PrescriptionScanHandler {
    pub fn new(tokens: Arc<dyn TokenProvider>, vision: Arc<dyn VisionAnalyzer>) -> Self {
        Self { tokens, vision }
    }

    pub async fn analyze(&self, image: &str) -> Result<PrescriptionScan> {
        let image_base64 = strip_data_url_prefix(image);

        log::info!("🔐 Authorizing prescription analysis");
        let token = self.tokens.get_token().await?;

        log::info!("🔎 Reading prescription text");
        let detected_text = self.vision.detect_text(image_base64, &token).await?;

        let data = parse_prescription_text(&detected_text);
        Ok(PrescriptionScan {
            detected_text,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VisionLabel;
    use crate::services::AccessToken;

    #[test]
    fn test_parses_simple_medicine_line() {
        let data = parse_prescription_text("Metformin 500mg");
        assert_eq!(data.medicines.len(), 1);

        let med = &data.medicines[0];
        assert_eq!(med.name, "Metformin");
        assert_eq!(med.dosage, "500mg");
        assert_eq!(med.medicine_type, MedicineType::Other);
        assert_eq!(med.frequency, 1);
    }

    #[test]
    fn test_parses_frequency_phrase() {
        let data = parse_prescription_text("Amoxicillin 250mg 3 times daily");
        let med = &data.medicines[0];
        assert_eq!(med.name, "Amoxicillin");
        assert_eq!(med.dosage, "250mg");
        assert_eq!(med.medicine_type, MedicineType::Other);
        assert_eq!(med.frequency, 3);
    }

    #[test]
    fn test_frequency_shorthand_x_per_day() {
        let data = parse_prescription_text("Gliclazide 80mg 2x per day");
        assert_eq!(data.medicines[0].frequency, 2);
    }

    #[test]
    fn test_unit_classification() {
        let data = parse_prescription_text(
            "Aspirin 1 tablet\nOmeprazole 1 capsule\nInsulin 10 ml",
        );
        assert_eq!(data.medicines[0].medicine_type, MedicineType::Tablet);
        assert_eq!(data.medicines[1].medicine_type, MedicineType::Capsule);
        assert_eq!(data.medicines[2].medicine_type, MedicineType::Other);
    }

    #[test]
    fn test_decimal_dose() {
        let data = parse_prescription_text("Warfarin 2.5mg");
        assert_eq!(data.medicines[0].dosage, "2.5mg");
    }

    #[test]
    fn test_line_order_and_silent_skip() {
        let text = "Dr. Smith Clinic\nMetformin 500mg 2 times daily\nshake well\nInsulin 10 ml";
        let data = parse_prescription_text(text);

        assert_eq!(data.medicines.len(), 2);
        assert_eq!(data.medicines[0].name, "Metformin");
        assert_eq!(data.medicines[1].name, "Insulin");
    }

    #[test]
    fn test_duplicate_lines_are_kept() {
        let data = parse_prescription_text("Metformin 500mg\nMetformin 500mg");
        assert_eq!(data.medicines.len(), 2);
    }

    #[test]
    fn test_empty_text_yields_empty_result() {
        assert!(parse_prescription_text("").medicines.is_empty());
        assert!(parse_prescription_text("no doses here").medicines.is_empty());
    }

    #[test]
    fn test_multi_word_name() {
        let data = parse_prescription_text("Vitamin D 1000mg once");
        assert_eq!(data.medicines[0].name, "Vitamin D");
        assert_eq!(data.medicines[0].dosage, "1000mg");
    }

    struct StaticTokens;

    #[async_trait::async_trait]
    impl TokenProvider for StaticTokens {
        async fn get_token(&self) -> Result<AccessToken> {
            Ok(AccessToken::new("test-token".to_string()))
        }
    }

    struct StaticOcr {
        text: String,
    }

    #[async_trait::async_trait]
    impl VisionAnalyzer for StaticOcr {
        async fn detect_labels(
            &self,
            _image_base64: &str,
            _token: &AccessToken,
        ) -> Result<Vec<VisionLabel>> {
            anyhow::bail!("label detection not expected in prescription mode")
        }

        async fn detect_text(&self, _image_base64: &str, _token: &AccessToken) -> Result<String> {
            Ok(self.text.clone())
        }
    }

    #[tokio::test]
    async fn test_scan_preserves_raw_text() {
        let handler = PrescriptionScanHandler::new(
            Arc::new(StaticTokens),
            Arc::new(StaticOcr {
                text: "Metformin 500mg 2 times daily".to_string(),
            }),
        );

        let scan = handler.analyze("data:image/jpeg;base64,aGVsbG8=").await.unwrap();
        assert_eq!(scan.detected_text, "Metformin 500mg 2 times daily");
        assert_eq!(scan.data.medicines.len(), 1);
        assert_eq!(scan.data.medicines[0].frequency, 2);
    }

    #[tokio::test]
    async fn test_scan_with_no_matches_is_not_an_error() {
        let handler = PrescriptionScanHandler::new(
            Arc::new(StaticTokens),
            Arc::new(StaticOcr {
                text: "illegible handwriting".to_string(),
            }),
        );

        let scan = handler.analyze("aGVsbG8=").await.unwrap();
        assert!(scan.data.medicines.is_empty());
    }
}
