use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::auth::AccessToken;
use crate::models::VisionLabel;

const VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Caps keep the response size and per-call cost bounded.
const MAX_LABEL_RESULTS: u32 = 10;
const MAX_TEXT_RESULTS: u32 = 5;

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateEntry>,
}

#[derive(Debug, Serialize)]
struct AnnotateEntry {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    feature_type: String,
    #[serde(rename = "maxResults")]
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotationResult>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
struct AnnotationResult {
    #[serde(rename = "labelAnnotations", default)]
    label_annotations: Vec<LabelAnnotation>,
    #[serde(rename = "textAnnotations", default)]
    text_annotations: Vec<TextAnnotation>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct LabelAnnotation {
    description: String,
    #[serde(default)]
    score: f64,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    description: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Vision capability the pipelines depend on; production talks to the Google
/// Cloud Vision annotate endpoint, tests substitute mocks.
#[async_trait::async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Label detection, provider order preserved.
    async fn detect_labels(&self, image_base64: &str, token: &AccessToken)
        -> Result<Vec<VisionLabel>>;

    /// Full-text OCR. Returns the complete detected text block, empty string
    /// when the image carries no recognizable text.
    async fn detect_text(&self, image_base64: &str, token: &AccessToken) -> Result<String>;
}

pub struct GoogleVisionClient {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleVisionClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: VISION_ENDPOINT.to_string(),
        }
    }

    async fn annotate(
        &self,
        image_base64: &str,
        token: &AccessToken,
        feature_type: &str,
        max_results: u32,
    ) -> Result<AnnotationResult> {
        let request = AnnotateRequest {
            requests: vec![AnnotateEntry {
                image: ImageContent {
                    content: image_base64.to_string(),
                },
                features: vec![Feature {
                    feature_type: feature_type.to_string(),
                    max_results,
                }],
            }],
        };

        log::debug!("📤 Vision request: feature={}, image={} bytes", feature_type, image_base64.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", token.as_str()))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ Vision API error ({}): {}", status, error_text);
            anyhow::bail!("vision analysis failed ({})", status);
        }

        let body: AnnotateResponse = response
            .json()
            .await
            .context("vision API returned malformed JSON")?;

        extract_result(body)
    }
}

impl Default for GoogleVisionClient {
    fn default() -> Self {
        Self::new()
    }
}

/// A 2xx annotate response can still carry an embedded error payload; surface
/// it as a failure rather than synthesizing partial results.
fn extract_result(body: AnnotateResponse) -> Result<AnnotationResult> {
    if let Some(error) = body.error {
        anyhow::bail!("vision analysis failed: {}", error.message);
    }
    let result = body.responses.into_iter().next().unwrap_or_default();
    if let Some(error) = result.error {
        anyhow::bail!("vision analysis failed: {}", error.message);
    }
    Ok(result)
}

#[async_trait::async_trait]
impl VisionAnalyzer for GoogleVisionClient {
    async fn detect_labels(
        &self,
        image_base64: &str,
        token: &AccessToken,
    ) -> Result<Vec<VisionLabel>> {
        let result = self
            .annotate(image_base64, token, "LABEL_DETECTION", MAX_LABEL_RESULTS)
            .await?;

        let labels: Vec<VisionLabel> = result
            .label_annotations
            .into_iter()
            .map(|label| VisionLabel {
                description: label.description,
                score: label.score,
            })
            .collect();

        log::info!("🏷️ Vision returned {} labels", labels.len());
        Ok(labels)
    }

    async fn detect_text(&self, image_base64: &str, token: &AccessToken) -> Result<String> {
        let result = self
            .annotate(image_base64, token, "TEXT_DETECTION", MAX_TEXT_RESULTS)
            .await?;

        // The first annotation is the full text block; the rest are per-word
        // boxes the pipeline does not use.
        let text = result
            .text_annotations
            .into_iter()
            .next()
            .map(|annotation| annotation.description)
            .unwrap_or_default();

        log::info!("📝 Vision returned {} chars of text", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_includes_feature_caps() {
        let request = AnnotateRequest {
            requests: vec![AnnotateEntry {
                image: ImageContent {
                    content: "aGVsbG8=".to_string(),
                },
                features: vec![Feature {
                    feature_type: "LABEL_DETECTION".to_string(),
                    max_results: MAX_LABEL_RESULTS,
                }],
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["requests"][0]["image"]["content"], "aGVsbG8=");
        assert_eq!(json["requests"][0]["features"][0]["type"], "LABEL_DETECTION");
        assert_eq!(json["requests"][0]["features"][0]["maxResults"], 10);
    }

    #[test]
    fn test_label_response_deserialization() {
        let json = r#"{
            "responses": [{
                "labelAnnotations": [
                    { "description": "Apple", "score": 0.95, "mid": "/m/014j1m" },
                    { "description": "Table", "score": 0.40 }
                ]
            }]
        }"#;

        let body: AnnotateResponse = serde_json::from_str(json).unwrap();
        let result = extract_result(body).unwrap();
        assert_eq!(result.label_annotations.len(), 2);
        assert_eq!(result.label_annotations[0].description, "Apple");
        assert!(result.label_annotations[0].score > 0.9);
    }

    #[test]
    fn test_text_response_takes_full_block_first() {
        let json = r#"{
            "responses": [{
                "textAnnotations": [
                    { "description": "Metformin 500mg\nAmoxicillin 250mg" },
                    { "description": "Metformin" }
                ]
            }]
        }"#;

        let body: AnnotateResponse = serde_json::from_str(json).unwrap();
        let result = extract_result(body).unwrap();
        assert!(result.text_annotations[0].description.contains('\n'));
    }

    #[test]
    fn test_embedded_error_is_fatal() {
        let json = r#"{ "responses": [{ "error": { "message": "quota exceeded", "code": 8 } }] }"#;
        let body: AnnotateResponse = serde_json::from_str(json).unwrap();
        let err = extract_result(body).unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_empty_response_is_not_an_error() {
        let body: AnnotateResponse = serde_json::from_str(r#"{ "responses": [{}] }"#).unwrap();
        let result = extract_result(body).unwrap();
        assert!(result.label_annotations.is_empty());
        assert!(result.text_annotations.is_empty());
    }
}
