//! Shot-detection inference client.
//!
//! The hosted inference endpoint takes the frame as a base64 data URI in a
//! form-urlencoded body, with the model id in the path and the api key as a
//! query parameter. Predictions carry the detection id used for dedup.

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub class: Option<String>,
    pub detection_id: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InferenceResult {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    #[serde(default)]
    pub image: Option<ImageSize>,
}

#[derive(Clone)]
pub struct InferenceClient {
    http: Client,
    endpoint: String,
    model_id: String,
    api_key: String,
}

impl InferenceClient {
    pub fn new(endpoint: String, model_id: String, api_key: String) -> Result<Self> {
        let http = Client::builder()
            .build()
            .context("failed to build inference HTTP client")?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model_id,
            api_key,
        })
    }

    pub async fn detect_shots(&self, jpeg: &[u8]) -> Result<InferenceResult> {
        let data_uri = format!("data:image/jpeg;base64,{}", BASE64.encode(jpeg));

        let response = self
            .http
            .post(format!("{}/{}", self.endpoint, self.model_id))
            .query(&[("api_key", self.api_key.as_str())])
            .header("content-type", "application/x-www-form-urlencoded")
            .body(data_uri)
            .send()
            .await
            .context("inference request failed")?;

        if !response.status().is_success() {
            bail!("inference request returned {}", response.status());
        }

        response
            .json::<InferenceResult>()
            .await
            .context("inference response was not valid JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predictions_parse_with_and_without_optional_fields() {
        let body = r#"{
            "image": {"width": 640, "height": 480},
            "predictions": [
                {"x": 120.5, "y": 210.0, "width": 14.0, "height": 15.0,
                 "confidence": 0.91, "class": "bullet_hole", "detection_id": "a1"},
                {"x": 300.0, "y": 96.0, "detection_id": "a2"}
            ]
        }"#;

        let result: InferenceResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.predictions.len(), 2);
        assert_eq!(result.predictions[0].detection_id, "a1");
        assert_eq!(result.predictions[1].confidence, None);
        let image = result.image.unwrap();
        assert_eq!((image.width, image.height), (640, 480));
    }

    #[test]
    fn empty_body_means_no_detections() {
        let result: InferenceResult = serde_json::from_str("{}").unwrap();
        assert!(result.predictions.is_empty());
        assert!(result.image.is_none());
    }
}
