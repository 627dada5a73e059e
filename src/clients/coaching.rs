//! Coaching-advice generation client.
//!
//! Optional remote service that turns a finished session (shots, metrics,
//! skill level) into an ordered list of textual tips. The rule-based tips in
//! [`crate::advice`] are the fallback when this is unconfigured or failing.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::db::models::{Shot, ShotMetrics, SkillLevel};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdviceRequest<'a> {
    shots: &'a [Shot],
    metrics: &'a ShotMetrics,
    user_skill_level: SkillLevel,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdviceResponse {
    #[serde(default)]
    coaching_advice: Vec<String>,
}

#[derive(Clone)]
pub struct CoachingClient {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl CoachingClient {
    pub fn new(endpoint: String, api_key: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .build()
            .context("failed to build coaching HTTP client")?;
        Ok(Self {
            http,
            endpoint,
            api_key,
        })
    }

    pub async fn generate_advice(
        &self,
        shots: &[Shot],
        metrics: &ShotMetrics,
        skill_level: SkillLevel,
    ) -> Result<Vec<String>> {
        let mut request = self.http.post(&self.endpoint).json(&AdviceRequest {
            shots,
            metrics,
            user_skill_level: skill_level,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.context("coaching request failed")?;
        if !response.status().is_success() {
            bail!("coaching request returned {}", response.status());
        }

        let body: AdviceResponse = response
            .json()
            .await
            .context("coaching response was not valid JSON")?;
        Ok(body.coaching_advice)
    }
}
