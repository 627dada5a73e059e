//! Camera server client.
//!
//! The camera server hands out JPEG frames keyed by a monotonically
//! increasing frame id. `/frame/next` long-polls: it blocks up to the given
//! timeout for a frame newer than `since` and answers 204 when none arrived.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

const FRAME_ID_HEADER: &str = "x-frame-id";
const SESSION_ID_HEADER: &str = "x-session-id";

#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub frame_id: u64,
    pub session_id: Option<String>,
    pub jpeg: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct StartSessionResponse {
    session_id: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CloseSessionResponse {
    #[serde(default)]
    stopped: bool,
}

#[derive(Clone)]
pub struct CameraClient {
    http: Client,
    base_url: String,
}

impl CameraClient {
    pub fn new(base_url: String, request_timeout: Duration) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        // The lab camera sits behind an ngrok tunnel; skip its interstitial.
        headers.insert(
            "ngrok-skip-browser-warning",
            header::HeaderValue::from_static("true"),
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .build()
            .context("failed to build camera HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Opens a capture session at the given frame rate. The server evicts any
    /// stale session (`force`) so a crashed run cannot wedge the camera.
    pub async fn start_session(&self, fps: u32) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/session/start", self.base_url))
            .json(&json!({ "fps": fps, "force": true }))
            .send()
            .await
            .context("camera session start request failed")?;

        if !response.status().is_success() {
            bail!("camera session start returned {}", response.status());
        }

        let body: StartSessionResponse = response
            .json()
            .await
            .context("camera session start returned malformed JSON")?;
        if let Some(status) = &body.status {
            log::debug!("camera session {} status: {status}", body.session_id);
        }
        Ok(body.session_id)
    }

    pub async fn close_session(&self) -> Result<bool> {
        let response = self
            .http
            .post(format!("{}/session/close", self.base_url))
            .send()
            .await
            .context("camera session close request failed")?;

        if !response.status().is_success() {
            bail!("camera session close returned {}", response.status());
        }

        let body: CloseSessionResponse = response
            .json()
            .await
            .context("camera session close returned malformed JSON")?;
        Ok(body.stopped)
    }

    /// Long-polls for the next frame after `since`. `Ok(None)` means the
    /// server timed out without a newer frame (HTTP 204).
    pub async fn next_frame(
        &self,
        since: Option<u64>,
        long_poll_timeout: Duration,
    ) -> Result<Option<CameraFrame>> {
        let mut request = self
            .http
            .get(format!("{}/frame/next", self.base_url))
            .query(&[("timeout", long_poll_timeout.as_secs())])
            // Leave headroom past the server-side long poll.
            .timeout(long_poll_timeout + Duration::from_secs(5));
        if let Some(since) = since {
            request = request.query(&[("since", since)]);
        }

        let response = request.send().await.context("frame request failed")?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !response.status().is_success() {
            bail!("frame request returned {}", response.status());
        }

        let frame_id = response
            .headers()
            .get(FRAME_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok())
            .ok_or_else(|| anyhow!("frame response is missing the {FRAME_ID_HEADER} header"))?;
        let session_id = response
            .headers()
            .get(SESSION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let jpeg = response
            .bytes()
            .await
            .context("failed to read frame body")?
            .to_vec();

        Ok(Some(CameraFrame {
            frame_id,
            session_id,
            jpeg,
        }))
    }

    /// Most recent frame regardless of id, for the live feed panel.
    pub async fn latest_frame(&self) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(format!("{}/frame/latest", self.base_url))
            .send()
            .await
            .context("latest frame request failed")?;

        if !response.status().is_success() {
            bail!("latest frame request returned {}", response.status());
        }

        Ok(response
            .bytes()
            .await
            .context("failed to read latest frame body")?
            .to_vec())
    }
}
