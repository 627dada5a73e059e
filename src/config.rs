//! Service configuration: a JSON settings file with serde defaults for every
//! field, plus environment overrides for secrets and deploy-time knobs.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::db::models::SkillLevel;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraConfig {
    pub base_url: String,
    pub fps: u32,
    pub poll_interval_secs: u64,
    /// Server-side long-poll window for `/frame/next`.
    pub frame_timeout_secs: u64,
    /// Upper bound on one whole fetch-hash-infer capture.
    pub capture_timeout_secs: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            fps: 1,
            poll_interval_secs: 1,
            frame_timeout_secs: 10,
            capture_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InferenceConfig {
    pub endpoint: String,
    pub model_id: String,
    pub api_key: String,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://detect.roboflow.com".to_string(),
            model_id: String::new(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CoachingConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub skill_level: SkillLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageConfig {
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/gmshooter.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardConfig {
    pub server: ServerConfig,
    pub camera: CameraConfig,
    pub inference: InferenceConfig,
    pub coaching: CoachingConfig,
    pub storage: StorageConfig,
}

impl DashboardConfig {
    /// Reads the settings file if it exists (defaults otherwise), then lets
    /// the environment override individual fields.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse settings from {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(bind) = env::var("GMSHOOTER_BIND") {
            self.server.bind = bind;
        }
        if let Ok(url) = env::var("GMSHOOTER_CAMERA_URL") {
            self.camera.base_url = url;
        }
        if let Ok(model_id) = env::var("GMSHOOTER_INFERENCE_MODEL_ID") {
            self.inference.model_id = model_id;
        }
        if let Ok(api_key) = env::var("GMSHOOTER_INFERENCE_API_KEY") {
            self.inference.api_key = api_key;
        }
        if let Ok(endpoint) = env::var("GMSHOOTER_COACHING_ENDPOINT") {
            self.coaching.endpoint = Some(endpoint);
        }
        if let Ok(api_key) = env::var("GMSHOOTER_COACHING_API_KEY") {
            self.coaching.api_key = Some(api_key);
        }
        if let Ok(level) = env::var("GMSHOOTER_SKILL_LEVEL") {
            match SkillLevel::parse(&level) {
                Some(parsed) => self.coaching.skill_level = parsed,
                None => log::warn!("ignoring unknown GMSHOOTER_SKILL_LEVEL value {level:?}"),
            }
        }
        if let Ok(db_path) = env::var("GMSHOOTER_DB_PATH") {
            self.storage.db_path = PathBuf::from(db_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_yields_defaults() {
        let config = DashboardConfig::load(Path::new("/nonexistent/gmshooter.json")).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.camera.fps, 1);
        assert_eq!(config.coaching.skill_level, SkillLevel::Intermediate);
        assert!(config.coaching.endpoint.is_none());
    }

    #[test]
    fn partial_file_fills_the_rest_with_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "camera": {{ "baseUrl": "http://cam.local:9000", "fps": 2 }},
                "coaching": {{ "skillLevel": "advanced" }}
            }}"#
        )
        .unwrap();

        let config = DashboardConfig::load(file.path()).unwrap();
        assert_eq!(config.camera.base_url, "http://cam.local:9000");
        assert_eq!(config.camera.fps, 2);
        assert_eq!(config.camera.poll_interval_secs, 1);
        assert_eq!(config.coaching.skill_level, SkillLevel::Advanced);
        assert_eq!(config.inference.endpoint, "https://detect.roboflow.com");
    }

    #[test]
    fn malformed_file_is_an_error_not_a_silent_default() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(DashboardConfig::load(file.path()).is_err());
    }
}
