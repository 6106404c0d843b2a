/// Application configuration
///
/// Values are layered: built-in defaults, then an optional JSON file in the
/// user's config directory, then environment variables.
/// - Linux: ~/.config/branding-studio/config.json
/// - macOS: ~/Library/Application Support/branding-studio/config.json
/// - Windows: %APPDATA%\branding-studio\config.json

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, StudioError};

/// Default generative model (image in, image out)
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Default REST endpoint for the Generative Language API
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// API key for the generative model (None = not configured)
    pub api_key: Option<String>,
    /// Model name used in the generateContent call
    pub model: String,
    /// Base URL of the API, without trailing slash
    pub endpoint: String,
    /// Whole-request timeout in seconds
    pub request_timeout_secs: u64,
    /// JPEG quality for the cropped upload (1-100)
    pub jpeg_quality: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 120,
            jpeg_quality: 95,
        }
    }
}

impl AppConfig {
    /// Load the configuration from the config file and the process environment.
    ///
    /// A broken config file is logged and ignored so the app still starts.
    pub fn load() -> Self {
        let path = Self::config_path();
        let file_contents = path
            .as_ref()
            .filter(|p| p.exists())
            .and_then(|p| match std::fs::read_to_string(p) {
                Ok(contents) => {
                    log::info!("📁 Loading config from {}", p.display());
                    Some(contents)
                }
                Err(e) => {
                    log::warn!("⚠️  Could not read {}: {}", p.display(), e);
                    None
                }
            });

        let config = match Self::from_sources(file_contents.as_deref(), |key| std::env::var(key).ok()) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("⚠️  {}; using defaults", e);
                Self::from_sources(None, |key| std::env::var(key).ok()).unwrap_or_default()
            }
        };

        if config.api_key.is_none() {
            log::warn!("⚠️  GEMINI_API_KEY is not set. Image generation will not work.");
        }

        config
    }

    /// Build a config from an optional JSON document and an environment lookup.
    pub fn from_sources<F>(file_contents: Option<&str>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match file_contents {
            Some(json) => Self::from_json(json)?,
            None => Self::default(),
        };

        // GEMINI_API_KEY wins over the generic API_KEY
        if let Some(key) = env("GEMINI_API_KEY").or_else(|| env("API_KEY")) {
            config.api_key = Some(key);
        }
        if let Some(model) = env("BRANDING_STUDIO_MODEL") {
            config.model = model;
        }
        if let Some(endpoint) = env("BRANDING_STUDIO_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(secs) = env("BRANDING_STUDIO_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            config.request_timeout_secs = secs;
        }

        config.normalize();
        Ok(config)
    }

    /// Parse from a JSON document (missing fields take their defaults)
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StudioError::Config(e.to_string()))
    }

    /// Path of the optional config file
    pub fn config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("branding-studio");
        path.push("config.json");
        Some(path)
    }

    /// Clamp and tidy values that came from outside
    fn normalize(&mut self) {
        self.api_key = self
            .api_key
            .take()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        self.endpoint = self.endpoint.trim_end_matches('/').to_string();
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = Self::default().request_timeout_secs;
        }
    }
}
