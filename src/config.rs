use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Sample value shipped in example env files; treated as "no key".
pub const PLACEHOLDER_API_KEY: &str = "your_gemini_api_key_here";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PlantDocConfig {
    pub model: ModelConfig,
    pub limits: LimitsConfig,
    pub frames: FrameConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelConfig {
    /// API key for the vision model; falls back to GEMINI_API_KEY
    #[serde(default)]
    pub api_key: String,

    /// Model identifier
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Base URL of the generateContent REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LimitsConfig {
    /// Largest accepted upload, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FrameConfig {
    /// Maximum number of frame positions sampled per video
    #[serde(default = "default_max_samples")]
    pub max_samples: u32,

    /// JPEG quality of the selected frame (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Directory for temporary video files (system temp dir when unset)
    pub scratch_dir: Option<PathBuf>,
}

impl ModelConfig {
    /// Whether a usable API key is present
    pub fn has_api_key(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != PLACEHOLDER_API_KEY
    }
}

impl PlantDocConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("model.api_key", "")?
            .set_default("model.model_name", default_model_name())?
            .set_default("model.base_url", default_base_url())?
            .set_default("model.temperature", default_temperature() as f64)?
            .set_default("model.max_output_tokens", default_max_output_tokens())?
            .set_default("model.timeout_seconds", default_timeout_seconds())?
            .set_default("limits.max_upload_bytes", default_max_upload_bytes() as u64)?
            .set_default("frames.max_samples", default_max_samples())?
            .set_default("frames.jpeg_quality", default_jpeg_quality() as u64)?
            .add_source(File::with_name(&path_str).required(false))
            // PLANTDOC_MODEL__API_KEY, PLANTDOC_LIMITS__MAX_UPLOAD_BYTES, ...
            .add_source(
                Environment::with_prefix("PLANTDOC")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut config: PlantDocConfig = settings.try_deserialize()?;

        if config.model.api_key.trim().is_empty() {
            if let Ok(key) = std::env::var("GEMINI_API_KEY") {
                debug!("Using API key from GEMINI_API_KEY");
                config.model.api_key = key.trim().to_string();
            }
        }

        info!("Configuration loaded successfully");
        debug!(
            "Model {} at {}, key configured: {}",
            config.model.model_name,
            config.model.base_url,
            config.model.has_api_key()
        );

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.model_name.trim().is_empty() {
            return Err(ConfigError::Message(
                "Model name must not be empty".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::Message(
                "Model temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.model.max_output_tokens == 0 {
            return Err(ConfigError::Message(
                "Model max_output_tokens must be greater than 0".to_string(),
            ));
        }

        if self.limits.max_upload_bytes == 0 {
            return Err(ConfigError::Message(
                "Upload limit must be greater than 0".to_string(),
            ));
        }

        if self.frames.max_samples == 0 {
            return Err(ConfigError::Message(
                "Frame max_samples must be greater than 0".to_string(),
            ));
        }

        if self.frames.jpeg_quality == 0 || self.frames.jpeg_quality > 100 {
            return Err(ConfigError::Message(
                "Frame jpeg_quality must be between 1 and 100".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for PlantDocConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            limits: LimitsConfig {
                max_upload_bytes: default_max_upload_bytes(),
            },
            frames: FrameConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model_name: default_model_name(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_samples: default_max_samples(),
            jpeg_quality: default_jpeg_quality(),
            scratch_dir: None,
        }
    }
}

// Default value functions
fn default_model_name() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_output_tokens() -> u32 {
    1500
}
fn default_timeout_seconds() -> u64 {
    60
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_max_samples() -> u32 {
    10
}
fn default_jpeg_quality() -> u8 {
    90
}
