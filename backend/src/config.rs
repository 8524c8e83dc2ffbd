use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_API_BASE: &str = "https://www.kaggle.com/api/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub title: String,
    pub input: InputConfig,
    pub classes: Vec<String>,
    pub decision: DecisionPolicy,
    pub model: ModelSource,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub resize_method: ResizeMethod,
    #[serde(default)]
    pub layout: TensorLayout,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeMethod {
    #[default]
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResizeMethod {
    pub fn filter(self) -> image::imageops::FilterType {
        use image::imageops::FilterType;
        match self {
            ResizeMethod::Nearest => FilterType::Nearest,
            ResizeMethod::Triangle => FilterType::Triangle,
            ResizeMethod::CatmullRom => FilterType::CatmullRom,
            ResizeMethod::Gaussian => FilterType::Gaussian,
            ResizeMethod::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Channel placement of the model input: Keras-style `[1, H, W, 3]` or torch-style `[1, 3, H, W]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorLayout {
    #[default]
    Nhwc,
    Nchw,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum DecisionPolicy {
    Threshold {
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    #[serde(rename = "argmax")]
    ArgMax,
}

fn default_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSource {
    /// Local paths in order of preference.
    #[serde(default)]
    pub candidates: Vec<PathBuf>,
    #[serde(default)]
    pub remote: Option<RemoteSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSource {
    /// Dataset identifier in `owner/slug` form.
    pub dataset: String,
    /// Model file extensions to look for inside the archive, preferred first.
    pub extensions: Vec<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
    #[serde(default)]
    pub persist_to: Option<PathBuf>,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub frontend_dir: Option<PathBuf>,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            frontend_dir: None,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_port() -> u16 {
    8081
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

impl ClassifierConfig {
    /// Reads the config named by `CLASSIFIER_CONFIG`, falling back to `config/classifier.yaml`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = match std::env::var("CLASSIFIER_CONFIG") {
            Ok(path) => PathBuf::from(path),
            Err(_) => match std::env::var("CARGO_MANIFEST_DIR") {
                Ok(manifest_dir) => Path::new(&manifest_dir).join("config/classifier.yaml"),
                Err(_) => PathBuf::from("config/classifier.yaml"),
            },
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(config_str: &str) -> Result<Self, ConfigError> {
        let config: ClassifierConfig = serde_yaml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.width == 0 || self.input.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "input size must be non-zero, got {}x{}",
                self.input.width, self.input.height
            )));
        }
        if self.classes.is_empty() {
            return Err(ConfigError::Invalid("class list is empty".into()));
        }
        if let DecisionPolicy::Threshold { threshold } = self.decision {
            if self.classes.len() != 2 {
                return Err(ConfigError::Invalid(format!(
                    "threshold policy needs exactly two classes, got {}",
                    self.classes.len()
                )));
            }
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::Invalid(format!(
                    "threshold must lie in [0, 1], got {}",
                    threshold
                )));
            }
        }
        if self.model.candidates.is_empty() && self.model.remote.is_none() {
            return Err(ConfigError::Invalid(
                "model section needs local candidates or a remote source".into(),
            ));
        }
        if let Some(remote) = &self.model.remote {
            if remote.extensions.is_empty() {
                return Err(ConfigError::Invalid(
                    "remote source lists no model extensions".into(),
                ));
            }
            let parts: Vec<&str> = remote.dataset.split('/').collect();
            if parts.len() != 2 || parts.iter().any(|p| p.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "dataset must look like owner/slug, got {:?}",
                    remote.dataset
                )));
            }
        }
        Ok(())
    }

    /// `PORT` and `FRONTEND_DIR` take precedence over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => log::warn!("Ignoring unparsable PORT value {:?}", port),
            }
        }
        if let Ok(dir) = std::env::var("FRONTEND_DIR") {
            self.server.frontend_dir = Some(PathBuf::from(dir));
        }
    }
}
