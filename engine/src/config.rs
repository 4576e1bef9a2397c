use serde::Deserialize;
use std::env;

use crate::error::AppError;

const DEFAULT_CONFIG_FILE: &str = "phishscan";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    pub model_path: String,
    pub features: FeatureConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureConfig {
    pub length_threshold: usize,
    pub check_keywords: bool,
    pub shorteners: Vec<String>,
    pub keywords: Vec<String>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            length_threshold: 75,
            check_keywords: true,
            shorteners: [
                "bit.ly",
                "goo.gl",
                "tinyurl.com",
                "ow.ly",
                "is.gd",
                "buff.ly",
                "cutt.ly",
                "rebrand.ly",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            keywords: [
                "login", "verify", "secure", "update", "account", "bank", "payment", "signin",
                "confirm", "password",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Config {
    /// Defaults, then `phishscan.toml` (or `$PHISHSCAN_CONFIG`), then `PHISHSCAN_*` env vars.
    pub fn load() -> Result<Self, AppError> {
        let file = env::var("PHISHSCAN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_file(&file)
    }

    pub fn from_file(file: &str) -> Result<Self, AppError> {
        let defaults = FeatureConfig::default();

        let settings = config::Config::builder()
            .set_default("bind_addr", "0.0.0.0:5000")?
            .set_default("model_path", "models/phishing_model.json")?
            .set_default("features.length_threshold", defaults.length_threshold as i64)?
            .set_default("features.check_keywords", defaults.check_keywords)?
            .set_default("features.shorteners", defaults.shorteners)?
            .set_default("features.keywords", defaults.keywords)?
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix("PHISHSCAN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.model_path.trim().is_empty() {
            return Err(AppError::InvalidInput("model_path cannot be empty".to_string()));
        }
        if self.features.length_threshold == 0 {
            return Err(AppError::InvalidInput(
                "features.length_threshold must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
