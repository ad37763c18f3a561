use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::models::Bands;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub openai_api_key: Option<String>,
    pub resend_api_key: Option<String>,
    pub notification_recipient: Option<String>,
    pub form_id: Option<String>,
    pub forms_api_token: Option<String>,

    #[serde(default)]
    pub bands: Bands,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("macrolog");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("macrolog.db").to_string_lossy().to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            openai_api_key: None,
            resend_api_key: None,
            notification_recipient: None,
            form_id: None,
            forms_api_token: None,
            bands: Bands::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("macrolog")
            .join("config.toml")
    }

    /// Fail fast at startup instead of at the point of use.
    pub fn validate(&self) -> Result<()> {
        self.openai_api_key()?;
        self.resend_api_key()?;
        self.notification_recipient()?;
        self.form_id()?;
        self.forms_api_token()?;
        Ok(())
    }

    pub fn openai_api_key(&self) -> Result<&str> {
        require(&self.openai_api_key, "openai_api_key")
    }

    pub fn resend_api_key(&self) -> Result<&str> {
        require(&self.resend_api_key, "resend_api_key")
    }

    pub fn notification_recipient(&self) -> Result<&str> {
        require(&self.notification_recipient, "notification_recipient")
    }

    pub fn form_id(&self) -> Result<&str> {
        require(&self.form_id, "form_id")
    }

    pub fn forms_api_token(&self) -> Result<&str> {
        require(&self.forms_api_token, "forms_api_token")
    }
}

fn require<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Config(format!(
            "missing required config key: {}",
            key
        ))),
    }
}
