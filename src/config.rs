use thiserror::Error;
use url::Url;

use crate::cli::chat::persona::Persona;

pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "deepseek-r1:1.5b";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_PORT: u16 = 8501;

/// Models offered for selection. The server decides what actually exists,
/// so any other non-empty name is accepted as well.
pub const AVAILABLE_MODELS: &[&str] = &["deepseek-r1:1.5b", "deepseek-r1:7b"];

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid model server URL '{0}': {1}")]
    InvalidHost(String, String),

    #[error("temperature must be between 0.0 and 1.0, got {0}")]
    TemperatureOutOfRange(f32),

    #[error("model name cannot be empty")]
    EmptyModel,
}

/// Settings for a chat session.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub host: Url,
    pub model: String,
    pub temperature: f32,
    pub persona: Persona,
    pub hide_thinking: bool,
}

impl ChatConfig {
    pub fn new(
        host: &str,
        model: &str,
        temperature: f32,
        persona: Persona,
    ) -> Result<Self, ConfigError> {
        let mut config = Self {
            host: parse_host(host)?,
            model: String::new(),
            temperature: DEFAULT_TEMPERATURE,
            persona,
            hide_thinking: false,
        };
        config.set_model(model)?;
        config.set_temperature(temperature)?;
        Ok(config)
    }

    pub fn with_hide_thinking(mut self, hide_thinking: bool) -> Self {
        self.hide_thinking = hide_thinking;
        self
    }

    pub fn set_model(&mut self, model: &str) -> Result<(), ConfigError> {
        let model = model.trim();
        if model.is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        self.model = model.to_string();
        Ok(())
    }

    pub fn set_temperature(&mut self, temperature: f32) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&temperature) {
            return Err(ConfigError::TemperatureOutOfRange(temperature));
        }
        self.temperature = temperature;
        Ok(())
    }
}

fn parse_host(host: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(host.trim())
        .map_err(|e| ConfigError::InvalidHost(host.to_string(), e.to_string()))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidHost(
            host.to_string(),
            format!("unsupported scheme '{}'", other),
        )),
    }
}

/// Join an API path onto the host, keeping any path prefix the host carries.
pub fn endpoint(host: &Url, path: &str) -> Url {
    let mut url = host.clone();
    let base = host.path().trim_end_matches('/');
    url.set_path(&format!("{}/{}", base, path));
    url
}
