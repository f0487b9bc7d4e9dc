// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Only "openai" is wired up (case-insensitive).
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from OPENAI_API_KEY
    pub api_key: String,
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: AiConfig = serde_json::from_str(&data)?;

        cfg.provider = cfg.provider.to_lowercase();
        if cfg.provider != "openai" {
            anyhow::bail!("Unsupported provider in config: {}", cfg.provider);
        }

        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = env::var(ENV_OPENAI_API_KEY)
                .map_err(|_| anyhow::anyhow!("Missing OPENAI_API_KEY env var"))?;
        }
        if cfg.enabled && cfg.api_key.trim().is_empty() {
            anyhow::bail!("AI enabled but api_key is empty");
        }

        Ok(cfg)
    }

    /// Config file if present, otherwise a plain `OPENAI_API_KEY`.
    /// `Ok(None)` means generation is not configured at all.
    pub fn load_default() -> anyhow::Result<Option<Self>> {
        let path = Path::new(DEFAULT_AI_CONFIG_PATH);
        if path.exists() {
            let cfg = Self::load_from_file(path)?;
            return Ok(cfg.enabled.then_some(cfg));
        }
        match env::var(ENV_OPENAI_API_KEY) {
            Ok(key) if !key.trim().is_empty() => Ok(Some(Self {
                enabled: true,
                provider: default_provider(),
                model: default_model(),
                api_key: key,
            })),
            _ => Ok(None),
        }
    }
}
