use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_PRIMARY_URL: &str =
    "https://api-inference.huggingface.co/models/facebook/bart-large-cnn";
pub const DEFAULT_SECONDARY_URL: &str =
    "https://api-inference.huggingface.co/models/sshleifer/distilbart-cnn-12-6";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MateInferenceConfig {
    pub primary_url: String,
    pub secondary_url: String,
}

impl Default for MateInferenceConfig {
    fn default() -> Self {
        Self {
            primary_url: DEFAULT_PRIMARY_URL.to_string(),
            secondary_url: DEFAULT_SECONDARY_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MateHistoryConfig {
    /// `file` persists under the data dir; `memory` keeps history in-process.
    pub backend: String,
    #[serde(default = "default_audit_enabled")]
    pub audit_enabled: bool,
}

fn default_audit_enabled() -> bool {
    true
}

impl Default for MateHistoryConfig {
    fn default() -> Self {
        Self {
            backend: "file".to_string(),
            audit_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MateConfig {
    pub inference: MateInferenceConfig,
    pub history: MateHistoryConfig,
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialMateConfig {
    inference: Option<MateInferenceConfig>,
    history: Option<MateHistoryConfig>,
}

fn env_non_empty(var: &str) -> Option<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    env_non_empty(var).unwrap_or_else(|| fallback.to_string())
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => match v.trim() {
            "1" | "true" | "TRUE" | "yes" | "on" => true,
            "0" | "false" | "FALSE" | "no" | "off" => false,
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

fn resolve_api_key() -> Option<String> {
    env_non_empty("HUGGING_FACE_API_KEY").or_else(|| env_non_empty("MATE_API_KEY"))
}

fn is_http_url(raw: &str) -> bool {
    let lower = raw.trim().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

fn validate(cfg: &MateConfig) -> Result<()> {
    if !is_http_url(&cfg.inference.primary_url) {
        return Err(anyhow!(
            "invalid primary inference url `{}`: must be http(s)",
            cfg.inference.primary_url
        ));
    }
    if !is_http_url(&cfg.inference.secondary_url) {
        return Err(anyhow!(
            "invalid secondary inference url `{}`: must be http(s)",
            cfg.inference.secondary_url
        ));
    }
    if cfg.history.backend != "file" && cfg.history.backend != "memory" {
        return Err(anyhow!("invalid history backend: use `file` or `memory`"));
    }
    Ok(())
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Some(custom) = env_non_empty("MATE_CONFIG_PATH") {
        return Some(PathBuf::from(custom));
    }

    let home = dirs::home_dir()?;
    Some(home.join(".summarize_mate").join("mate.toml"))
}

fn merge_file_config(base: &mut MateConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    merge_toml(base, &raw)
        .map_err(|err| anyhow!("failed to parse mate config {}: {err}", path.display()))
}

fn merge_toml(base: &mut MateConfig, raw: &str) -> Result<()> {
    let parsed: PartialMateConfig = toml::from_str(raw)?;
    if let Some(inference) = parsed.inference {
        base.inference = inference;
    }
    if let Some(history) = parsed.history {
        base.history = history;
    }
    Ok(())
}

pub fn load_config() -> Result<MateConfig> {
    let mut cfg = MateConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.inference.primary_url = env_or_string("MATE_PRIMARY_URL", &cfg.inference.primary_url);
    cfg.inference.secondary_url =
        env_or_string("MATE_SECONDARY_URL", &cfg.inference.secondary_url);
    cfg.history.backend = env_or_string("MATE_HISTORY_BACKEND", &cfg.history.backend)
        .to_ascii_lowercase();
    cfg.history.audit_enabled = env_or_bool("MATE_AUDIT_ENABLED", cfg.history.audit_enabled);
    cfg.api_key = resolve_api_key();

    validate(&cfg)?;
    Ok(cfg)
}
