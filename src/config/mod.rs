pub mod schema;

pub use schema::ResearchConfig;

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default home directory (~/.research-assistant).
pub fn default_home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".research-assistant"))
        .unwrap_or_else(|| PathBuf::from(".research-assistant"))
}

pub fn default_config_path() -> PathBuf {
    default_home_dir().join("config.toml")
}

/// Config file named on the command line, or the default location.
pub fn resolve_config_path(arg: Option<&str>) -> PathBuf {
    match arg.map(str::trim).filter(|a| !a.is_empty()) {
        Some(path) => PathBuf::from(shellexpand::tilde(path).into_owned()),
        None => default_config_path(),
    }
}

/// Load config from the given path, or return defaults.
pub fn load_config(path: &Path) -> Result<ResearchConfig> {
    if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: ResearchConfig =
            toml::from_str(&contents).context("Failed to parse config (TOML)")?;
        Ok(config)
    } else {
        Ok(ResearchConfig::default())
    }
}

/// Save config to the given path (TOML format).
pub fn save_config(config: &ResearchConfig, path: &Path) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents).context("Failed to write config file")?;
    Ok(())
}

/// Environment variables that override the file.
const ENV_OVERRIDES: &[&str] = &[
    "CORAL_SSE_URL",
    "CORAL_AGENT_ID",
    "CORAL_AGENT_DESCRIPTION",
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "RESEARCH_MODEL",
];

/// Apply overrides from the process environment.
pub fn apply_env(config: &mut ResearchConfig) {
    let vars: HashMap<String, String> = ENV_OVERRIDES
        .iter()
        .filter_map(|k| std::env::var(k).ok().map(|v| (k.to_string(), v)))
        .collect();
    apply_overrides(config, &vars);
}

/// Apply overrides from a key/value set. Blank values are ignored.
pub fn apply_overrides(config: &mut ResearchConfig, vars: &HashMap<String, String>) {
    let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

    if let Some(v) = get("CORAL_SSE_URL") {
        config.collab_url = v.to_string();
    }
    if let Some(v) = get("CORAL_AGENT_ID") {
        config.agent_id = v.to_string();
    }
    if let Some(v) = get("CORAL_AGENT_DESCRIPTION") {
        config.agent_description = v.to_string();
    }
    if let Some(v) = get("OPENAI_API_KEY") {
        config.inference_api_key = v.to_string();
    }
    if let Some(v) = get("OPENAI_BASE_URL") {
        config.inference_url = v.to_string();
    }
    if let Some(v) = get("RESEARCH_MODEL") {
        config.model = v.to_string();
    }
}

/// Reject settings that would make startup meaningless.
pub fn validate(config: &ResearchConfig) -> Result<()> {
    if let Some(url) = config.endpoint() {
        crate::collab::collab_url(url, &config.agent_id, &config.agent_description)?;
    }
    if config.agent_id.trim().is_empty() {
        bail!("agent_id must not be empty");
    }
    if config.max_iterations == 0 {
        bail!("max_iterations must be at least 1");
    }
    reqwest::Url::parse(&config.inference_url)
        .with_context(|| format!("Invalid inference_url '{}'", config.inference_url))?;
    Ok(())
}
