//! Settings resolution (CLI flag > environment > YAML config file > default).
//!
//! GlobalOptions  - flags shared by every tool, built once in `main`
//! ToolOptions    - tool-specific required options (empty in wizard mode)
//! Options        - both of the above; what every tool action receives
//! FileConfig     - optional `appwrite-toolkit.yaml`
//!
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://cloud.appwrite.io/v1";
pub const DEFAULT_CONFIG_FILE: &str = "appwrite-toolkit.yaml";

pub const ENV_ENDPOINT: &str = "APPWRITE_ENDPOINT";
pub const ENV_PROJECT: &str = "APPWRITE_PROJECT";
pub const ENV_KEY: &str = "APPWRITE_KEY";
pub const ENV_CONFIG: &str = "APPWRITE_TOOLKIT_CONFIG";

/// Tool-specific option values keyed by long flag name (`project`, `key`, ...).
pub type ToolOptions = BTreeMap<String, String>;

/// Optional on-disk defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub project: Option<String>,
    pub key: Option<String>,
}

/// Flags shared by every tool. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalOptions {
    pub debug: bool,
    pub auto: bool,
    pub quiet: bool,
    /// Validated, normalised API base URL (no trailing slash).
    pub endpoint: String,
    /// Raw `--projects` value; validated by the wizard and the faker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<PathBuf>,
    #[serde(skip)]
    pub file: Option<FileConfig>,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self {
            debug: false,
            auto: false,
            quiet: false,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            projects: None,
            config: None,
            file: None,
        }
    }
}

/// Everything a tool action sees.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Options {
    #[serde(flatten)]
    pub global: GlobalOptions,
    #[serde(flatten)]
    pub tool: ToolOptions,
}

impl Options {
    pub fn new(global: GlobalOptions, tool: ToolOptions) -> Self {
        Self { global, tool }
    }

    /// Tool option value, ignoring blank strings.
    pub fn tool_value(&self, name: &str) -> Option<&str> {
        self.tool
            .get(name)
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    /// Pretty JSON for `--debug`; the API key is masked.
    pub fn debug_dump(&self) -> String {
        let mut value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        if let Some(obj) = value.as_object_mut()
            && let Some(key) = obj.get_mut("key")
        {
            *key = serde_json::Value::String(mask_secret(key.as_str().unwrap_or("")));
        }
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Keep the first four characters of a secret, hide the rest.
pub fn mask_secret(secret: &str) -> String {
    if secret.chars().count() <= 4 {
        return "****".to_string();
    }
    let head: String = secret.chars().take(4).collect();
    format!("{head}****")
}

/* ---- Project count ---- */

/// `--projects` must be a positive integer.
pub fn parse_project_count(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|n| *n > 0)
}

/* ---- Endpoint ---- */

/// Parse and normalise an API endpoint. Only http/https are accepted.
pub fn parse_endpoint(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("Endpoint is empty");
    }
    let url = Url::parse(trimmed).with_context(|| format!("Invalid endpoint URL: '{trimmed}'"))?;
    match url.scheme() {
        "http" | "https" => {}
        other => bail!("Unsupported endpoint scheme '{other}' (expected http or https)"),
    }
    if url.host_str().is_none() {
        bail!("Endpoint '{trimmed}' has no host");
    }
    Ok(url)
}

/// Render an endpoint without its trailing slash so paths can be appended.
pub fn endpoint_string(url: &Url) -> String {
    url.as_str().trim_end_matches('/').to_string()
}

/// CLI flag > env var > config file > default.
pub fn resolve_endpoint(
    flag: Option<&str>,
    env: Option<String>,
    file: Option<&FileConfig>,
) -> Result<Url> {
    let env = env.filter(|s| !s.trim().is_empty());
    let raw = flag
        .map(|s| s.to_string())
        .or(env)
        .or_else(|| file.and_then(|f| f.endpoint.clone()))
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    parse_endpoint(&raw)
}

/* ---- Config file ---- */

/// Parse YAML config text.
pub fn parse_file_config(text: &str) -> Result<FileConfig> {
    if text.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(text).context("Failed to parse config file (YAML)")
}

/// Locate and load the config file.
///
/// An explicit path (flag or env) must exist; the implicit
/// `./appwrite-toolkit.yaml` is optional.
pub fn load_file_config(explicit: Option<&Path>) -> Result<Option<FileConfig>> {
    let (path, required) = match explicit {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    if !path.exists() {
        if required {
            bail!("Config file not found: {}", path.display());
        }
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let cfg = parse_file_config(&text)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    Ok(Some(cfg))
}

/// Read a non-empty environment variable.
pub fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}
