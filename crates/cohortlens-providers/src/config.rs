//! User configuration and factories for backends and sheet sources.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use cohortlens_core::corpus::{parse_manifest, CorpusManifest};
use cohortlens_core::narrative::DEFAULT_MODEL;
use cohortlens_core::source::FileSource;
use cohortlens_core::traits::{NarrativeGenerator, SheetSource};

use crate::gemini::GeminiGenerator;
use crate::http_source::HttpSource;
use crate::ollama::OllamaGenerator;

/// Configuration for a single narrative backend.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Gemini {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Ollama { base_url } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

/// Top-level cohortlens configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortlensConfig {
    /// Narrative backends keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Backend used for executive summaries.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Corpus manifest; the built-in ten-sheet corpus when unset.
    #[serde(default)]
    pub corpus: Option<PathBuf>,
    /// Directory the sheets are read from.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Fetch sheets from this URL instead of `data_dir`.
    #[serde(default)]
    pub sheet_base_url: Option<String>,
    /// Per-sheet fetch timeout.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_fetch_timeout() -> u64 {
    30
}

impl Default for CohortlensConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            corpus: None,
            data_dir: default_data_dir(),
            sheet_base_url: None,
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

impl CohortlensConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// The configured corpus manifest, or the built-in one.
    pub fn manifest(&self) -> Result<CorpusManifest> {
        match &self.corpus {
            Some(path) => parse_manifest(path),
            None => Ok(CorpusManifest::default()),
        }
    }

    fn rebase_paths(&mut self, dir: &Path) {
        if dir.as_os_str().is_empty() {
            return;
        }
        if self.data_dir.is_relative() {
            self.data_dir = dir.join(&self.data_dir);
        }
        if let Some(corpus) = self.corpus.as_mut().filter(|c| c.is_relative()) {
            *corpus = dir.join(&*corpus);
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Gemini { api_key, base_url } => ProviderConfig::Gemini {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
        ProviderConfig::Ollama { base_url } => ProviderConfig::Ollama {
            base_url: resolve_env_vars(base_url),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `cohortlens.toml` in the current directory
/// 2. `~/.config/cohortlens/config.toml`
///
/// Environment variable override: `COHORTLENS_GEMINI_KEY`.
pub fn load_config() -> Result<CohortlensConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<CohortlensConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("cohortlens.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let mut config = toml::from_str::<CohortlensConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            // Relative paths in a config file are relative to that file.
            if let Some(dir) = path.parent() {
                config.rebase_paths(dir);
            }
            config
        }
        None => CohortlensConfig::default(),
    };

    if let Ok(key) = std::env::var("COHORTLENS_GEMINI_KEY") {
        config
            .providers
            .entry("gemini".into())
            .or_insert(ProviderConfig::Gemini {
                api_key: String::new(),
                base_url: None,
            });
        if let Some(ProviderConfig::Gemini { api_key, .. }) = config.providers.get_mut("gemini") {
            *api_key = key;
        }
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("cohortlens"))
}

/// Create a narrative backend from its configuration.
pub fn create_generator(config: &ProviderConfig) -> Result<Box<dyn NarrativeGenerator>> {
    match config {
        ProviderConfig::Gemini { api_key, base_url } => {
            if api_key.is_empty() {
                anyhow::bail!("gemini API key is empty (set COHORTLENS_GEMINI_KEY)");
            }
            Ok(Box::new(GeminiGenerator::new(api_key, base_url.clone())?))
        }
        ProviderConfig::Ollama { base_url } => Ok(Box::new(OllamaGenerator::new(base_url)?)),
    }
}

/// Create the sheet source the configuration points at.
pub fn create_sheet_source(config: &CohortlensConfig) -> Result<Arc<dyn SheetSource>> {
    match &config.sheet_base_url {
        Some(url) => Ok(Arc::new(HttpSource::with_timeout(
            url,
            config.fetch_timeout_secs,
        )?)),
        None => Ok(Arc::new(FileSource::new(&config.data_dir))),
    }
}
