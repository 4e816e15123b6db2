use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Custom user-agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Number of concurrent workers in the default-taxonomy import path
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,

    /// Minimum rule-classifier score before falling back to "Other"
    #[serde(default = "default_min_score")]
    pub min_score: i64,

    /// Inter-batch sleep bounds in milliseconds (polite crawling)
    #[serde(default = "default_batch_pause_min_ms")]
    pub batch_pause_min_ms: u64,
    #[serde(default = "default_batch_pause_max_ms")]
    pub batch_pause_max_ms: u64,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub llm: LlmConfig,
}

/// Timeouts and redirect budget for page fetching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_head_timeout_secs")]
    pub head_timeout_secs: u64,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_get_timeout_secs")]
    pub get_timeout_secs: u64,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

/// LLM provider settings. The API key comes from the environment; its
/// absence forces the deterministic fallback paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Bookmarks per batch-assignment call
    #[serde(default = "default_assign_batch_size")]
    pub assign_batch_size: usize,
    /// Sample cap for taxonomy discovery
    #[serde(default = "default_discovery_sample_size")]
    pub discovery_sample_size: usize,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) \
     Version/18.5 Safari/605.1.15"
        .to_string()
}

fn default_worker_threads() -> usize {
    5
}

fn default_min_score() -> i64 {
    4
}

fn default_batch_pause_min_ms() -> u64 {
    500
}

fn default_batch_pause_max_ms() -> u64 {
    1000
}

fn default_head_timeout_secs() -> u64 {
    5
}

fn default_probe_timeout_secs() -> u64 {
    8
}

fn default_get_timeout_secs() -> u64 {
    10
}

fn default_max_redirects() -> usize {
    5
}

fn default_llm_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_assign_batch_size() -> usize {
    50
}

fn default_discovery_sample_size() -> usize {
    200
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            worker_threads: default_worker_threads(),
            min_score: default_min_score(),
            batch_pause_min_ms: default_batch_pause_min_ms(),
            batch_pause_max_ms: default_batch_pause_max_ms(),
            fetch: FetchConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            head_timeout_secs: default_head_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            get_timeout_secs: default_get_timeout_secs(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key_env: default_api_key_env(),
            assign_batch_size: default_assign_batch_size(),
            discovery_sample_size: default_discovery_sample_size(),
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default location (~/.config/fury/config.yml)
    /// Falls back to the default config if the file doesn't exist
    pub fn load() -> Self {
        let config_path = crate::utils::get_config_dir().join("config.yml");

        if config_path.exists() {
            match Self::load_from_path(&config_path) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!(
                        "Failed to load config from {:?}: {}; using defaults",
                        config_path,
                        e
                    );
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// The LLM API key, if configured in the environment
    pub fn llm_api_key(&self) -> Option<String> {
        match std::env::var(&self.llm.api_key_env) {
            Ok(v) if !v.trim().is_empty() => Some(v),
            _ => None,
        }
    }
}
