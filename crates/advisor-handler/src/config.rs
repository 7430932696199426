//! Layered configuration: defaults, then a TOML file, then `ADVISOR_*` env vars.

use std::path::PathBuf;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use advisor_providers::DEFAULT_MODEL;
use advisor_tools::retrieve::{DEFAULT_MIN_SCORE, DEFAULT_NUMBER_OF_RESULTS};
use advisor_tools::KnowledgeBaseConfig;

/// Names an explicit config file, overriding the per-user location.
pub const CONFIG_PATH_ENV: &str = "ADVISOR_CONFIG";
const ENV_PREFIX: &str = "ADVISOR_";
const API_KEY_FALLBACK_ENV: &str = "ANTHROPIC_API_KEY";
const REDACTED: &str = "********";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hosted model identifier
    pub model_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Messages API base URL (proxies, gateways)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    pub max_tokens: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Upper bound on model round-trips per request
    pub max_iterations: usize,

    /// Per-HTTP-request timeout for the model client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    pub knowledge_base: KnowledgeBaseSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: None,
            max_tokens: 4096,
            temperature: None,
            max_iterations: 10,
            request_timeout_secs: None,
            knowledge_base: KnowledgeBaseSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeBaseSettings {
    /// Retrieval endpoint; the `retrieve` tool reports itself unavailable without one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub number_of_results: usize,
    pub min_score: f64,
}

impl Default for KnowledgeBaseSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            number_of_results: DEFAULT_NUMBER_OF_RESULTS,
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

impl KnowledgeBaseSettings {
    pub fn to_tool_config(&self) -> Option<KnowledgeBaseConfig> {
        self.endpoint.as_ref().map(|endpoint| {
            KnowledgeBaseConfig::new(endpoint.clone())
                .with_number_of_results(self.number_of_results)
                .with_min_score(self.min_score)
        })
    }
}

impl Config {
    /// Load from the default locations.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment(Self::config_path()).extract()
    }

    /// The merged provider stack, with `path` as the TOML layer.
    ///
    /// A missing file contributes nothing.
    pub fn figment(path: Option<PathBuf>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::raw().only(&[API_KEY_FALLBACK_ENV]).map(|_| "api_key".into()))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]).split("__"))
    }

    /// `$ADVISOR_CONFIG`, else `<config_dir>/alert-advisor/config.toml`.
    pub fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("alert-advisor").join("config.toml"))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Copy safe to print.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.api_key.is_some() {
            config.api_key = Some(REDACTED.to_string());
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config: Config = Config::figment(None).extract()?;
            assert_eq!(config.model_id, "claude-3-7-sonnet-20250219");
            assert_eq!(config.max_iterations, 10);
            assert_eq!(config.max_tokens, 4096);
            assert!(config.knowledge_base.to_tool_config().is_none());
            Ok(())
        });
    }

    #[test]
    fn test_toml_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                model_id = "from-file"
                max_tokens = 2048
                request_timeout_secs = 45

                [knowledge_base]
                endpoint = "http://kb.local/retrieve"
                min_score = 0.6
                "#,
            )?;
            jail.set_env("ADVISOR_MODEL_ID", "from-env");
            jail.set_env("ADVISOR_KNOWLEDGE_BASE__NUMBER_OF_RESULTS", "5");

            let config: Config = Config::figment(Some("config.toml".into())).extract()?;
            assert_eq!(config.model_id, "from-env");
            assert_eq!(config.max_tokens, 2048);
            assert_eq!(config.request_timeout(), Some(Duration::from_secs(45)));

            let kb = config.knowledge_base.to_tool_config().unwrap();
            assert_eq!(kb.endpoint, "http://kb.local/retrieve");
            assert_eq!(kb.number_of_results, 5);
            assert_eq!(kb.min_score, 0.6);
            Ok(())
        });
    }

    #[test]
    fn test_api_key_fallback() {
        Jail::expect_with(|jail| {
            jail.set_env("ANTHROPIC_API_KEY", "sk-fallback");
            let config: Config = Config::figment(None).extract()?;
            assert_eq!(config.api_key.as_deref(), Some("sk-fallback"));

            jail.set_env("ADVISOR_API_KEY", "sk-advisor");
            let config: Config = Config::figment(None).extract()?;
            assert_eq!(config.api_key.as_deref(), Some("sk-advisor"));
            Ok(())
        });
    }

    #[test]
    fn test_config_path_env() {
        Jail::expect_with(|jail| {
            jail.set_env("ADVISOR_CONFIG", "/etc/alert-advisor.toml");
            assert_eq!(
                Config::config_path(),
                Some(PathBuf::from("/etc/alert-advisor.toml"))
            );
            // The path variable is not a config field
            let config: Config = Config::figment(None).extract()?;
            assert_eq!(config.model_id, Config::default().model_id);
            Ok(())
        });
    }

    #[test]
    fn test_redacted() {
        let config = Config {
            api_key: Some("sk-secret".to_string()),
            ..Config::default()
        };
        let shown = toml::to_string(&config.redacted()).unwrap();
        assert!(!shown.contains("sk-secret"));
        assert!(shown.contains(REDACTED));
    }
}
