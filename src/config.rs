//! Runtime configuration for the scout.
//!
//! Values come from the process environment (after `.env` has been loaded by
//! the binary) and are then overridden by command-line flags.

use std::path::PathBuf;

use crate::error::{Result, ScoutError};
use crate::stagehand::{
    Credentials, DEFAULT_API_URL, DEFAULT_MODEL, Env, LocalBrowserLaunchOptions, Model,
    SessionOptions,
};

pub const DEFAULT_SEARCH_ITEM: &str = "screens";
pub const DEFAULT_MAX_ITEMS: usize = 5;
pub const DEFAULT_ACT_TIMEOUT_MS: u32 = 60_000;

/// Model key lookup order.
const MODEL_KEY_VARS: [&str; 3] = ["MODEL_API_KEY", "OPENAI_API_KEY", "ANTHROPIC_API_KEY"];

/// Every variable the scout reads, and whether its value is a secret.
pub const ENV_VARS: [(&str, bool); 12] = [
    ("STAGEHAND_API_URL", false),
    ("STAGEHAND_ENV", false),
    ("STAGEHAND_MODEL", false),
    ("MODEL_API_KEY", true),
    ("OPENAI_API_KEY", true),
    ("ANTHROPIC_API_KEY", true),
    ("BROWSERBASE_API_KEY", true),
    ("BROWSERBASE_PROJECT_ID", false),
    ("USER_DATA_DIR", false),
    ("SCOUT_SEARCH_ITEM", false),
    ("SCOUT_MAX_ITEMS", false),
    ("SCOUT_ACT_TIMEOUT_MS", false),
];

#[derive(Debug, Clone)]
pub struct ScoutConfig {
    pub api_url: String,
    pub env: Env,
    pub model: String,
    pub model_api_key: Option<String>,
    pub browserbase_api_key: Option<String>,
    pub browserbase_project_id: Option<String>,
    /// Profile directory of a browser already logged in to Facebook.
    pub user_data_dir: Option<PathBuf>,
    pub search_item: String,
    /// `None` means the user is asked.
    pub headless: Option<bool>,
    pub max_items: usize,
    pub act_timeout_ms: u32,
    pub verbose: u8,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            env: Env::Local,
            model: DEFAULT_MODEL.to_string(),
            model_api_key: None,
            browserbase_api_key: None,
            browserbase_project_id: None,
            user_data_dir: None,
            search_item: DEFAULT_SEARCH_ITEM.to_string(),
            headless: None,
            max_items: DEFAULT_MAX_ITEMS,
            act_timeout_ms: DEFAULT_ACT_TIMEOUT_MS,
            verbose: 0,
        }
    }
}

impl ScoutConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source. Empty values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            api_url: get("STAGEHAND_API_URL").unwrap_or(defaults.api_url),
            env: get("STAGEHAND_ENV").map(|v| v.parse::<Env>()).transpose()?.unwrap_or(defaults.env),
            model: get("STAGEHAND_MODEL").unwrap_or(defaults.model),
            model_api_key: MODEL_KEY_VARS.iter().find_map(|key| get(*key)),
            browserbase_api_key: get("BROWSERBASE_API_KEY"),
            browserbase_project_id: get("BROWSERBASE_PROJECT_ID"),
            user_data_dir: get("USER_DATA_DIR").map(PathBuf::from),
            search_item: get("SCOUT_SEARCH_ITEM").unwrap_or(defaults.search_item),
            headless: None,
            max_items: parse_number::<usize>(get("SCOUT_MAX_ITEMS"), "SCOUT_MAX_ITEMS")?.unwrap_or(defaults.max_items),
            act_timeout_ms: parse_number::<u32>(get("SCOUT_ACT_TIMEOUT_MS"), "SCOUT_ACT_TIMEOUT_MS")?
                .unwrap_or(defaults.act_timeout_ms),
            verbose: 0,
        })
    }

    /// Checks everything a run needs before a session is opened.
    pub fn validate(&self) -> Result<()> {
        if self.env == Env::Local && self.user_data_dir.is_none() {
            return Err(ScoutError::config(
                "USER_DATA_DIR must be provided either as an argument or in the .env file",
            ));
        }
        if self.model_api_key.is_none() {
            return Err(ScoutError::MissingApiKey(MODEL_KEY_VARS.join(" or ")));
        }
        if self.max_items == 0 {
            return Err(ScoutError::config("SCOUT_MAX_ITEMS must be at least 1"));
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            model_api_key: self.model_api_key.clone().unwrap_or_default(),
            browserbase_api_key: self.browserbase_api_key.clone(),
            browserbase_project_id: self.browserbase_project_id.clone(),
        }
    }

    /// Session options for a run with the given browser visibility.
    pub fn session_options(&self, headless: bool) -> SessionOptions {
        SessionOptions {
            env: self.env,
            model: Some(Model::String(self.model.clone())),
            local_browser_launch_options: Some(LocalBrowserLaunchOptions {
                headless: Some(headless),
                user_data_dir: self.user_data_dir.as_ref().map(|p| p.display().to_string()),
                ..Default::default()
            }),
            act_timeout_ms: Some(self.act_timeout_ms),
            verbose: Some(i32::from(self.verbose.min(2))),
            ..Default::default()
        }
    }
}

fn parse_number<T: std::str::FromStr>(value: Option<String>, key: &str) -> Result<Option<T>> {
    value
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| ScoutError::config(format!("{key} must be a positive integer, got '{v}'")))
        })
        .transpose()
}

/// `KEY: value` lines for every variable in [`ENV_VARS`]; secrets keep only
/// their last four characters.
pub fn env_report(lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
    ENV_VARS
        .iter()
        .map(|(key, secret)| match lookup(*key) {
            Some(value) if *secret => format!("{key}: {}", mask(&value)),
            Some(value) => format!("{key}: {value}"),
            None => format!("{key}: None"),
        })
        .collect()
}

fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{tail}", "*".repeat(chars.len() - 4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = ScoutConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.env, Env::Local);
        assert_eq!(config.search_item, "screens");
        assert_eq!(config.max_items, 5);
        assert_eq!(config.headless, None);
        assert!(config.model_api_key.is_none());
    }

    #[test]
    fn test_model_key_lookup_order() {
        let config = ScoutConfig::from_lookup(lookup_from(&[
            ("ANTHROPIC_API_KEY", "anthropic"),
            ("OPENAI_API_KEY", "openai"),
        ]))
        .unwrap();
        assert_eq!(config.model_api_key.as_deref(), Some("openai"));
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = ScoutConfig::from_lookup(lookup_from(&[("USER_DATA_DIR", "  ")])).unwrap();
        assert!(config.user_data_dir.is_none());
    }

    #[test]
    fn test_invalid_numbers_are_config_errors() {
        let err = ScoutConfig::from_lookup(lookup_from(&[("SCOUT_MAX_ITEMS", "five")])).unwrap_err();
        assert!(matches!(err, ScoutError::Config(_)));
        assert!(err.to_string().contains("SCOUT_MAX_ITEMS"));
    }

    #[test]
    fn test_local_runs_need_a_profile_directory() {
        let config = ScoutConfig {
            model_api_key: Some("key".into()),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("USER_DATA_DIR"));

        let browserbase = ScoutConfig { env: Env::Browserbase, ..config };
        assert!(browserbase.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_model_key() {
        let config = ScoutConfig {
            user_data_dir: Some(PathBuf::from("/tmp/profile")),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ScoutError::MissingApiKey(_))));
    }

    #[test]
    fn test_session_options_carry_headless_and_profile() {
        let config = ScoutConfig {
            user_data_dir: Some(PathBuf::from("/tmp/profile")),
            ..Default::default()
        };
        let opts = config.session_options(false);
        let launch = opts.local_browser_launch_options.expect("launch options");
        assert_eq!(launch.headless, Some(false));
        assert_eq!(launch.user_data_dir.as_deref(), Some("/tmp/profile"));
        assert_eq!(opts.act_timeout_ms, Some(DEFAULT_ACT_TIMEOUT_MS));
    }

    #[test]
    fn test_env_report_masks_secrets() {
        let report = env_report(lookup_from(&[
            ("OPENAI_API_KEY", "sk-abcdef1234"),
            ("USER_DATA_DIR", "/home/me/profile"),
        ]));
        assert!(report.contains(&"OPENAI_API_KEY: *********1234".to_string()));
        assert!(report.contains(&"USER_DATA_DIR: /home/me/profile".to_string()));
        assert!(report.contains(&"BROWSERBASE_API_KEY: None".to_string()));
        assert_eq!(report.len(), ENV_VARS.len());
    }

    #[test]
    fn test_short_secrets_are_fully_masked() {
        assert_eq!(mask("abc"), "***");
    }
}
