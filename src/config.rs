use serde::{Deserialize, Deserializer};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the Plex Media Server
    pub plex_url: String,

    /// Plex authentication token (also used for the account watchlist)
    pub plex_token: String,

    /// OpenAI API key
    #[serde(rename = "open_ai_key")]
    pub openai_key: String,

    /// Library sections to build recommendations for
    #[serde(deserialize_with = "deserialize_list")]
    pub library_names: Vec<String>,

    /// Base title for generated collections
    pub collection_title: String,

    /// Number of history entries sampled per account and library
    #[serde(rename = "history_amount")]
    pub history_size: usize,

    /// Number of recommendations requested from the model
    #[serde(rename = "recommended_amount")]
    pub recommended_count: usize,

    /// A collection is only published when strictly more items than this matched;
    /// a negative value publishes even with no matches
    #[serde(rename = "minimum_amount")]
    pub minimum_matches: i64,

    /// Delay between passes
    #[serde(rename = "seconds_to_wait", default = "default_wait_seconds")]
    pub wait_seconds: u64,

    #[serde(deserialize_with = "deserialize_flag", default = "default_enabled")]
    pub add_to_watchlist: bool,

    #[serde(deserialize_with = "deserialize_flag", default = "default_enabled")]
    pub create_collections: bool,

    /// Account whose watchlist may be modified; its collections carry no name suffix
    #[serde(default)]
    pub target_username: Option<String>,

    /// Chat completion model
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// OpenAI API base URL
    #[serde(default = "default_openai_api_url")]
    pub openai_api_url: String,

    /// Plex discover provider base URL (global catalog and watchlist)
    #[serde(default = "default_discover_url")]
    pub plex_discover_url: String,

    /// Result cap for library catalog searches
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Verify the media server's TLS certificate
    #[serde(deserialize_with = "deserialize_flag", default)]
    pub verify_tls: bool,
}

fn default_wait_seconds() -> u64 {
    86400
}

fn default_enabled() -> bool {
    true
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_openai_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_discover_url() -> String {
    "https://discover.provider.plex.tv".to_string()
}

fn default_search_limit() -> usize {
    3
}

/// Accepts `0`/`1` (any non-zero integer is on) as well as `true`/`false`.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid flag value '{}'", raw)))
}

fn parse_flag(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n != 0);
    }
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn deserialize_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()
    }

    /// Load configuration from explicit key/value pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()
    }

    fn validate(self) -> anyhow::Result<Self> {
        if self.library_names.is_empty() {
            anyhow::bail!("Failed to load config: LIBRARY_NAMES names no libraries");
        }
        if self.search_limit == 0 {
            anyhow::bail!("Failed to load config: SEARCH_LIMIT must be at least 1");
        }
        Ok(self)
    }

    /// Whether `account_name` is the designated target account
    pub fn is_target_account(&self, account_name: &str) -> bool {
        self.target_username.as_deref() == Some(account_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_vars() -> Vec<(String, String)> {
        [
            ("PLEX_URL", "https://plex.local:32400"),
            ("PLEX_TOKEN", "plex-token"),
            ("OPEN_AI_KEY", "sk-test"),
            ("LIBRARY_NAMES", "TV Shows, Movies,"),
            ("COLLECTION_TITLE", "Recommended"),
            ("HISTORY_AMOUNT", "20"),
            ("RECOMMENDED_AMOUNT", "15"),
            ("MINIMUM_AMOUNT", "3"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn with_var(key: &str, value: &str) -> Vec<(String, String)> {
        let mut vars = base_vars();
        vars.push((key.to_string(), value.to_string()));
        vars
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(base_vars()).unwrap();
        assert_eq!(config.library_names, vec!["TV Shows", "Movies"]);
        assert_eq!(config.history_size, 20);
        assert_eq!(config.recommended_count, 15);
        assert_eq!(config.minimum_matches, 3);
        assert_eq!(config.wait_seconds, 86400);
        assert!(config.add_to_watchlist);
        assert!(config.create_collections);
        assert!(!config.verify_tls);
        assert_eq!(config.target_username, None);
        assert_eq!(config.openai_model, "gpt-3.5-turbo");
        assert_eq!(config.search_limit, 3);
    }

    #[test]
    fn test_numeric_toggles() {
        let config = Config::from_vars(with_var("ADD_TO_WATCHLIST", "0")).unwrap();
        assert!(!config.add_to_watchlist);
        assert!(config.create_collections);

        let config = Config::from_vars(with_var("CREATE_COLLECTIONS", "0")).unwrap();
        assert!(!config.create_collections);

        let config = Config::from_vars(with_var("VERIFY_TLS", "1")).unwrap();
        assert!(config.verify_tls);
    }

    #[test]
    fn test_invalid_toggle_rejected() {
        assert!(Config::from_vars(with_var("ADD_TO_WATCHLIST", "maybe")).is_err());
    }

    #[test]
    fn test_missing_required_value() {
        let vars: Vec<_> = base_vars()
            .into_iter()
            .filter(|(k, _)| k != "PLEX_TOKEN")
            .collect();
        assert!(Config::from_vars(vars).is_err());
    }

    #[test]
    fn test_empty_library_list_rejected() {
        let vars: Vec<_> = base_vars()
            .into_iter()
            .map(|(k, v)| {
                if k == "LIBRARY_NAMES" {
                    (k, " , ".to_string())
                } else {
                    (k, v)
                }
            })
            .collect();
        assert!(Config::from_vars(vars).is_err());
    }

    #[test]
    fn test_negative_minimum_accepted() {
        let vars: Vec<_> = base_vars()
            .into_iter()
            .map(|(k, v)| {
                if k == "MINIMUM_AMOUNT" {
                    (k, "-1".to_string())
                } else {
                    (k, v)
                }
            })
            .collect();
        let config = Config::from_vars(vars).unwrap();
        assert_eq!(config.minimum_matches, -1);
    }

    #[test]
    fn test_target_account() {
        let config = Config::from_vars(with_var("TARGET_USERNAME", "alice")).unwrap();
        assert!(config.is_target_account("alice"));
        assert!(!config.is_target_account("bob"));

        let config = Config::from_vars(base_vars()).unwrap();
        assert!(!config.is_target_account("alice"));
    }
}
