//! Process configuration, read once from the environment at startup.

use std::fmt;

use tracing::warn;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_PROVIDER: &str = "groq";

pub const DEFAULT_GROQ_MODEL: &str = "mixtral-8x7b-32768";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.bing.microsoft.com/v7.0/search";
pub const DEFAULT_SEARCH_MARKET: &str = "en-US";
pub const DEFAULT_SEARCH_COUNT: usize = 3;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Deployment mode. Only `Development` exposes raw error text to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" => Environment::Development,
            _ => Environment::Production,
        }
    }

    pub fn exposes_error_details(self) -> bool {
        self == Environment::Development
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Credential and endpoint for one LLM provider.
#[derive(Clone)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    /// Name of the variable the key is read from, used in error messages.
    pub api_key_var: &'static str,
    pub model: String,
    pub base_url: String,
}

impl ProviderSettings {
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Sampling parameters shared by every provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Web search (retrieval augmentation) settings.
#[derive(Clone)]
pub struct SearchSettings {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub endpoint: String,
    pub market: String,
    pub count: usize,
}

impl fmt::Debug for SearchSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchSettings")
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("market", &self.market)
            .field("count", &self.count)
            .finish()
    }
}

/// Top-level Gompa configuration.
#[derive(Debug, Clone)]
pub struct GompaConfig {
    /// HTTP server port.
    pub port: u16,
    pub environment: Environment,
    /// Lower-cased provider name; resolved against the provider registry.
    pub provider: String,
    pub groq: ProviderSettings,
    pub openai: ProviderSettings,
    pub generation: GenerationSettings,
    pub search: SearchSettings,
    pub request_timeout_secs: u64,
    /// Single allowed CORS origin. `None` allows any origin.
    pub cors_origin: Option<String>,
}

impl GompaConfig {
    /// Create configuration from the process environment and defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// Empty values count as unset. Unparsable numbers fall back to their
    /// defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let environment = get("APP_ENV")
            .or_else(|| get("NODE_ENV"))
            .map(|v| Environment::parse(&v))
            .unwrap_or(Environment::Production);

        let provider = get("PROVIDER")
            .map(|p| p.to_ascii_lowercase())
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());

        let groq = ProviderSettings {
            api_key: get("GROQ_API_KEY"),
            api_key_var: "GROQ_API_KEY",
            model: get("GROQ_MODEL").unwrap_or_else(|| DEFAULT_GROQ_MODEL.into()),
            base_url: get("GROQ_BASE_URL").unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.into()),
        };

        let openai = ProviderSettings {
            api_key: get("OPENAI_API_KEY"),
            api_key_var: "OPENAI_API_KEY",
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.into()),
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.into()),
        };

        let generation = GenerationSettings {
            temperature: parse_or("LLM_TEMPERATURE", get("LLM_TEMPERATURE"), DEFAULT_TEMPERATURE),
            max_tokens: parse_or("LLM_MAX_TOKENS", get("LLM_MAX_TOKENS"), DEFAULT_MAX_TOKENS),
        };

        let search = SearchSettings {
            enabled: get("USE_WEB_SEARCH")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            api_key: get("BING_API_KEY"),
            endpoint: get("BING_ENDPOINT").unwrap_or_else(|| DEFAULT_SEARCH_ENDPOINT.into()),
            market: get("SEARCH_MARKET").unwrap_or_else(|| DEFAULT_SEARCH_MARKET.into()),
            count: parse_or(
                "SEARCH_RESULT_COUNT",
                get("SEARCH_RESULT_COUNT"),
                DEFAULT_SEARCH_COUNT,
            ),
        };

        Self {
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT),
            environment,
            provider,
            groq,
            openai,
            generation,
            search,
            request_timeout_secs: parse_or(
                "REQUEST_TIMEOUT_SECS",
                get("REQUEST_TIMEOUT_SECS"),
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            cors_origin: get("CORS_ORIGIN"),
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> T {
    match value {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}, using default", key, raw);
            default
        }),
        None => default,
    }
}
