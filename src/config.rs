use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the JSON movie catalog
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Path to the gzip-compressed similarity matrix
    #[serde(default = "default_similarity_path")]
    pub similarity_path: String,

    /// TMDB API keys, tried in order (comma separated in the environment)
    #[serde(default)]
    pub tmdb_api_keys: Vec<String>,

    /// Environment variables holding further TMDB keys, read on every lookup
    /// and tried after `tmdb_api_keys`
    #[serde(default)]
    pub tmdb_api_key_vars: Vec<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Language passed to the TMDB movie details endpoint
    #[serde(default = "default_tmdb_language")]
    pub tmdb_language: String,

    /// Image CDN prefix prepended to poster paths
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,

    /// Image shown when no poster can be resolved
    #[serde(default = "default_placeholder_url")]
    pub placeholder_url: String,

    /// Per-attempt timeout for metadata requests, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Transport-level retries on transient HTTP statuses
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Backoff factor for transport retries, in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Concurrent poster lookups per batch
    #[serde(default = "default_poster_workers")]
    pub poster_workers: usize,

    /// Redis connection URL; the poster cache is disabled when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Poster cache TTL in seconds
    #[serde(default = "default_poster_cache_ttl")]
    pub poster_cache_ttl: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_catalog_path() -> String {
    "data/movie_list.json".to_string()
}

fn default_similarity_path() -> String {
    "data/similarity.bin.gz".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_language() -> String {
    "en-US".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_placeholder_url() -> String {
    "https://via.placeholder.com/500x750?text=Movie&bgcolor=555&txtcolor=999".to_string()
}

fn default_request_timeout_secs() -> u64 {
    3
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_poster_workers() -> usize {
    3
}

fn default_poster_cache_ttl() -> u64 {
    86400 // 1 day
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// API keys with blank entries removed
    pub fn api_keys(&self) -> Vec<String> {
        non_blank(&self.tmdb_api_keys)
    }

    /// Names of the key variables, blank entries removed
    pub fn api_key_vars(&self) -> Vec<String> {
        non_blank(&self.tmdb_api_key_vars)
    }
}

fn non_blank(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
