use std::path::PathBuf;
use std::time::Duration;

pub const AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";

// Events & training metadata lives in its own base.
pub const EVENTS_BASE_ID: &str = "appF8XfZUGXtfi40E";
pub const EVENTS_METADATA_TABLE_ID: &str = "tblsglkum9Op43mvq";
pub const EVENTS_METADATA_RECORD_ID: &str = "rec0oNUMVZuYVXU82";

pub const MAP_METADATA_TABLE_ID: &str = "tblvzbGL9q9dOO9Nc";
pub const MAP_LAST_UPDATED_RECORD_ID: &str = "recvDWyM9MW9q1GUj";
pub const MAP_LISTINGS_TABLE: &str = "Map";

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "client/dist";
pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_UPSTREAM_CACHE_TTL_SECS: i64 = 300; // 5 minutes
pub const CACHE_EVICTION_INTERVAL_SECS: u64 = 300;
pub const AIRTABLE_PAGE_SIZE: u32 = 100;

/// Everything the proxy reads from the environment, captured once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: PathBuf,
    pub airtable: AirtableConfig,
    pub upstream_http_timeout: Duration,
    pub upstream_connect_timeout: Duration,
    pub upstream_cache_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct AirtableConfig {
    pub api_url: String,
    pub token: Option<String>,
    /// Base holding the map listings and map metadata.
    pub base_id: Option<String>,
    pub events_base_id: String,
    pub events_table_id: String,
    pub events_record_id: String,
    pub map_metadata_table_id: String,
    pub map_last_updated_record_id: String,
    pub listings_table: String,
}

impl Default for AirtableConfig {
    fn default() -> Self {
        Self {
            api_url: AIRTABLE_API_URL.to_string(),
            token: None,
            base_id: None,
            events_base_id: EVENTS_BASE_ID.to_string(),
            events_table_id: EVENTS_METADATA_TABLE_ID.to_string(),
            events_record_id: EVENTS_METADATA_RECORD_ID.to_string(),
            map_metadata_table_id: MAP_METADATA_TABLE_ID.to_string(),
            map_last_updated_record_id: MAP_LAST_UPDATED_RECORD_ID.to_string(),
            listings_table: MAP_LISTINGS_TABLE.to_string(),
        }
    }
}

impl AirtableConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: non_empty_var("AIRTABLE_API_URL").unwrap_or(defaults.api_url),
            token: non_empty_var("AIRTABLE_TOKEN"),
            base_id: non_empty_var("AIRTABLE_BASE_ID"),
            events_base_id: non_empty_var("AIRTABLE_EVENTS_BASE_ID")
                .unwrap_or(defaults.events_base_id),
            listings_table: non_empty_var("AIRTABLE_MAP_TABLE").unwrap_or(defaults.listings_table),
            ..defaults
        }
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some() && self.base_id.is_some()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERVER_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            airtable: AirtableConfig::default(),
            upstream_http_timeout: Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS),
            upstream_connect_timeout: Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS),
            upstream_cache_ttl_secs: DEFAULT_UPSTREAM_CACHE_TTL_SECS,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            port: server_port(),
            static_dir: non_empty_var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            airtable: AirtableConfig::from_env(),
            upstream_http_timeout: upstream_http_timeout(),
            upstream_connect_timeout: upstream_connect_timeout(),
            upstream_cache_ttl_secs: upstream_cache_ttl_secs(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn server_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn upstream_http_timeout() -> Duration {
    std::env::var("UPSTREAM_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS))
}

pub fn upstream_connect_timeout() -> Duration {
    std::env::var("UPSTREAM_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS))
}

/// Zero disables the upstream response cache.
pub fn upstream_cache_ttl_secs() -> i64 {
    std::env::var("UPSTREAM_CACHE_TTL_SECS")
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .filter(|value| *value >= 0)
        .unwrap_or(DEFAULT_UPSTREAM_CACHE_TTL_SECS)
}
