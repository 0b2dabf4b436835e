use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::warn;

use crate::airtable::AirtableClient;
use crate::config::ServerConfig;

/// Upstream payloads cached per endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    EventsLastUpdated,
    MapLastUpdated,
    MapListings,
}

/// Pre-serialized response body with its fetch time.
#[derive(Debug, Clone)]
pub struct CachedPayload {
    pub json: Bytes,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub http_client: reqwest::Client,
    pub cache: Arc<DashMap<CacheKey, CachedPayload>>,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    upstream_requests_total: AtomicU64,
    upstream_errors_total: AtomicU64,
    cache_hits_total: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObservabilitySnapshot {
    pub upstream_requests_total: u64,
    pub upstream_errors_total: u64,
    pub cache_hits_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            upstream_requests_total: self.upstream_requests_total.load(Ordering::Relaxed),
            upstream_errors_total: self.upstream_errors_total.load(Ordering::Relaxed),
            cache_hits_total: self.cache_hits_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_upstream_request(&self) {
        self.upstream_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_error(&self) {
        self.upstream_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits_total.fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let request_timeout = config.upstream_http_timeout;
        let connect_timeout = config.upstream_connect_timeout;
        let http_client = reqwest::Client::builder()
            .user_agent("atlas-map/0.1")
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(
                    error = %e,
                    "failed to build configured HTTP client, falling back to defaults"
                );
                reqwest::Client::new()
            });
        Self {
            config: Arc::new(config),
            http_client,
            cache: Arc::new(DashMap::new()),
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }

    /// Client for the events base; only the token is required.
    pub fn events_client(&self) -> Option<AirtableClient> {
        let airtable = &self.config.airtable;
        let token = airtable.token.as_deref()?;
        Some(AirtableClient::new(
            self.http_client.clone(),
            &airtable.api_url,
            token,
        ))
    }

    /// Client plus base id for the map base; both credentials are required.
    pub fn map_client(&self) -> Option<(AirtableClient, String)> {
        let airtable = &self.config.airtable;
        let base_id = airtable.base_id.clone()?;
        self.events_client().map(|client| (client, base_id))
    }

    pub fn cached(&self, key: CacheKey) -> Option<Bytes> {
        let ttl = self.config.upstream_cache_ttl_secs;
        let entry = self.cache.get(&key)?;
        let age = Utc::now()
            .signed_duration_since(entry.fetched_at)
            .num_seconds();
        if age < ttl {
            self.observability.record_cache_hit();
            Some(entry.json.clone())
        } else {
            None
        }
    }

    pub fn store(&self, key: CacheKey, json: Bytes) {
        if self.config.upstream_cache_ttl_secs == 0 {
            return;
        }
        self.cache.insert(
            key,
            CachedPayload {
                json,
                fetched_at: Utc::now(),
            },
        );
    }

    /// Drop expired entries; returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        let ttl = self.config.upstream_cache_ttl_secs;
        let now = Utc::now();
        let before = self.cache.len();
        self.cache.retain(|_, cached| {
            now.signed_duration_since(cached.fetched_at).num_seconds() < ttl
        });
        before.saturating_sub(self.cache.len())
    }
}
