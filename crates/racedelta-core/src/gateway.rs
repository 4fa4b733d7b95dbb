//! Uniform fetch primitive over the upstream JSON providers.
//!
//! A fetch walks the provider family's mirror list in order, retrying
//! transient failures (timeouts, 429, 5xx) with exponential backoff and
//! giving up immediately on permanent ones (other 4xx, malformed JSON).
//! Successful bodies are written through the memory tier unconditionally;
//! when every mirror is exhausted a stale cached body is preferred over
//! reporting a miss. Upstream failure is never an `Err` here: the worst a
//! caller can see is [`FetchOutcome::Miss`].

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::MemoryCache;
use crate::http_client::{HttpClient, HttpRequest};
use crate::retry::RetryConfig;
use crate::source::ProviderId;
use crate::throttle::RequestBudget;

/// Result of a gateway fetch, tagged with where the body came from.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Fetched live from an upstream mirror on this call.
    Fresh(Value),
    /// Served from a non-expired cache entry.
    Cached(Value),
    /// Every mirror failed; served from an expired cache entry.
    Stale(Value),
    /// No mirror answered and no cached body exists.
    Miss,
}

impl FetchOutcome {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Fresh(value) | Self::Cached(value) | Self::Stale(value) => Some(value),
            Self::Miss => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Fresh(value) | Self::Cached(value) | Self::Stale(value) => Some(value),
            Self::Miss => None,
        }
    }

    pub const fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }

    /// Whether the body came from a live upstream call.
    pub const fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }
}

struct ProviderFamily {
    mirrors: Vec<String>,
    budget: RequestBudget,
}

/// Gateway over every upstream provider family.
///
/// Constructed once at startup and shared via `Arc`; holds the only HTTP
/// client and the Tier-1 cache.
pub struct ProviderGateway {
    client: Arc<dyn HttpClient>,
    cache: MemoryCache,
    retry: RetryConfig,
    timeout_ms: u64,
    families: HashMap<ProviderId, ProviderFamily>,
}

impl ProviderGateway {
    /// Gateway with the default mirror lists, budgets, and cache bounds.
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        let mut families = HashMap::new();
        families.insert(
            ProviderId::Ergast,
            ProviderFamily {
                mirrors: vec![
                    String::from("https://ergast.com/api/f1"),
                    String::from("https://api.jolpi.ca/ergast/f1"),
                ],
                budget: RequestBudget::default_per_minute(),
            },
        );
        families.insert(
            ProviderId::Openf1,
            ProviderFamily {
                mirrors: vec![String::from("https://api.openf1.org/v1")],
                budget: RequestBudget::default_per_minute(),
            },
        );

        Self {
            client,
            cache: MemoryCache::with_defaults(),
            retry: RetryConfig::default(),
            timeout_ms: 15_000,
            families,
        }
    }

    /// Replace the mirror list for one provider family.
    pub fn with_mirrors(mut self, provider: ProviderId, mirrors: Vec<String>) -> Self {
        if let Some(family) = self.families.get_mut(&provider) {
            family.mirrors = mirrors;
        }
        self
    }

    /// Replace the request budget for one provider family.
    pub fn with_budget(mut self, provider: ProviderId, budget: RequestBudget) -> Self {
        if let Some(family) = self.families.get_mut(&provider) {
            family.budget = budget;
        }
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cache(mut self, cache: MemoryCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn cache(&self) -> &MemoryCache {
        &self.cache
    }

    /// Fetch a JSON document from a provider family.
    ///
    /// `path` is the endpoint path below the mirror base; `params` become
    /// URL-encoded query parameters in the given order.
    pub async fn fetch(
        &self,
        provider: ProviderId,
        path: &str,
        params: &[(&str, String)],
    ) -> FetchOutcome {
        let query = encode_query(params);
        let cache_key = format!("{provider}:{}{query}", path.trim_matches('/'));

        if let Some(value) = self.cache.get(&cache_key) {
            debug!(%provider, path, "serving fresh cache entry");
            return FetchOutcome::Cached(value);
        }

        let Some(family) = self.families.get(&provider) else {
            warn!(%provider, "no mirrors configured");
            return self.stale_or_miss(&cache_key);
        };

        if !family.budget.acquire() {
            warn!(%provider, path, "request budget exhausted, degrading to cache");
            return self.stale_or_miss(&cache_key);
        }

        for (mirror_index, base) in family.mirrors.iter().enumerate() {
            let url = format!("{}/{}{query}", base.trim_end_matches('/'), path.trim_matches('/'));

            if mirror_index > 0 {
                debug!(%provider, mirror = base.as_str(), "failing over to mirror");
            }

            if let Some(value) = self.fetch_from_mirror(provider, &url).await {
                self.cache.put(cache_key, value.clone(), None);
                return FetchOutcome::Fresh(value);
            }
        }

        warn!(%provider, path, "all mirrors exhausted");
        self.stale_or_miss(&cache_key)
    }

    /// Run the retry loop against one mirror. `None` means this mirror is
    /// done for, whether by exhausted retries or a permanent failure.
    async fn fetch_from_mirror(&self, provider: ProviderId, url: &str) -> Option<Value> {
        for attempt in 0..=self.retry.max_retries {
            let request = HttpRequest::get(url).with_timeout_ms(self.timeout_ms);

            // Arms that fall through are transient and go through backoff.
            match self.client.execute(request).await {
                Ok(response) if response.is_success() => {
                    match serde_json::from_str::<Value>(&response.body) {
                        Ok(value) => return Some(value),
                        Err(error) => {
                            warn!(%provider, url, %error, "malformed JSON body");
                            return None;
                        }
                    }
                }
                Ok(response) if self.retry.should_retry_status(response.status) => {
                    debug!(%provider, url, status = response.status, attempt, "transient status");
                }
                Ok(response) => {
                    warn!(%provider, url, status = response.status, "permanent upstream failure");
                    return None;
                }
                Err(error) if error.retryable() => {
                    debug!(%provider, url, error = error.message(), attempt, "transport error");
                }
                Err(error) => {
                    warn!(%provider, url, error = error.message(), "permanent transport error");
                    return None;
                }
            }

            if attempt < self.retry.max_retries {
                tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
            }
        }

        None
    }

    fn stale_or_miss(&self, cache_key: &str) -> FetchOutcome {
        match self.cache.get_stale(cache_key) {
            Some(value) => {
                debug!(cache_key, "serving stale cache entry");
                FetchOutcome::Stale(value)
            }
            None => FetchOutcome::Miss,
        }
    }
}

fn encode_query(params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return String::new();
    }

    let encoded = params
        .iter()
        .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    format!("?{encoded}")
}
