//! Shared helpers for the behavior test suites.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use racedelta_core::{
    AliasTable, DurableCache, HttpClient, HttpError, HttpRequest, HttpResponse,
    IdentityReconciler, ProviderGateway, RaceDataService, RetryConfig,
};

/// Transport that answers by URL fragment, with optional per-route delays so
/// tests can scramble completion order. Unrouted URLs fail permanently.
pub struct RoutedHttpClient {
    routes: Vec<Route>,
    requests: Mutex<Vec<String>>,
}

struct Route {
    fragment: String,
    body: String,
    delay: Duration,
}

impl RoutedHttpClient {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn route(mut self, fragment: &str, body: impl Into<String>) -> Self {
        self.routes.push(Route {
            fragment: fragment.to_owned(),
            body: body.into(),
            delay: Duration::ZERO,
        });
        self
    }

    pub fn route_delayed(mut self, fragment: &str, body: impl Into<String>, delay: Duration) -> Self {
        self.routes.push(Route {
            fragment: fragment.to_owned(),
            body: body.into(),
            delay,
        });
        self
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests.lock().expect("request log lock").clone()
    }
}

impl Default for RoutedHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for RoutedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests
            .lock()
            .expect("request log lock")
            .push(request.url.clone());

        let matched = self
            .routes
            .iter()
            .find(|route| request.url.contains(route.fragment.as_str()))
            .map(|route| (route.body.clone(), route.delay));

        Box::pin(async move {
            match matched {
                Some((body, delay)) => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    Ok(HttpResponse::ok_json(body))
                }
                None => Err(HttpError::non_retryable("unrouted url")),
            }
        })
    }
}

/// A service over a scripted transport and a throwaway durable store.
///
/// Today is pinned to 2024-12-01 so completed-round selection stays
/// deterministic. Keep the returned `TempDir` alive for the store's sake;
/// the store handle lets tests seed or inspect the durable tier directly.
pub fn scripted_service(
    client: Arc<RoutedHttpClient>,
) -> (tempfile::TempDir, Arc<DurableCache>, RaceDataService) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store =
        Arc::new(DurableCache::open(dir.path().join("cache.duckdb")).expect("store opens"));

    let gateway = ProviderGateway::new(client).with_retry(RetryConfig {
        max_retries: 0,
        ..RetryConfig::default()
    });

    let service = RaceDataService::new(
        Arc::new(gateway),
        Arc::clone(&store),
        Arc::new(IdentityReconciler::new(AliasTable::standard())),
    )
    .with_today(time::Date::from_calendar_date(2024, time::Month::December, 1).expect("date"));

    (dir, store, service)
}

/// Ergast schedule body with three completed 2024 rounds and one in the far
/// future.
pub fn schedule_2024() -> String {
    serde_json::json!({
        "MRData": {"RaceTable": {"Races": [
            {"round": "1", "raceName": "Bahrain Grand Prix", "date": "2024-03-02"},
            {"round": "2", "raceName": "Saudi Arabian Grand Prix", "date": "2024-03-09"},
            {"round": "3", "raceName": "Australian Grand Prix", "date": "2024-03-24"},
            {"round": "4", "raceName": "Japanese Grand Prix", "date": "2099-04-07"}
        ]}}
    })
    .to_string()
}

/// Ergast round results for a fixed three-driver field.
///
/// `placings` lists `(code, team, position_text, points)` rows.
pub fn round_results_2024(round: u32, race_name: &str, placings: &[(&str, &str, &str, &str)]) -> String {
    let results: Vec<serde_json::Value> = placings
        .iter()
        .map(|(code, team, position_text, points)| {
            serde_json::json!({
                "positionText": position_text,
                "points": points,
                "status": if position_text.parse::<u32>().is_ok() { "Finished" } else { "Collision" },
                "Driver": {"code": code, "givenName": code, "familyName": "Driver"},
                "Constructor": {"name": team}
            })
        })
        .collect();

    serde_json::json!({
        "MRData": {"RaceTable": {"Races": [{
            "season": "2024",
            "round": round.to_string(),
            "raceName": race_name,
            "Results": results
        }]}}
    })
    .to_string()
}
