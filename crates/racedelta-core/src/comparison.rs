//! Two-driver lap comparison for the latest completed event.

use std::collections::BTreeMap;

use tracing::debug;

use crate::adapters::openf1;
use crate::domain::{DriverCode, EventComparison, Season};
use crate::gateway::ProviderGateway;
use crate::source::ProviderId;

/// Compare two drivers' lap pace in the season's most recent completed race.
///
/// Missing sessions, unknown drivers, or absent lap data are all ordinary
/// "no data" outcomes, not errors.
pub async fn compare_drivers(
    gateway: &ProviderGateway,
    driver1: &DriverCode,
    driver2: &DriverCode,
    season: Season,
) -> Option<EventComparison> {
    let sessions_value = gateway
        .fetch(
            ProviderId::Openf1,
            "sessions",
            &[("year", season.year().to_string())],
        )
        .await
        .into_value()?;

    let sessions = openf1::parse_sessions(&sessions_value);
    let race = openf1::latest_race_session(&sessions)?;
    let session_key = race.session_key.to_string();

    debug!(%session_key, "comparing drivers in latest completed race");

    let drivers_value = gateway
        .fetch(
            ProviderId::Openf1,
            "drivers",
            &[("session_key", session_key.clone())],
        )
        .await
        .into_value()?;

    let mut drivers = BTreeMap::new();
    for code in [driver1, driver2] {
        let number = openf1::find_driver_number(&drivers_value, code)?;

        let laps_value = gateway
            .fetch(
                ProviderId::Openf1,
                "laps",
                &[
                    ("session_key", session_key.clone()),
                    ("driver_number", number.to_string()),
                ],
            )
            .await
            .into_value()?;

        let summary = openf1::parse_lap_summary(&laps_value)?;
        drivers.insert(code.clone(), summary);
    }

    Some(EventComparison {
        season,
        event: race
            .meeting_name
            .clone()
            .unwrap_or_else(|| race.session_name.clone()),
        drivers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};
    use crate::retry::{Backoff, RetryConfig};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::time::Duration;

    struct RoutedHttpClient {
        routes: Vec<(String, String)>,
    }

    impl RoutedHttpClient {
        fn new(routes: Vec<(&str, String)>) -> Self {
            Self {
                routes: routes
                    .into_iter()
                    .map(|(fragment, body)| (fragment.to_owned(), body))
                    .collect(),
            }
        }
    }

    impl HttpClient for RoutedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            let matched = self
                .routes
                .iter()
                .find(|(fragment, _)| request.url.contains(fragment.as_str()))
                .map(|(_, body)| body.clone());

            Box::pin(async move {
                match matched {
                    Some(body) => Ok(HttpResponse::ok_json(body)),
                    None => Err(HttpError::non_retryable("unrouted url")),
                }
            })
        }
    }

    fn gateway(routes: Vec<(&str, String)>) -> ProviderGateway {
        ProviderGateway::new(Arc::new(RoutedHttpClient::new(routes))).with_retry(RetryConfig {
            max_retries: 0,
            backoff: Backoff::Fixed {
                delay: Duration::ZERO,
            },
            ..RetryConfig::default()
        })
    }

    fn code(raw: &str) -> DriverCode {
        DriverCode::parse(raw).expect("valid code")
    }

    fn sessions_body() -> String {
        serde_json::json!([
            {"session_key": 9501, "session_name": "Race", "meeting_name": "Miami Grand Prix",
             "date_start": "2024-05-05T20:00:00Z", "date_end": "2024-05-05T22:00:00Z"},
            {"session_key": 9400, "session_name": "Race", "meeting_name": "Bahrain Grand Prix",
             "date_start": "2024-03-02T15:00:00Z", "date_end": "2024-03-02T17:00:00Z"}
        ])
        .to_string()
    }

    fn drivers_body() -> String {
        serde_json::json!([
            {"name_acronym": "VER", "driver_number": 1},
            {"name_acronym": "NOR", "driver_number": 4}
        ])
        .to_string()
    }

    #[tokio::test]
    async fn compares_both_drivers_in_the_latest_race() {
        let ver_laps = serde_json::json!([
            {"lap_duration": 91.0}, {"lap_duration": 93.0}
        ])
        .to_string();
        let nor_laps = serde_json::json!([
            {"lap_duration": 92.0}, {"lap_duration": 92.5}, {"lap_duration": null}
        ])
        .to_string();

        let gateway = gateway(vec![
            ("sessions", sessions_body()),
            ("drivers", drivers_body()),
            ("laps?session_key=9501&driver_number=1", ver_laps),
            ("laps?session_key=9501&driver_number=4", nor_laps),
        ]);

        let comparison = compare_drivers(&gateway, &code("VER"), &code("NOR"), Season::new(2024))
            .await
            .expect("comparison should build");

        assert_eq!(comparison.event, "Miami Grand Prix");
        assert_eq!(comparison.drivers.len(), 2);

        let ver = &comparison.drivers[&code("VER")];
        assert_eq!(ver.laps, 2);
        assert_eq!(ver.best_lap_time, 91.0);
        assert_eq!(ver.avg_lap_time, 92.0);

        let nor = &comparison.drivers[&code("NOR")];
        assert_eq!(nor.laps, 2, "untimed laps excluded");
    }

    #[tokio::test]
    async fn unknown_driver_is_a_no_data_outcome() {
        let gateway = gateway(vec![
            ("sessions", sessions_body()),
            ("drivers", drivers_body()),
        ]);

        let comparison =
            compare_drivers(&gateway, &code("VER"), &code("HAM"), Season::new(2024)).await;
        assert!(comparison.is_none());
    }

    #[tokio::test]
    async fn missing_sessions_listing_is_a_no_data_outcome() {
        let gateway = gateway(vec![]);

        let comparison =
            compare_drivers(&gateway, &code("VER"), &code("NOR"), Season::new(2024)).await;
        assert!(comparison.is_none());
    }
}
