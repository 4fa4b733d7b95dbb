//! Two-driver season timelines.
//!
//! Per-round results are fetched through a bounded worker pool, so a slow
//! season never opens more than a handful of upstream calls at once. Fetch
//! completion order is irrelevant: rounds are folded sequentially in
//! ascending round order after the fan-in, which is the single ordering
//! barrier. A round that fails to fetch, or where either driver is missing,
//! contributes nothing.

use std::sync::Arc;

use time::{Date, OffsetDateTime};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::adapters::ergast;
use crate::domain::{
    DriverCode, HeadToHead, PairScore, RaceEvent, RoundWinner, Season, TimelineRound,
    TimelineSeries,
};
use crate::gateway::ProviderGateway;
use crate::source::ProviderId;

/// Default width of the per-round fetch pool.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Both drivers' points for one completed round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundScores {
    pub round: u32,
    pub race_name: String,
    pub driver1_points: f64,
    pub driver2_points: f64,
}

/// Builds head-to-head timelines for a driver pair.
pub struct TimelineBuilder {
    gateway: Arc<ProviderGateway>,
    concurrency: usize,
    today: Date,
}

impl TimelineBuilder {
    pub fn new(gateway: Arc<ProviderGateway>) -> Self {
        Self {
            gateway,
            concurrency: DEFAULT_CONCURRENCY,
            today: OffsetDateTime::now_utc().date(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Pin "today" for deterministic completed-round selection.
    pub fn with_today(mut self, today: Date) -> Self {
        self.today = today;
        self
    }

    /// Build the timeline for two drivers across a season.
    ///
    /// Never fails: with no usable schedule or no shared rounds the series
    /// is simply empty.
    pub async fn build(
        &self,
        driver1: &DriverCode,
        driver2: &DriverCode,
        season: Season,
    ) -> TimelineSeries {
        let schedule = self
            .gateway
            .fetch(ProviderId::Ergast, &ergast::schedule_path(season), &[])
            .await
            .into_value()
            .map(|value| ergast::parse_schedule(&value))
            .unwrap_or_default();

        let completed: Vec<RaceEvent> = schedule
            .into_iter()
            .filter(|event| event.date <= self.today)
            .collect();

        debug!(
            season = season.year(),
            completed = completed.len(),
            "building timeline"
        );

        let scores = self.fetch_rounds(&completed, driver1, driver2, season).await;
        fold_rounds(driver1.clone(), driver2.clone(), season, scores)
    }

    /// Fan out per-round fetches through the bounded pool.
    async fn fetch_rounds(
        &self,
        completed: &[RaceEvent],
        driver1: &DriverCode,
        driver2: &DriverCode,
        season: Season,
    ) -> Vec<RoundScores> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(completed.len());

        for event in completed {
            let gateway = Arc::clone(&self.gateway);
            let semaphore = Arc::clone(&semaphore);
            let round = event.round;
            let driver1 = driver1.clone();
            let driver2 = driver2.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                fetch_round_scores(&gateway, season, round, &driver1, &driver2).await
            }));
        }

        let mut scores = Vec::new();
        for handle in handles {
            if let Ok(Some(score)) = handle.await {
                scores.push(score);
            }
        }
        scores
    }
}

async fn fetch_round_scores(
    gateway: &ProviderGateway,
    season: Season,
    round: u32,
    driver1: &DriverCode,
    driver2: &DriverCode,
) -> Option<RoundScores> {
    let value = gateway
        .fetch(
            ProviderId::Ergast,
            &ergast::round_results_path(season, round),
            &[],
        )
        .await
        .into_value()?;

    let classifications = ergast::parse_round_results(&value);
    let race_name = classifications.first()?.race_name.clone();

    let points_of = |driver: &DriverCode| {
        classifications
            .iter()
            .find(|row| row.driver_code == *driver)
            .map(|row| row.points)
    };

    Some(RoundScores {
        round,
        race_name,
        driver1_points: points_of(driver1)?,
        driver2_points: points_of(driver2)?,
    })
}

/// Fold fetched rounds into the final series.
///
/// Sorts ascending by round before accumulating, so the result is invariant
/// to fetch completion order. A round where both drivers score the same is
/// recorded as [`RoundWinner::Tied`] and decides the head-to-head for
/// neither driver.
pub fn fold_rounds(
    driver1: DriverCode,
    driver2: DriverCode,
    season: Season,
    mut scores: Vec<RoundScores>,
) -> TimelineSeries {
    scores.sort_by_key(|score| score.round);

    let mut cumulative = PairScore {
        driver1: 0.0,
        driver2: 0.0,
    };
    let mut head_to_head = HeadToHead::default();
    let mut rounds = Vec::with_capacity(scores.len());

    for score in scores {
        cumulative.driver1 += score.driver1_points;
        cumulative.driver2 += score.driver2_points;

        let winner = if score.driver1_points > score.driver2_points {
            head_to_head.driver1 += 1;
            RoundWinner::Driver1
        } else if score.driver2_points > score.driver1_points {
            head_to_head.driver2 += 1;
            RoundWinner::Driver2
        } else {
            RoundWinner::Tied
        };

        rounds.push(TimelineRound {
            round: score.round,
            race_name: score.race_name,
            points: PairScore {
                driver1: score.driver1_points,
                driver2: score.driver2_points,
            },
            cumulative,
            winner,
        });
    }

    TimelineSeries {
        season,
        driver1,
        driver2,
        rounds,
        head_to_head,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};
    use crate::retry::{Backoff, RetryConfig};
    use std::collections::HashMap;
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    fn code(raw: &str) -> DriverCode {
        DriverCode::parse(raw).expect("valid code")
    }

    fn score(round: u32, p1: f64, p2: f64) -> RoundScores {
        RoundScores {
            round,
            race_name: format!("Round {round} Grand Prix"),
            driver1_points: p1,
            driver2_points: p2,
        }
    }

    #[test]
    fn fold_is_invariant_to_arrival_order() {
        let ordered = vec![score(1, 25.0, 18.0), score(2, 18.0, 25.0), score(3, 10.0, 12.0)];
        let shuffled = vec![score(3, 10.0, 12.0), score(1, 25.0, 18.0), score(2, 18.0, 25.0)];

        let a = fold_rounds(code("VER"), code("NOR"), Season::new(2024), ordered);
        let b = fold_rounds(code("VER"), code("NOR"), Season::new(2024), shuffled);

        assert_eq!(a, b);
        assert_eq!(a.rounds.len(), 3);
        assert_eq!(a.rounds[2].cumulative.driver1, 53.0);
        assert_eq!(a.rounds[2].cumulative.driver2, 55.0);
        assert_eq!(a.head_to_head, HeadToHead { driver1: 1, driver2: 2 });
    }

    #[test]
    fn tied_rounds_decide_for_neither_driver() {
        let scores = vec![score(1, 12.0, 12.0), score(2, 25.0, 18.0)];

        let series = fold_rounds(code("VER"), code("NOR"), Season::new(2024), scores);

        assert_eq!(series.rounds[0].winner, RoundWinner::Tied);
        assert_eq!(series.rounds[1].winner, RoundWinner::Driver1);
        let decided = series.head_to_head.driver1 + series.head_to_head.driver2;
        assert_eq!(decided, 1, "only the decided round counts");
    }

    #[test]
    fn empty_scores_fold_to_an_empty_series() {
        let series = fold_rounds(code("VER"), code("NOR"), Season::new(2024), Vec::new());

        assert!(series.rounds.is_empty());
        assert_eq!(series.head_to_head, HeadToHead::default());
    }

    /// Transport answering by URL, with an optional per-URL delay so tests
    /// can scramble completion order.
    struct RoutedHttpClient {
        routes: HashMap<String, (String, Duration)>,
    }

    impl RoutedHttpClient {
        fn new() -> Self {
            Self {
                routes: HashMap::new(),
            }
        }

        fn route(mut self, fragment: &str, body: String, delay: Duration) -> Self {
            self.routes.insert(fragment.to_owned(), (body, delay));
            self
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
                .map(|(_, (body, delay))| (body.clone(), *delay));

            Box::pin(async move {
                match matched {
                    Some((body, delay)) => {
                        tokio::time::sleep(delay).await;
                        Ok(HttpResponse::ok_json(body))
                    }
                    None => Err(HttpError::non_retryable("unrouted url")),
                }
            })
        }
    }

    fn schedule_body() -> String {
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

    fn results_body(round: u32, name: &str, ver: f64, nor: f64) -> String {
        serde_json::json!({
            "MRData": {"RaceTable": {"Races": [{
                "season": "2024",
                "round": round.to_string(),
                "raceName": name,
                "Results": [
                    {"positionText": "1", "points": ver.to_string(), "status": "Finished",
                     "Driver": {"code": "VER"}, "Constructor": {"name": "Red Bull"}},
                    {"positionText": "2", "points": nor.to_string(), "status": "Finished",
                     "Driver": {"code": "NOR"}, "Constructor": {"name": "McLaren"}}
                ]
            }]}}
        })
        .to_string()
    }

    fn test_builder(client: RoutedHttpClient) -> TimelineBuilder {
        let gateway = ProviderGateway::new(Arc::new(client))
            .with_retry(RetryConfig {
                max_retries: 0,
                backoff: Backoff::Fixed {
                    delay: Duration::ZERO,
                },
                ..RetryConfig::default()
            })
            .with_mirrors(ProviderId::Ergast, vec![String::from("https://f1.test")]);

        TimelineBuilder::new(Arc::new(gateway))
            .with_concurrency(2)
            .with_today(Date::from_calendar_date(2024, time::Month::December, 1).expect("date"))
    }

    #[tokio::test]
    async fn builds_rounds_in_order_despite_scrambled_completion() {
        // Round 1 answers slowest, round 3 fastest.
        let client = RoutedHttpClient::new()
            .route("2024.json", schedule_body(), Duration::ZERO)
            .route(
                "/2024/1/results.json",
                results_body(1, "Bahrain Grand Prix", 25.0, 18.0),
                Duration::from_millis(40),
            )
            .route(
                "/2024/2/results.json",
                results_body(2, "Saudi Arabian Grand Prix", 18.0, 25.0),
                Duration::from_millis(20),
            )
            .route(
                "/2024/3/results.json",
                results_body(3, "Australian Grand Prix", 12.0, 12.0),
                Duration::ZERO,
            );

        let series = test_builder(client)
            .build(&code("VER"), &code("NOR"), Season::new(2024))
            .await;

        let rounds: Vec<u32> = series.rounds.iter().map(|r| r.round).collect();
        assert_eq!(rounds, vec![1, 2, 3], "future round 4 excluded, order ascending");

        assert_eq!(series.rounds[2].cumulative.driver1, 55.0);
        assert_eq!(series.rounds[2].cumulative.driver2, 55.0);
        assert_eq!(series.rounds[2].winner, RoundWinner::Tied);
        assert_eq!(series.head_to_head, HeadToHead { driver1: 1, driver2: 1 });
    }

    #[tokio::test]
    async fn failed_or_partial_rounds_are_silently_dropped() {
        // Round 2 is unrouted (fetch fails); round 3 lacks NOR.
        let only_ver = serde_json::json!({
            "MRData": {"RaceTable": {"Races": [{
                "season": "2024", "round": "3", "raceName": "Australian Grand Prix",
                "Results": [
                    {"positionText": "1", "points": "25", "status": "Finished",
                     "Driver": {"code": "VER"}, "Constructor": {"name": "Red Bull"}}
                ]
            }]}}
        })
        .to_string();

        let client = RoutedHttpClient::new()
            .route("2024.json", schedule_body(), Duration::ZERO)
            .route(
                "/2024/1/results.json",
                results_body(1, "Bahrain Grand Prix", 25.0, 18.0),
                Duration::ZERO,
            )
            .route("/2024/3/results.json", only_ver, Duration::ZERO);

        let series = test_builder(client)
            .build(&code("VER"), &code("NOR"), Season::new(2024))
            .await;

        assert_eq!(series.rounds.len(), 1);
        assert_eq!(series.rounds[0].round, 1);
        assert_eq!(series.head_to_head, HeadToHead { driver1: 1, driver2: 0 });
    }

    #[tokio::test]
    async fn unusable_schedule_yields_an_empty_series() {
        let client = RoutedHttpClient::new();

        let series = test_builder(client)
            .build(&code("VER"), &code("NOR"), Season::new(2024))
            .await;

        assert!(series.rounds.is_empty());
        assert_eq!(series.head_to_head, HeadToHead::default());
    }
}
