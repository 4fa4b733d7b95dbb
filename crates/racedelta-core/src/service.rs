//! Public operations over the aggregation pipeline.
//!
//! `RaceDataService` is built once at startup and handed its collaborators
//! explicitly; nothing here reaches for ambient globals. Every operation
//! returns a usable payload tagged with its provenance: computed results are
//! `live`, results served from the durable tier are `cache`, and embedded
//! snapshots are `fallback`. Upstream failure never surfaces as an error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use time::{Date, OffsetDateTime};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use racedelta_store::DurableCache;

use crate::adapters::{ergast, openf1};
use crate::comparison;
use crate::domain::{
    DriverCode, DriverIdentity, EventComparison, MetricsBundle, QualifyingResult,
    RaceClassification, RaceEvent, Season, StandingsEntry, TeamEntry, TimelineSeries,
};
use crate::envelope::Sourced;
use crate::error::ValidationError;
use crate::fallback::FallbackCatalog;
use crate::gateway::ProviderGateway;
use crate::identity::{IdentityFragment, IdentityReconciler};
use crate::metrics;
use crate::points::PointsTable;
use crate::radar;
use crate::source::ProviderId;
use crate::standings;
use crate::timeline::TimelineBuilder;

/// Tunables for the service's caching and fan-out behavior.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Durable TTL for standings tables.
    pub standings_ttl: Duration,
    /// Durable TTL for metric bundles and rosters.
    pub metrics_ttl: Duration,
    /// Durable TTL for composite timelines and comparisons.
    pub timeline_ttl: Duration,
    /// How many of the most recent completed rounds feed a standings
    /// computation.
    pub max_standings_rounds: usize,
    /// Width of the per-round fetch pool.
    pub round_concurrency: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            standings_ttl: Duration::from_secs(60 * 60),
            metrics_ttl: Duration::from_secs(60 * 60),
            timeline_ttl: Duration::from_secs(6 * 60 * 60),
            max_standings_rounds: 10,
            round_concurrency: 5,
        }
    }
}

/// Process-scoped entry point for every analytics operation.
pub struct RaceDataService {
    gateway: Arc<ProviderGateway>,
    store: Arc<DurableCache>,
    reconciler: Arc<IdentityReconciler>,
    fallback: FallbackCatalog,
    points: PointsTable,
    config: ServiceConfig,
    today: Date,
}

impl RaceDataService {
    pub fn new(
        gateway: Arc<ProviderGateway>,
        store: Arc<DurableCache>,
        reconciler: Arc<IdentityReconciler>,
    ) -> Self {
        Self {
            gateway,
            store,
            reconciler,
            fallback: FallbackCatalog,
            points: PointsTable::default(),
            config: ServiceConfig::default(),
            today: OffsetDateTime::now_utc().date(),
        }
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_points(mut self, points: PointsTable) -> Self {
        self.points = points;
        self
    }

    /// Pin "today" for deterministic completed-round selection.
    pub fn with_today(mut self, today: Date) -> Self {
        self.today = today;
        self
    }

    /// Current-season driver roster with merged metadata.
    pub async fn driver_roster(&self, season: Season) -> Sourced<Vec<DriverIdentity>> {
        let key = format!("roster:{season}");
        if let Some(cached) = self.store_get::<Vec<DriverIdentity>>(&key) {
            return Sourced::cached(cached);
        }

        let fragments = self.openf1_driver_fragments().await;
        let mut roster: Vec<DriverIdentity> = self
            .reconciler
            .merge_index(fragments)
            .into_values()
            .collect();

        if roster.is_empty() {
            warn!(%season, "no live roster, substituting fallback");
            return Sourced::fallback(self.fallback.driver_roster());
        }

        roster.sort_by(|a, b| {
            a.number
                .unwrap_or(u32::MAX)
                .cmp(&b.number.unwrap_or(u32::MAX))
                .then_with(|| a.code.cmp(&b.code))
        });

        self.store_put(&key, &roster, self.config.metrics_ttl);
        Sourced::live(roster)
    }

    /// Canonical teams with colors and current drivers.
    pub async fn team_roster(&self, season: Season) -> Sourced<Vec<TeamEntry>> {
        self.driver_roster(season).await.map(|roster| group_teams(&roster))
    }

    /// Season metrics bundle for one driver: aggregate, radar scores, and
    /// teammate head-to-head.
    pub async fn season_metrics(
        &self,
        driver: &str,
        season: Season,
    ) -> Result<Sourced<MetricsBundle>, ValidationError> {
        let code = DriverCode::parse(driver)?;
        let key = format!("metrics:{season}:{code}");

        if let Some(cached) = self.store_get::<MetricsBundle>(&key) {
            return Ok(Sourced::cached(cached));
        }

        let (classifications, qualifying) = self.season_inputs(season).await;

        if classifications.is_empty() && qualifying.is_empty() {
            if let Some(stale) = self.store_get_stale::<MetricsBundle>(&key) {
                return Ok(Sourced::cached(stale));
            }
        }

        let driver_metrics = metrics::aggregate(&code, &classifications, &qualifying);
        let radar = radar::normalize(
            &driver_metrics,
            driver_metrics.races_entered() as u32,
            &self.points,
        );

        let roster = self.driver_roster(season).await.data;
        let identity = roster
            .iter()
            .find(|candidate| candidate.code == code)
            .cloned()
            .unwrap_or_else(|| DriverIdentity::bare(code.clone()));

        let teammate = metrics::teammate_comparison(&classifications, &code).map(|mut teammate| {
            teammate.teammate_name = roster
                .iter()
                .find(|candidate| candidate.code == teammate.teammate_code)
                .and_then(|identity| identity.full_name.clone());
            teammate
        });

        let bundle = MetricsBundle {
            driver: identity,
            season,
            metrics: driver_metrics,
            radar,
            teammate,
        };

        self.store_put(&key, &bundle, self.config.metrics_ttl);
        Ok(Sourced::live(bundle))
    }

    /// Ranked driver championship standings.
    pub async fn driver_standings(&self, season: Season) -> Sourced<Vec<StandingsEntry>> {
        let key = format!("standings:drivers:{season}");
        if let Some(cached) = self.store_get::<Vec<StandingsEntry>>(&key) {
            return Sourced::cached(cached);
        }

        let (classifications, mut fragments) = self
            .fetch_season_classifications(season, Some(self.config.max_standings_rounds))
            .await;
        fragments.extend(self.openf1_driver_fragments().await);
        let identities = self.reconciler.merge_index(fragments);

        let table =
            standings::build_driver_standings(&classifications, &identities, &self.points);

        if !standings::has_scoring_entries(&table) {
            return self.degraded_standings(&key, || self.fallback.driver_standings());
        }

        self.store_put(&key, &table, self.config.standings_ttl);
        Sourced::live(table)
    }

    /// Ranked constructor championship standings.
    pub async fn constructor_standings(&self, season: Season) -> Sourced<Vec<StandingsEntry>> {
        let key = format!("standings:constructors:{season}");
        if let Some(cached) = self.store_get::<Vec<StandingsEntry>>(&key) {
            return Sourced::cached(cached);
        }

        let (classifications, _) = self
            .fetch_season_classifications(season, Some(self.config.max_standings_rounds))
            .await;
        let table = standings::build_constructor_standings(&classifications, &self.points);

        if !standings::has_scoring_entries(&table) {
            return self.degraded_standings(&key, || self.fallback.constructor_standings());
        }

        self.store_put(&key, &table, self.config.standings_ttl);
        Sourced::live(table)
    }

    /// Cumulative head-to-head timeline for two drivers.
    pub async fn timeline(
        &self,
        driver1: &str,
        driver2: &str,
        season: Season,
    ) -> Result<Sourced<TimelineSeries>, ValidationError> {
        let (driver1, driver2) = parse_pair(driver1, driver2)?;
        let key = format!("timeline:{season}:{driver1}:{driver2}");

        if let Some(cached) = self.store_get::<TimelineSeries>(&key) {
            return Ok(Sourced::cached(cached));
        }

        let series = TimelineBuilder::new(Arc::clone(&self.gateway))
            .with_concurrency(self.config.round_concurrency)
            .with_today(self.today)
            .build(&driver1, &driver2, season)
            .await;

        if series.rounds.is_empty() {
            if let Some(stale) = self.store_get_stale::<TimelineSeries>(&key) {
                return Ok(Sourced::cached(stale));
            }
        }

        self.store_put(&key, &series, self.config.timeline_ttl);
        Ok(Sourced::live(series))
    }

    /// Lap-pace comparison in the latest completed event. `None` means no
    /// usable data anywhere.
    pub async fn event_comparison(
        &self,
        driver1: &str,
        driver2: &str,
        season: Season,
    ) -> Result<Option<Sourced<EventComparison>>, ValidationError> {
        let (driver1, driver2) = parse_pair(driver1, driver2)?;
        let key = format!("compare:{season}:{driver1}:{driver2}");

        if let Some(cached) = self.store_get::<EventComparison>(&key) {
            return Ok(Some(Sourced::cached(cached)));
        }

        match comparison::compare_drivers(&self.gateway, &driver1, &driver2, season).await {
            Some(comparison) => {
                self.store_put(&key, &comparison, self.config.timeline_ttl);
                Ok(Some(Sourced::live(comparison)))
            }
            None => Ok(self
                .store_get_stale::<EventComparison>(&key)
                .map(Sourced::cached)),
        }
    }

    fn degraded_standings(
        &self,
        key: &str,
        fallback: impl FnOnce() -> Vec<StandingsEntry>,
    ) -> Sourced<Vec<StandingsEntry>> {
        if let Some(stale) = self.store_get_stale::<Vec<StandingsEntry>>(key) {
            debug!(key, "serving stale standings after empty live computation");
            return Sourced::cached(stale);
        }
        warn!(key, "no live or cached standings, substituting fallback");
        Sourced::fallback(fallback())
    }

    /// Race and qualifying inputs for one driver-season computation.
    ///
    /// Both sides must come from the same provider so round keys join:
    /// OpenF1 keys rounds by meeting, Ergast by schedule round number.
    /// OpenF1 answers first; when its season results are empty the whole
    /// pair falls back to Ergast.
    async fn season_inputs(
        &self,
        season: Season,
    ) -> (Vec<RaceClassification>, Vec<QualifyingResult>) {
        let classifications = self.openf1_season_results(season).await;
        if !classifications.is_empty() {
            let qualifying = self
                .gateway
                .fetch(
                    ProviderId::Openf1,
                    "results",
                    &[
                        ("year", season.year().to_string()),
                        ("session_type", String::from("Qualifying")),
                    ],
                )
                .await
                .into_value()
                .map(|value| openf1::parse_season_qualifying(&value, season))
                .unwrap_or_default();
            return (classifications, qualifying);
        }

        let (classifications, _) = self.fetch_season_classifications(season, None).await;
        let qualifying = self
            .gateway
            .fetch(
                ProviderId::Ergast,
                &ergast::season_qualifying_path(season),
                &[],
            )
            .await
            .into_value()
            .map(|value| ergast::parse_season_qualifying(&value))
            .unwrap_or_default();
        (classifications, qualifying)
    }

    /// Race classifications for completed rounds, fetched in bounded
    /// parallel, with the identity fragments seen along the way. When
    /// `max_rounds` is given only the most recent completed rounds are
    /// fetched.
    async fn fetch_season_classifications(
        &self,
        season: Season,
        max_rounds: Option<usize>,
    ) -> (Vec<RaceClassification>, Vec<IdentityFragment>) {
        let schedule = self
            .gateway
            .fetch(ProviderId::Ergast, &ergast::schedule_path(season), &[])
            .await
            .into_value()
            .map(|value| ergast::parse_schedule(&value))
            .unwrap_or_default();

        let mut completed: Vec<RaceEvent> = schedule
            .into_iter()
            .filter(|event| event.date <= self.today)
            .collect();

        if let Some(max_rounds) = max_rounds {
            if completed.len() > max_rounds {
                completed = completed.split_off(completed.len() - max_rounds);
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.config.round_concurrency.max(1)));
        let mut handles = Vec::with_capacity(completed.len());

        for event in completed {
            let gateway = Arc::clone(&self.gateway);
            let semaphore = Arc::clone(&semaphore);

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                let value = gateway
                    .fetch(
                        ProviderId::Ergast,
                        &ergast::round_results_path(season, event.round),
                        &[],
                    )
                    .await
                    .into_value()?;

                Some((
                    ergast::parse_round_results(&value),
                    ergast::parse_identity_fragments(&value),
                ))
            }));
        }

        let aliases = self.reconciler.aliases();
        let mut classifications = Vec::new();
        let mut fragments = Vec::new();
        for handle in handles {
            if let Ok(Some((rows, row_fragments))) = handle.await {
                classifications.extend(rows.into_iter().map(|mut row| {
                    row.team_name = aliases.canonical_team(&row.team_name);
                    row
                }));
                fragments.extend(row_fragments);
            }
        }

        (classifications, fragments)
    }

    /// Season race results from OpenF1 with canonical team names.
    async fn openf1_season_results(&self, season: Season) -> Vec<RaceClassification> {
        let aliases = self.reconciler.aliases();
        self.gateway
            .fetch(
                ProviderId::Openf1,
                "results",
                &[
                    ("year", season.year().to_string()),
                    ("session_type", String::from("Race")),
                ],
            )
            .await
            .into_value()
            .map(|value| openf1::parse_season_results(&value, season, &self.points))
            .unwrap_or_default()
            .into_iter()
            .map(|mut row| {
                row.team_name = aliases.canonical_team(&row.team_name);
                row
            })
            .collect()
    }

    async fn openf1_driver_fragments(&self) -> Vec<IdentityFragment> {
        self.gateway
            .fetch(
                ProviderId::Openf1,
                "drivers",
                &[("session_key", String::from("latest"))],
            )
            .await
            .into_value()
            .map(|value| openf1::parse_driver_index(&value))
            .unwrap_or_default()
    }

    fn store_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key) {
            Ok(Some(text)) => serde_json::from_str(&text).ok(),
            Ok(None) => None,
            Err(error) => {
                warn!(key, %error, "durable cache read failed");
                None
            }
        }
    }

    fn store_get_stale<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get_stale(key) {
            Ok(Some(text)) => serde_json::from_str(&text).ok(),
            Ok(None) => None,
            Err(error) => {
                warn!(key, %error, "durable cache read failed");
                None
            }
        }
    }

    fn store_put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let Ok(text) = serde_json::to_string(value) else {
            return;
        };
        if let Err(error) = self.store.put(key, &text, Some(ttl)) {
            warn!(key, %error, "durable cache write failed");
        }
    }
}

fn parse_pair(driver1: &str, driver2: &str) -> Result<(DriverCode, DriverCode), ValidationError> {
    let driver1 = DriverCode::parse(driver1)?;
    let driver2 = DriverCode::parse(driver2)?;
    if driver1 == driver2 {
        return Err(ValidationError::IdenticalDrivers);
    }
    Ok((driver1, driver2))
}

/// Group a roster into canonical teams.
fn group_teams(roster: &[DriverIdentity]) -> Vec<TeamEntry> {
    let mut teams: HashMap<String, TeamEntry> = HashMap::new();

    for driver in roster {
        let Some(team_name) = driver.team.clone() else {
            continue;
        };
        let entry = teams.entry(team_name.clone()).or_insert_with(|| TeamEntry {
            name: team_name,
            color: None,
            drivers: Vec::new(),
        });
        if entry.color.is_none() {
            entry.color = driver.team_color.clone();
        }
        entry.drivers.push(driver.code.clone());
    }

    let mut entries: Vec<TeamEntry> = teams.into_values().collect();
    for entry in &mut entries {
        entry.drivers.sort();
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}
