use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{DriverCode, Season, ValidationError};

/// One row of a season schedule: a single race weekend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceEvent {
    pub round: u32,
    pub race_name: String,
    pub date: Date,
}

/// One driver's official result in one race of one season.
///
/// `finish_position` of `None` means the entry was not classified with a
/// finishing position (DNF/DSQ/withdrawn); `status` carries the provider's
/// free-text reason when it has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceClassification {
    pub season: Season,
    pub round: u32,
    pub race_name: String,
    pub driver_code: DriverCode,
    pub team_name: String,
    pub grid_position: Option<u32>,
    pub finish_position: Option<u32>,
    pub status: String,
    pub points: f64,
}

impl RaceClassification {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        season: Season,
        round: u32,
        race_name: impl Into<String>,
        driver_code: DriverCode,
        team_name: impl Into<String>,
        grid_position: Option<u32>,
        finish_position: Option<u32>,
        status: impl Into<String>,
        points: f64,
    ) -> Result<Self, ValidationError> {
        if round == 0 {
            return Err(ValidationError::ZeroRound);
        }
        validate_non_negative("points", points)?;

        Ok(Self {
            season,
            round,
            race_name: race_name.into(),
            driver_code,
            team_name: team_name.into(),
            grid_position,
            finish_position,
            status: status.into(),
            points,
        })
    }

    /// Whether this entry is a DNF: no finishing position and a status that
    /// does not indicate a classified finish.
    pub fn is_dnf(&self) -> bool {
        if self.finish_position.is_some() {
            return false;
        }
        !status_indicates_finish(&self.status)
    }
}

/// `true` for "Finished" and the lapped "+N Lap"/"+N Laps" forms.
pub fn status_indicates_finish(status: &str) -> bool {
    let status = status.trim();
    if status.eq_ignore_ascii_case("finished") {
        return true;
    }

    let Some(rest) = status.strip_prefix('+') else {
        return false;
    };
    let rest = rest.trim_start();
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return false;
    }
    let tail = rest[digits.len()..].trim();
    tail.eq_ignore_ascii_case("lap") || tail.eq_ignore_ascii_case("laps")
}

/// One driver's grid slot from qualifying in one race of one season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifyingResult {
    pub season: Season,
    pub round: u32,
    pub driver_code: DriverCode,
    pub position: u32,
}

/// Canonical driver record after reconciling provider fragments.
///
/// The code is the join key; every other field is best-effort metadata from
/// whichever provider supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverIdentity {
    pub code: DriverCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
}

impl DriverIdentity {
    pub fn bare(code: DriverCode) -> Self {
        Self {
            code,
            full_name: None,
            team: None,
            country_code: None,
            image_url: None,
            team_color: None,
            number: None,
        }
    }

    /// Display name: the full name when known, the code otherwise.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(self.code.as_str())
    }
}

/// Qualifying-versus-race summary for one driver-season.
///
/// Deltas are qualifying position minus finish position, so positive values
/// mean positions gained on race day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QualiVsRace {
    pub average_delta: f64,
    pub by_race: Vec<i32>,
}

/// Aggregated season statistics for one driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonMetrics {
    pub total_points: f64,
    pub points_per_race: f64,
    pub points_by_race: Vec<f64>,
    pub avg_finish: Option<f64>,
    pub wins: u32,
    pub podiums: u32,
    pub dnf_count: u32,
    pub dnf_races: Vec<String>,
    pub quali_vs_race: QualiVsRace,
}

impl SeasonMetrics {
    /// Metrics for a driver with no recorded races.
    pub fn empty() -> Self {
        Self {
            total_points: 0.0,
            points_per_race: 0.0,
            points_by_race: Vec::new(),
            avg_finish: None,
            wins: 0,
            podiums: 0,
            dnf_count: 0,
            dnf_races: Vec::new(),
            quali_vs_race: QualiVsRace::default(),
        }
    }

    pub fn races_entered(&self) -> usize {
        self.points_by_race.len()
    }
}

/// Five bounded [0, 100] comparison scores derived from [`SeasonMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadarScore {
    pub points_efficiency: f64,
    pub consistency: f64,
    pub racecraft: f64,
    pub reliability: f64,
    pub winning_impact: f64,
}

/// One ranked row of a championship table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsEntry {
    pub position: u32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<DriverCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    pub points: f64,
    pub wins: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub podiums: Option<u32>,
}

/// Per-driver value pair for a timeline round, in request order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairScore {
    pub driver1: f64,
    pub driver2: f64,
}

/// Round outcome of a two-driver comparison.
///
/// Equal points decide the round for neither driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundWinner {
    Driver1,
    Driver2,
    Tied,
}

/// One completed round of a two-driver timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRound {
    pub round: u32,
    pub race_name: String,
    pub points: PairScore,
    pub cumulative: PairScore,
    pub winner: RoundWinner,
}

/// Rounds won per driver, counting decided rounds only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HeadToHead {
    pub driver1: u32,
    pub driver2: u32,
}

/// Full two-driver season timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSeries {
    pub season: Season,
    pub driver1: DriverCode,
    pub driver2: DriverCode,
    pub rounds: Vec<TimelineRound>,
    pub head_to_head: HeadToHead,
}

/// Lap statistics for one driver in one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapSummary {
    pub avg_lap_time: f64,
    pub best_lap_time: f64,
    pub laps: u32,
}

/// Two-driver lap comparison for the latest completed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventComparison {
    pub season: Season,
    pub event: String,
    pub drivers: BTreeMap<DriverCode, LapSummary>,
}

/// Head-to-head record against the driver's teammate across a season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeammateComparison {
    pub teammate_code: DriverCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teammate_name: Option<String>,
    pub wins: u32,
    pub losses: u32,
}

/// Everything a driver-season page needs in one payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsBundle {
    pub driver: DriverIdentity,
    pub season: Season,
    pub metrics: SeasonMetrics,
    pub radar: RadarScore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teammate: Option<TeammateComparison>,
}

/// One canonical team with the drivers seen racing for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub drivers: Vec<DriverCode>,
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
