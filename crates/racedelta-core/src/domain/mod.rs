//! Canonical domain types shared by every pipeline stage.

mod code;
mod models;
mod timestamp;

pub use code::{DriverCode, Season};
pub use models::{
    status_indicates_finish, DriverIdentity, EventComparison, HeadToHead, LapSummary,
    MetricsBundle, PairScore, QualiVsRace, QualifyingResult, RaceClassification, RaceEvent,
    RadarScore, RoundWinner, SeasonMetrics, StandingsEntry, TeamEntry, TeammateComparison,
    TimelineRound, TimelineSeries,
};
pub use timestamp::{parse_schedule_date, UtcDateTime};
