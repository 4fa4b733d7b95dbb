//! Radar score normalization.
//!
//! Maps aggregate season metrics onto five fixed-range scores so drivers
//! with different race counts stay comparable. Pure computation, no I/O.

use crate::domain::{RadarScore, SeasonMetrics};
use crate::points::PointsTable;

/// Grid size minus one, so P1 maps to 100 and last place to 0.
const FINISH_SPREAD: f64 = 19.0;

/// A ±5-position qualifying swing covers the whole racecraft range.
const DELTA_SPREAD: f64 = 5.0;

/// Win count where the winning-impact score saturates.
const WINS_CEILING: f64 = 10.0;

/// Normalize season metrics onto [0, 100] radar axes.
///
/// The points-efficiency ceiling is the table's best single-race haul
/// ([`PointsTable::max_single_race`]), so a non-standard table rescales the
/// axis rather than silently miscalibrating it.
pub fn normalize(metrics: &SeasonMetrics, total_races: u32, points: &PointsTable) -> RadarScore {
    let points_efficiency = clamp(metrics.points_per_race / points.max_single_race() * 100.0);

    let consistency = match metrics.avg_finish {
        Some(avg_finish) => clamp((1.0 - (avg_finish - 1.0) / FINISH_SPREAD) * 100.0),
        None => 0.0,
    };

    let racecraft = clamp(
        (metrics.quali_vs_race.average_delta + DELTA_SPREAD) / (2.0 * DELTA_SPREAD) * 100.0,
    );

    let reliability = if total_races > 0 {
        clamp((1.0 - f64::from(metrics.dnf_count) / f64::from(total_races)) * 100.0)
    } else {
        0.0
    };

    let winning_impact = clamp((f64::from(metrics.wins) / WINS_CEILING).min(1.0) * 100.0);

    RadarScore {
        points_efficiency,
        consistency,
        racecraft,
        reliability,
        winning_impact,
    }
}

/// Round to one decimal, then clamp into [0, 100].
fn clamp(value: f64) -> f64 {
    let rounded = (value * 10.0).round() / 10.0;
    rounded.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QualiVsRace;

    fn metrics(
        points_per_race: f64,
        avg_finish: Option<f64>,
        average_delta: f64,
        wins: u32,
        dnf_count: u32,
    ) -> SeasonMetrics {
        SeasonMetrics {
            total_points: 0.0,
            points_per_race,
            points_by_race: Vec::new(),
            avg_finish,
            wins,
            podiums: 0,
            dnf_count,
            dnf_races: Vec::new(),
            quali_vs_race: QualiVsRace {
                average_delta,
                by_race: Vec::new(),
            },
        }
    }

    fn normalized(metrics_value: &SeasonMetrics, total_races: u32) -> RadarScore {
        normalize(metrics_value, total_races, &PointsTable::default())
    }

    fn assert_bounded(score: RadarScore) {
        for value in [
            score.points_efficiency,
            score.consistency,
            score.racecraft,
            score.reliability,
            score.winning_impact,
        ] {
            assert!((0.0..=100.0).contains(&value), "out of range: {value}");
        }
    }

    #[test]
    fn dominant_season_scores_high_everywhere() {
        let score = normalized(&metrics(22.9, Some(1.2), 1.5, 12, 0), 22);

        assert_eq!(score.points_efficiency, 88.1);
        assert_eq!(score.consistency, 98.9);
        assert_eq!(score.racecraft, 65.0);
        assert_eq!(score.reliability, 100.0);
        assert_eq!(score.winning_impact, 100.0, "capped at ten wins");
        assert_bounded(score);
    }

    #[test]
    fn backmarker_season_scores_low_but_stays_in_range() {
        let score = normalized(&metrics(0.0, Some(20.0), -6.0, 0, 5), 10);

        assert_eq!(score.points_efficiency, 0.0);
        assert_eq!(score.consistency, 0.0);
        assert_eq!(score.racecraft, 0.0, "deltas below -5 clamp to zero");
        assert_eq!(score.reliability, 50.0);
        assert_eq!(score.winning_impact, 0.0);
        assert_bounded(score);
    }

    #[test]
    fn missing_average_finish_zeroes_consistency() {
        let score = normalized(&metrics(0.5, None, 0.0, 0, 3), 3);

        assert_eq!(score.consistency, 0.0);
        assert_eq!(score.racecraft, 50.0, "zero delta sits mid-range");
        assert_eq!(score.reliability, 0.0, "every race a DNF");
        assert_bounded(score);
    }

    #[test]
    fn zero_total_races_zeroes_reliability() {
        let score = normalized(&metrics(0.0, None, 0.0, 0, 0), 0);

        assert_eq!(score.reliability, 0.0);
        assert_bounded(score);
    }

    #[test]
    fn points_ceiling_tracks_the_table() {
        // A full 26-point average saturates the axis under the standard table.
        let score = normalized(&metrics(26.0, Some(1.0), 0.0, 10, 0), 10);
        assert_eq!(score.points_efficiency, 100.0);

        let half = normalized(&metrics(13.0, Some(1.0), 0.0, 10, 0), 10);
        assert_eq!(half.points_efficiency, 50.0);
    }

    #[test]
    fn extreme_inputs_never_escape_bounds() {
        for delta in [-50.0, -5.0, 0.0, 5.0, 50.0] {
            for avg_finish in [Some(0.5), Some(1.0), Some(20.0), Some(99.0), None] {
                let score = normalized(&metrics(120.0, avg_finish, delta, 40, 100), 3);
                assert_bounded(score);
            }
        }
    }
}
