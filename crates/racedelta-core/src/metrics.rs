//! Season metrics aggregation for a single driver.

use std::collections::HashMap;

use crate::domain::{
    DriverCode, QualiVsRace, QualifyingResult, RaceClassification, SeasonMetrics,
    TeammateComparison,
};

/// Fold one driver's classifications and qualifying results into season
/// metrics.
///
/// Races are processed in round order regardless of input order. Every
/// entered race contributes one `points_by_race` entry (zero when the driver
/// scored nothing); the average finish covers classified finishes only and
/// the qualifying delta covers rounds where both a grid slot and a finish
/// exist.
pub fn aggregate(
    driver: &DriverCode,
    classifications: &[RaceClassification],
    qualifying: &[QualifyingResult],
) -> SeasonMetrics {
    let mut races: Vec<&RaceClassification> = classifications
        .iter()
        .filter(|c| c.driver_code == *driver)
        .collect();
    races.sort_by_key(|c| c.round);

    if races.is_empty() {
        return SeasonMetrics::empty();
    }

    let mut total_points = 0.0;
    let mut points_by_race = Vec::with_capacity(races.len());
    let mut finishes: Vec<u32> = Vec::new();
    let mut wins = 0;
    let mut podiums = 0;
    let mut dnf_races = Vec::new();

    for race in &races {
        total_points += race.points;
        points_by_race.push(race.points);

        match race.finish_position {
            Some(position) => {
                finishes.push(position);
                if position == 1 {
                    wins += 1;
                }
                if position <= 3 {
                    podiums += 1;
                }
            }
            None => {
                if race.is_dnf() {
                    dnf_races.push(race.race_name.clone());
                }
            }
        }
    }

    let races_entered = races.len();
    let avg_finish = if finishes.is_empty() {
        None
    } else {
        Some(round2(
            f64::from(finishes.iter().sum::<u32>()) / finishes.len() as f64,
        ))
    };

    SeasonMetrics {
        total_points,
        points_per_race: round2(total_points / races_entered as f64),
        points_by_race,
        avg_finish,
        wins,
        podiums,
        dnf_count: dnf_races.len() as u32,
        dnf_races,
        quali_vs_race: quali_vs_race(&races, qualifying, driver),
    }
}

/// Qualifying-minus-finish deltas for rounds where both sides exist.
/// Positive means positions gained on race day.
fn quali_vs_race(
    races: &[&RaceClassification],
    qualifying: &[QualifyingResult],
    driver: &DriverCode,
) -> QualiVsRace {
    // Last row wins when a provider repeats a round, mirroring how the
    // upstream data is keyed.
    let mut grid_by_round: HashMap<u32, u32> = HashMap::new();
    for result in qualifying {
        if result.driver_code == *driver {
            grid_by_round.insert(result.round, result.position);
        }
    }

    let mut by_race = Vec::new();
    for race in races {
        let Some(finish) = race.finish_position else {
            continue;
        };
        let Some(&grid) = grid_by_round.get(&race.round) else {
            continue;
        };
        by_race.push(grid as i32 - finish as i32);
    }

    let average_delta = if by_race.is_empty() {
        0.0
    } else {
        round2(f64::from(by_race.iter().sum::<i32>()) / by_race.len() as f64)
    };

    QualiVsRace {
        average_delta,
        by_race,
    }
}

/// Head-to-head against whoever shared the driver's car each round.
///
/// Only rounds where both cars were classified count; the teammate is the
/// one seen most recently. `None` when the driver raced alone all season or
/// never appears at all.
pub fn teammate_comparison(
    all_classifications: &[RaceClassification],
    driver: &DriverCode,
) -> Option<TeammateComparison> {
    let mut team_by_round: HashMap<u32, &str> = HashMap::new();
    let mut driver_rows: HashMap<u32, &RaceClassification> = HashMap::new();
    for row in all_classifications {
        if row.driver_code == *driver {
            team_by_round.insert(row.round, row.team_name.as_str());
            driver_rows.insert(row.round, row);
        }
    }

    if driver_rows.is_empty() {
        return None;
    }

    let mut teammate_code: Option<DriverCode> = None;
    let mut wins = 0;
    let mut losses = 0;

    let mut rounds: Vec<u32> = driver_rows.keys().copied().collect();
    rounds.sort_unstable();

    for round in rounds {
        let own = driver_rows[&round];
        let team = team_by_round[&round];

        let Some(other) = all_classifications.iter().find(|row| {
            row.round == round && row.team_name == team && row.driver_code != *driver
        }) else {
            continue;
        };

        teammate_code = Some(other.driver_code.clone());

        if let (Some(own_pos), Some(other_pos)) = (own.finish_position, other.finish_position) {
            if own_pos < other_pos {
                wins += 1;
            } else {
                losses += 1;
            }
        }
    }

    teammate_code.map(|code| TeammateComparison {
        teammate_code: code,
        teammate_name: None,
        wins,
        losses,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
