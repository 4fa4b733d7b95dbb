//! Championship standings derived from raw classification records.

use std::collections::HashMap;

use crate::domain::{DriverCode, DriverIdentity, RaceClassification, StandingsEntry};
use crate::points::PointsTable;

#[derive(Default)]
struct Tally {
    points: f64,
    wins: u32,
    podiums: u32,
}

impl Tally {
    fn record(&mut self, finish_position: Option<u32>, points: &PointsTable) {
        self.points += f64::from(points.points_for(finish_position));
        if let Some(position) = finish_position {
            if position == 1 {
                self.wins += 1;
            }
            if position <= 3 {
                self.podiums += 1;
            }
        }
    }
}

/// Build the driver championship table.
///
/// Entries are scored from the points table by finishing position, sorted
/// descending by points with wins as the tie-break, and given dense 1-based
/// positions. The sort is stable, so entities tied on both keys keep their
/// encounter order. Driver names come from the identity index when it has
/// them.
pub fn build_driver_standings(
    classifications: &[RaceClassification],
    identities: &HashMap<DriverCode, DriverIdentity>,
    points: &PointsTable,
) -> Vec<StandingsEntry> {
    let mut order: Vec<DriverCode> = Vec::new();
    let mut tallies: HashMap<DriverCode, Tally> = HashMap::new();
    let mut teams: HashMap<DriverCode, String> = HashMap::new();

    for row in classifications {
        let tally = tallies.entry(row.driver_code.clone()).or_insert_with(|| {
            order.push(row.driver_code.clone());
            Tally::default()
        });
        tally.record(row.finish_position, points);
        teams.insert(row.driver_code.clone(), row.team_name.clone());
    }

    let mut entries: Vec<StandingsEntry> = order
        .into_iter()
        .map(|code| {
            let tally = &tallies[&code];
            let identity = identities.get(&code);
            StandingsEntry {
                position: 0,
                name: identity
                    .map(|i| i.display_name().to_owned())
                    .unwrap_or_else(|| code.as_str().to_owned()),
                team: identity
                    .and_then(|i| i.team.clone())
                    .or_else(|| teams.get(&code).cloned()),
                code: Some(code),
                points: tally.points,
                wins: tally.wins,
                podiums: Some(tally.podiums),
            }
        })
        .collect();

    rank(&mut entries);
    entries
}

/// Build the constructor championship table, grouped by canonical team name.
pub fn build_constructor_standings(
    classifications: &[RaceClassification],
    points: &PointsTable,
) -> Vec<StandingsEntry> {
    let mut order: Vec<String> = Vec::new();
    let mut tallies: HashMap<String, Tally> = HashMap::new();

    for row in classifications {
        let tally = tallies.entry(row.team_name.clone()).or_insert_with(|| {
            order.push(row.team_name.clone());
            Tally::default()
        });
        tally.record(row.finish_position, points);
    }

    let mut entries: Vec<StandingsEntry> = order
        .into_iter()
        .map(|team| {
            let tally = &tallies[&team];
            StandingsEntry {
                position: 0,
                name: team,
                code: None,
                team: None,
                points: tally.points,
                wins: tally.wins,
                podiums: None,
            }
        })
        .collect();

    rank(&mut entries);
    entries
}

/// Whether a computed table is usable: at least one entity scored.
pub fn has_scoring_entries(entries: &[StandingsEntry]) -> bool {
    entries.iter().any(|entry| entry.points > 0.0)
}

fn rank(entries: &mut [StandingsEntry]) {
    entries.sort_by(|a, b| {
        b.points
            .total_cmp(&a.points)
            .then_with(|| b.wins.cmp(&a.wins))
    });

    for (index, entry) in entries.iter_mut().enumerate() {
        entry.position = index as u32 + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Season;

    fn code(raw: &str) -> DriverCode {
        DriverCode::parse(raw).expect("valid code")
    }

    fn row(round: u32, driver: &str, team: &str, finish: Option<u32>) -> RaceClassification {
        RaceClassification::new(
            Season::new(2024),
            round,
            format!("Round {round} Grand Prix"),
            code(driver),
            team,
            None,
            finish,
            if finish.is_some() { "Finished" } else { "Retired" },
            0.0,
        )
        .expect("valid classification")
    }

    #[test]
    fn single_race_pays_the_standard_table() {
        let drivers = [
            "AAA", "BBB", "CCC", "DDD", "EEE", "FFF", "GGG", "HHH", "III", "JJJ", "KKK", "LLL",
        ];
        let classifications: Vec<RaceClassification> = drivers
            .iter()
            .enumerate()
            .map(|(index, driver)| row(1, driver, "Team", Some(index as u32 + 1)))
            .collect();

        let standings =
            build_driver_standings(&classifications, &HashMap::new(), &PointsTable::default());

        let expected = [25.0, 18.0, 15.0, 12.0, 10.0, 8.0, 6.0, 4.0, 2.0, 1.0, 0.0, 0.0];
        for (entry, expected_points) in standings.iter().zip(expected) {
            assert_eq!(entry.points, expected_points);
        }
    }

    #[test]
    fn positions_are_a_dense_permutation() {
        let classifications = vec![
            row(1, "VER", "Red Bull Racing", Some(1)),
            row(1, "NOR", "McLaren", Some(2)),
            row(1, "LEC", "Ferrari", Some(3)),
            row(2, "NOR", "McLaren", Some(1)),
            row(2, "VER", "Red Bull Racing", Some(2)),
            row(2, "LEC", "Ferrari", None),
        ];

        let standings =
            build_driver_standings(&classifications, &HashMap::new(), &PointsTable::default());

        let mut positions: Vec<u32> = standings.iter().map(|entry| entry.position).collect();
        positions.sort_unstable();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn wins_break_point_ties_and_leftover_ties_keep_encounter_order() {
        // P2+P3 == P3+P2 on points; ALB wins one race so he outranks both.
        let classifications = vec![
            row(1, "OCO", "Alpine", Some(2)),
            row(1, "GAS", "Alpine", Some(3)),
            row(1, "ALB", "Williams", Some(10)),
            row(2, "OCO", "Alpine", Some(3)),
            row(2, "GAS", "Alpine", Some(2)),
            row(2, "ALB", "Williams", Some(1)),
        ];

        let standings =
            build_driver_standings(&classifications, &HashMap::new(), &PointsTable::default());

        assert_eq!(standings[0].points, 33.0);
        assert_eq!(standings[1].points, 33.0);
        // OCO was encountered before GAS and neither has a win.
        assert_eq!(standings[0].code, Some(code("OCO")));
        assert_eq!(standings[1].code, Some(code("GAS")));
        assert_eq!(standings[2].code, Some(code("ALB")));
        assert_eq!(standings[2].wins, 1);
        assert!(standings[2].points < standings[1].points);
    }

    #[test]
    fn constructor_table_groups_by_team() {
        let classifications = vec![
            row(1, "VER", "Red Bull Racing", Some(1)),
            row(1, "PER", "Red Bull Racing", Some(4)),
            row(1, "NOR", "McLaren", Some(2)),
            row(1, "PIA", "McLaren", Some(3)),
        ];

        let standings =
            build_constructor_standings(&classifications, &PointsTable::default());

        assert_eq!(standings.len(), 2);
        assert_eq!(standings[0].name, "Red Bull Racing");
        assert_eq!(standings[0].points, 37.0);
        assert_eq!(standings[0].wins, 1);
        assert_eq!(standings[1].name, "McLaren");
        assert_eq!(standings[1].points, 33.0);
        assert_eq!(standings[1].podiums, None);
    }

    #[test]
    fn empty_input_produces_an_empty_table() {
        let standings =
            build_driver_standings(&[], &HashMap::new(), &PointsTable::default());
        assert!(standings.is_empty());
        assert!(!has_scoring_entries(&standings));
    }
}
