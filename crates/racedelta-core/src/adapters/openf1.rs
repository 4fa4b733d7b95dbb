//! OpenF1 response parsing.
//!
//! OpenF1 returns flat JSON arrays keyed by session/meeting, with driver
//! metadata (headshots, numbers, team colours) that Ergast never carries.
//! Result rows may or may not include a classified position; absence means
//! the entry did not finish.

use serde_json::Value;

use super::{json_f64, json_str, json_u32};
use crate::domain::{DriverCode, LapSummary, QualifyingResult, RaceClassification, Season};
use crate::identity::IdentityFragment;
use crate::points::PointsTable;
use crate::source::ProviderId;

/// Session metadata row from the `sessions` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_key: u64,
    pub session_name: String,
    pub meeting_name: Option<String>,
    pub date_start: String,
    pub ended: bool,
}

fn rows(value: &Value) -> &[Value] {
    value.as_array().map(Vec::as_slice).unwrap_or_default()
}

fn driver_code(row: &Value) -> Option<DriverCode> {
    let raw = row
        .get("driver_code")
        .and_then(json_str)
        .or_else(|| row.get("name_acronym").and_then(json_str))?;
    DriverCode::parse(raw).ok()
}

/// Parse the driver index into identity fragments.
///
/// Rows without an acronym are discarded; the team colour arrives as a bare
/// hex string and is normalized to a `#RRGGBB` form.
pub fn parse_driver_index(value: &Value) -> Vec<IdentityFragment> {
    rows(value)
        .iter()
        .filter_map(|row| {
            let code = driver_code(row)?;

            let full_name = row
                .get("full_name")
                .and_then(json_str)
                .map(str::to_owned)
                .or_else(|| {
                    let first = row.get("first_name").and_then(json_str)?;
                    let last = row.get("last_name").and_then(json_str)?;
                    Some(format!("{first} {last}"))
                });

            let team_color = row
                .get("team_colour")
                .and_then(json_str)
                .map(|colour| {
                    if colour.starts_with('#') {
                        colour.to_owned()
                    } else {
                        format!("#{colour}")
                    }
                });

            Some(IdentityFragment {
                provider: Some(ProviderId::Openf1),
                code: Some(code),
                full_name,
                team: row.get("team_name").and_then(json_str).map(str::to_owned),
                country_code: row
                    .get("country_code")
                    .and_then(json_str)
                    .map(str::to_owned),
                image_url: row
                    .get("headshot_url")
                    .and_then(json_str)
                    .map(str::to_owned),
                team_color,
                number: row.get("driver_number").and_then(json_u32),
            })
        })
        .collect()
}

/// Parse season result rows into classifications, ordered by meeting.
///
/// Points are not part of the payload; they are derived from the classified
/// position through the points table.
pub fn parse_season_results(
    value: &Value,
    season: Season,
    points: &PointsTable,
) -> Vec<RaceClassification> {
    let mut classifications: Vec<RaceClassification> = rows(value)
        .iter()
        .filter_map(|row| {
            let code = driver_code(row)?;
            let round = row.get("meeting_key").and_then(json_u32)?;
            let race_name = row
                .get("meeting_name")
                .and_then(json_str)
                .unwrap_or_default();
            let finish_position = row.get("classified_position").and_then(json_u32);
            let status = row
                .get("status")
                .and_then(json_str)
                .map(str::to_owned)
                .unwrap_or_else(|| {
                    if finish_position.is_some() {
                        String::from("Finished")
                    } else {
                        String::new()
                    }
                });

            RaceClassification::new(
                season,
                round,
                race_name,
                code,
                row.get("team_name").and_then(json_str).unwrap_or_default(),
                row.get("grid_position").and_then(json_u32),
                finish_position,
                status,
                f64::from(points.points_for(finish_position)),
            )
            .ok()
        })
        .collect();

    classifications.sort_by_key(|c| c.round);
    classifications
}

/// Parse season qualifying rows into grid results.
pub fn parse_season_qualifying(value: &Value, season: Season) -> Vec<QualifyingResult> {
    rows(value)
        .iter()
        .filter_map(|row| {
            let code = driver_code(row)?;
            let round = row.get("meeting_key").and_then(json_u32)?;
            let position = row.get("position").and_then(json_u32)?;
            Some(QualifyingResult {
                season,
                round,
                driver_code: code,
                position,
            })
        })
        .collect()
}

/// Parse the sessions listing.
pub fn parse_sessions(value: &Value) -> Vec<SessionInfo> {
    rows(value)
        .iter()
        .filter_map(|row| {
            Some(SessionInfo {
                session_key: row.get("session_key")?.as_u64()?,
                session_name: json_str(row.get("session_name")?)?.to_owned(),
                meeting_name: row
                    .get("meeting_name")
                    .and_then(json_str)
                    .map(str::to_owned),
                date_start: row
                    .get("date_start")
                    .and_then(json_str)
                    .unwrap_or_default()
                    .to_owned(),
                ended: row.get("date_end").and_then(json_str).is_some(),
            })
        })
        .collect()
}

/// Most recent completed race session, by start date.
pub fn latest_race_session(sessions: &[SessionInfo]) -> Option<&SessionInfo> {
    sessions
        .iter()
        .filter(|session| session.session_name.eq_ignore_ascii_case("race") && session.ended)
        .max_by(|a, b| a.date_start.cmp(&b.date_start))
}

/// Car number for a driver in a session's driver listing.
pub fn find_driver_number(value: &Value, code: &DriverCode) -> Option<u32> {
    rows(value).iter().find_map(|row| {
        let row_code = driver_code(row)?;
        (row_code == *code)
            .then(|| row.get("driver_number").and_then(json_u32))
            .flatten()
    })
}

/// Summarize a driver's lap rows; `None` when no timed laps exist.
pub fn parse_lap_summary(value: &Value) -> Option<LapSummary> {
    let durations: Vec<f64> = rows(value)
        .iter()
        .filter_map(|row| row.get("lap_duration").and_then(json_f64))
        .filter(|duration| *duration > 0.0)
        .collect();

    if durations.is_empty() {
        return None;
    }

    let laps = durations.len() as u32;
    let total: f64 = durations.iter().sum();
    let best = durations.iter().copied().fold(f64::INFINITY, f64::min);

    Some(LapSummary {
        avg_lap_time: round3(total / f64::from(laps)),
        best_lap_time: round3(best),
        laps,
    })
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn driver_index_fragments_include_metadata() {
        let payload = json!([
            {
                "name_acronym": "VER",
                "full_name": "Max VERSTAPPEN",
                "team_name": "Red Bull Racing",
                "driver_number": 1,
                "country_code": "NED",
                "headshot_url": "https://img.test/ver.png",
                "team_colour": "3671C6"
            },
            {"full_name": "No Acronym"}
        ]);

        let fragments = parse_driver_index(&payload);
        assert_eq!(fragments.len(), 1);

        let ver = &fragments[0];
        assert_eq!(ver.code.as_ref().map(DriverCode::as_str), Some("VER"));
        assert_eq!(ver.team_color.as_deref(), Some("#3671C6"));
        assert_eq!(ver.number, Some(1));
    }

    #[test]
    fn season_results_derive_points_from_position() {
        let payload = json!([
            {"name_acronym": "VER", "meeting_key": 1230, "meeting_name": "Monaco Grand Prix",
             "team_name": "Red Bull Racing", "classified_position": 1},
            {"name_acronym": "ALB", "meeting_key": 1229, "meeting_name": "Miami Grand Prix",
             "team_name": "Williams", "classified_position": null},
            {"meeting_key": 1229, "classified_position": 3}
        ]);

        let rows = parse_season_results(&payload, Season::new(2024), &PointsTable::default());
        assert_eq!(rows.len(), 2, "the code-less row is discarded");

        // Sorted ascending by meeting key.
        assert_eq!(rows[0].driver_code.as_str(), "ALB");
        assert_eq!(rows[0].points, 0.0);
        assert!(rows[0].is_dnf());

        assert_eq!(rows[1].driver_code.as_str(), "VER");
        assert_eq!(rows[1].points, 25.0);
    }

    #[test]
    fn latest_race_session_requires_an_end_date() {
        let sessions = parse_sessions(&json!([
            {"session_key": 1, "session_name": "Race", "date_start": "2024-05-05T20:00:00Z",
             "date_end": "2024-05-05T22:00:00Z", "meeting_name": "Miami Grand Prix"},
            {"session_key": 2, "session_name": "Race", "date_start": "2024-05-26T13:00:00Z"},
            {"session_key": 3, "session_name": "Qualifying", "date_start": "2024-05-25T14:00:00Z",
             "date_end": "2024-05-25T15:00:00Z"}
        ]));

        let latest = latest_race_session(&sessions).expect("one completed race");
        assert_eq!(latest.session_key, 1);
        assert_eq!(latest.meeting_name.as_deref(), Some("Miami Grand Prix"));
    }

    #[test]
    fn lap_summary_ignores_untimed_laps() {
        let payload = json!([
            {"lap_number": 1, "lap_duration": null},
            {"lap_number": 2, "lap_duration": 92.513},
            {"lap_number": 3, "lap_duration": 91.007},
            {"lap_number": 4, "lap_duration": 0.0}
        ]);

        let summary = parse_lap_summary(&payload).expect("timed laps exist");
        assert_eq!(summary.laps, 2);
        assert_eq!(summary.best_lap_time, 91.007);
        assert_eq!(summary.avg_lap_time, 91.76);

        assert!(parse_lap_summary(&json!([])).is_none());
    }

    #[test]
    fn finds_driver_numbers_by_acronym() {
        let payload = json!([
            {"name_acronym": "VER", "driver_number": 1},
            {"name_acronym": "NOR", "driver_number": 4}
        ]);

        let nor = DriverCode::parse("NOR").expect("valid");
        assert_eq!(find_driver_number(&payload, &nor), Some(4));

        let ham = DriverCode::parse("HAM").expect("valid");
        assert_eq!(find_driver_number(&payload, &ham), None);
    }
}
