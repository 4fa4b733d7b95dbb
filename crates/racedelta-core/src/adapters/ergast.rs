//! Ergast response parsing.
//!
//! Ergast wraps everything in `MRData` and reports numbers as strings. A
//! classified finish is a numeric `positionText`; retirements carry letters
//! ("R", "D", "W") there while `position` still gives the classification
//! order, so only `positionText` decides whether an entry finished.

use serde_json::Value;

use super::{json_f64, json_str, json_u32};
use crate::domain::{
    parse_schedule_date, DriverCode, QualifyingResult, RaceClassification, RaceEvent, Season,
};
use crate::identity::IdentityFragment;
use crate::source::ProviderId;

/// Path below the mirror base for a season schedule.
pub fn schedule_path(season: Season) -> String {
    format!("{}.json", season.year())
}

/// Path below the mirror base for one round's race results.
pub fn round_results_path(season: Season, round: u32) -> String {
    format!("{}/{round}/results.json", season.year())
}

/// Path below the mirror base for a season's qualifying results.
pub fn season_qualifying_path(season: Season) -> String {
    format!("{}/qualifying.json", season.year())
}

fn races(value: &Value) -> &[Value] {
    value
        .pointer("/MRData/RaceTable/Races")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Parse a season schedule into ordered race events.
pub fn parse_schedule(value: &Value) -> Vec<RaceEvent> {
    let mut events: Vec<RaceEvent> = races(value)
        .iter()
        .filter_map(|race| {
            let round = json_u32(race.get("round")?)?;
            let race_name = json_str(race.get("raceName")?)?.to_owned();
            let date = parse_schedule_date(json_str(race.get("date")?)?)?;
            Some(RaceEvent {
                round,
                race_name,
                date,
            })
        })
        .collect();

    events.sort_by_key(|event| event.round);
    events
}

/// Parse one round's race results into classifications.
///
/// Rows without a driver code are discarded; codes are the join key.
pub fn parse_round_results(value: &Value) -> Vec<RaceClassification> {
    let Some(race) = races(value).first() else {
        return Vec::new();
    };

    let season = race
        .get("season")
        .and_then(json_u32)
        .map_or_else(Season::current, |year| Season::new(year as u16));
    let round = race.get("round").and_then(json_u32).unwrap_or(0);
    let race_name = race
        .get("raceName")
        .and_then(json_str)
        .unwrap_or_default()
        .to_owned();

    let results = race
        .get("Results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    results
        .iter()
        .filter_map(|row| {
            let code = DriverCode::parse(json_str(row.pointer("/Driver/code")?)?).ok()?;
            let team = row
                .pointer("/Constructor/name")
                .and_then(json_str)
                .unwrap_or_default();
            let finish_position = row.get("positionText").and_then(json_u32);
            let grid_position = row
                .get("grid")
                .and_then(json_u32)
                .filter(|&grid| grid > 0);
            let status = row.get("status").and_then(json_str).unwrap_or_default();
            let points = row
                .get("points")
                .and_then(json_f64)
                .unwrap_or(0.0)
                .max(0.0);

            RaceClassification::new(
                season,
                round,
                race_name.clone(),
                code,
                team,
                grid_position,
                finish_position,
                status,
                points,
            )
            .ok()
        })
        .collect()
}

/// Parse a season qualifying payload into grid results.
pub fn parse_season_qualifying(value: &Value) -> Vec<QualifyingResult> {
    races(value)
        .iter()
        .flat_map(|race| {
            let season = race
                .get("season")
                .and_then(json_u32)
                .map_or_else(Season::current, |year| Season::new(year as u16));
            let round = race.get("round").and_then(json_u32).unwrap_or(0);
            let rows = race
                .get("QualifyingResults")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();

            rows.iter()
                .filter_map(move |row| {
                    let code =
                        DriverCode::parse(json_str(row.pointer("/Driver/code")?)?).ok()?;
                    let position = json_u32(row.get("position")?)?;
                    (round > 0).then(|| QualifyingResult {
                        season,
                        round,
                        driver_code: code,
                        position,
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Pull identity fragments out of a results payload.
pub fn parse_identity_fragments(value: &Value) -> Vec<IdentityFragment> {
    let Some(race) = races(value).first() else {
        return Vec::new();
    };

    let results = race
        .get("Results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    results
        .iter()
        .filter_map(|row| {
            let driver = row.get("Driver")?;
            let code = DriverCode::parse(json_str(driver.get("code")?)?).ok()?;

            let given = driver.get("givenName").and_then(json_str);
            let family = driver.get("familyName").and_then(json_str);
            let full_name = match (given, family) {
                (Some(given), Some(family)) => Some(format!("{given} {family}")),
                (Some(single), None) | (None, Some(single)) => Some(single.to_owned()),
                (None, None) => None,
            };

            Some(IdentityFragment {
                provider: Some(ProviderId::Ergast),
                code: Some(code),
                full_name,
                team: row
                    .pointer("/Constructor/name")
                    .and_then(json_str)
                    .map(str::to_owned),
                number: driver.get("permanentNumber").and_then(json_u32),
                ..IdentityFragment::default()
            })
        })
        .collect()
}
