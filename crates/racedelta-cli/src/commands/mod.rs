use std::sync::Arc;

use serde_json::Value;

use racedelta_core::{
    AliasTable, DurableCache, IdentityReconciler, ProviderGateway, RaceDataService,
    ReqwestHttpClient, Season,
};

use crate::cli::{Cli, Command, StandingsKind};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    let season: Season = cli.season.parse()?;
    let service = build_service(cli)?;

    let payload = match &cli.command {
        Command::Roster => serde_json::to_value(service.driver_roster(season).await)?,
        Command::Teams => serde_json::to_value(service.team_roster(season).await)?,
        Command::Standings { kind } => match kind {
            StandingsKind::Drivers => {
                serde_json::to_value(service.driver_standings(season).await)?
            }
            StandingsKind::Constructors => {
                serde_json::to_value(service.constructor_standings(season).await)?
            }
        },
        Command::Metrics { driver } => {
            serde_json::to_value(service.season_metrics(driver, season).await?)?
        }
        Command::Timeline { driver1, driver2 } => {
            serde_json::to_value(service.timeline(driver1, driver2, season).await?)?
        }
        Command::Compare { driver1, driver2 } => {
            serde_json::to_value(service.event_comparison(driver1, driver2, season).await?)?
        }
    };

    Ok(payload)
}

fn build_service(cli: &Cli) -> Result<RaceDataService, CliError> {
    std::fs::create_dir_all(&cli.cache_dir)?;
    let store = DurableCache::open(cli.cache_dir.join("cache.duckdb"))?;

    let gateway = ProviderGateway::new(Arc::new(ReqwestHttpClient::new()));
    let reconciler = IdentityReconciler::new(AliasTable::standard());

    Ok(RaceDataService::new(
        Arc::new(gateway),
        Arc::new(store),
        Arc::new(reconciler),
    ))
}
