use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Race data analytics over Ergast and OpenF1.
#[derive(Debug, Parser)]
#[command(name = "racedelta", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Season to query: "current" or a 4-digit year.
    #[arg(long, global = true, default_value = "current")]
    pub season: String,

    /// Directory for the durable cache database.
    #[arg(long, global = true, default_value = ".racedelta-cache")]
    pub cache_dir: PathBuf,

    /// Pretty-print the JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Current driver roster with merged metadata.
    Roster,
    /// Canonical teams with colors and drivers.
    Teams,
    /// Championship standings.
    Standings {
        /// Which championship to rank.
        #[arg(value_enum, default_value = "drivers")]
        kind: StandingsKind,
    },
    /// Season metrics bundle for one driver.
    Metrics {
        /// Three-letter driver code, e.g. VER.
        driver: String,
    },
    /// Head-to-head season timeline for two drivers.
    Timeline {
        driver1: String,
        driver2: String,
    },
    /// Lap-pace comparison in the latest completed race.
    Compare {
        driver1: String,
        driver2: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StandingsKind {
    Drivers,
    Constructors,
}
