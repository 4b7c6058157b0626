use crate::build_info;
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};

/// Accepted layout of `--start-time` and `--end-time`, read as UTC.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Parser, Debug)]
#[command(
    name = "les_stats",
    about = "Esport statistics service for Riot titles",
    version = build_info::VERSION_WITH_COMMIT,
    long_version = build_info::VERSION_WITH_COMMIT
)]
pub struct Cli {
    #[arg(long = "log-level", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run migrations, then serve the HTTP API until SIGINT or SIGTERM
    Serve,
    /// Run pending database migrations and exit
    Migrate,
    /// Save the recent TFT matches of one player
    ImportMatches(ImportArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ImportArgs {
    /// Player whose match history is imported
    pub puuid: String,

    /// API key used to import matches. Needs write scope.
    #[arg(long = "api-key")]
    pub api_key: String,

    /// Games must start after this time (YYYY-MM-DD HH:MM:SS, UTC)
    #[arg(long = "start-time", value_parser = parse_time)]
    pub start_time: i64,

    /// Games must start before this time (YYYY-MM-DD HH:MM:SS, UTC)
    #[arg(long = "end-time", value_parser = parse_time)]
    pub end_time: Option<i64>,

    /// Number of games to fetch for the player
    #[arg(long = "count-game", default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub count_game: u32,

    /// Minimum number of allow-listed players that must be in a game [default: MIN_PLAYERS]
    #[arg(long = "min-player", value_parser = clap::value_parser!(u8).range(1..=8))]
    pub min_player: Option<u8>,

    /// URL of a `{"players": [{"puuid": ...}]}` document listing the allowed players
    #[arg(long = "puuids-http-json", value_parser = parse_url)]
    pub puuids_http_json: Option<String>,

    #[arg(long)]
    pub event: Option<String>,
    #[arg(long)]
    pub tournament: Option<String>,
    #[arg(long)]
    pub stage: Option<String>,
}

impl ImportArgs {
    /// `--min-player` when given, otherwise the configured threshold.
    pub fn min_players(&self, configured: u8) -> u8 {
        self.min_player.unwrap_or(configured)
    }
}

/// Epoch seconds of a `YYYY-MM-DD HH:MM:SS` UTC timestamp.
pub fn parse_time(raw: &str) -> Result<i64, String> {
    NaiveDateTime::parse_from_str(raw.trim(), TIME_FORMAT)
        .map(|time| time.and_utc().timestamp())
        .map_err(|err| format!("expected {TIME_FORMAT}: {err}"))
}

fn parse_url(raw: &str) -> Result<String, String> {
    reqwest::Url::parse(raw)
        .map(|_| raw.to_string())
        .map_err(|_| "Incorrect url given".to_string())
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
