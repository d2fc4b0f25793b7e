use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Mudcast dirt road condition forecaster.
#[derive(Parser)]
#[command(
    name = "mudcast",
    version,
    about = "Dirt road condition forecasting from Open-Meteo weather data"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to TOML configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Print the daily forecast with per-day road condition.
    Forecast(ForecastArgs),
    /// Answer whether the dirt road is passable right now.
    Status(StatusArgs),
    /// Run the dashboard web server.
    Serve(ServeArgs),
}

/// Arguments for the `forecast` subcommand.
#[derive(clap::Args)]
pub struct ForecastArgs {
    /// Location: a preset name, a place name, or "lat,lon".
    #[arg(short, long)]
    pub location: String,

    /// Days of past data to include (defaults to the configured value).
    #[arg(long)]
    pub past_days: Option<u32>,
}

/// Arguments for the `status` subcommand.
#[derive(clap::Args)]
pub struct StatusArgs {
    /// Location: a preset name, a place name, or "lat,lon".
    #[arg(short, long)]
    pub location: String,

    /// Skip the road surface lookup and assume an unpaved road.
    #[arg(long)]
    pub assume_unpaved: bool,
}

/// Arguments for the `serve` subcommand.
#[derive(clap::Args)]
pub struct ServeArgs {
    /// Port to listen on.
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,
}
