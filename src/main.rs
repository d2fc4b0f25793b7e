use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;

use mudcast::api::AppState;
use mudcast::config::MudcastConfig;
use mudcast::models::Location;
use mudcast::road::{self, RoadStatus};
use mudcast::surface::{self, RoadSurface};
use mudcast::weather::{LocationInput, WeatherApiClient};
use mudcast::{cache, logging, web};

mod cli;

use cli::{Cli, Command, ForecastArgs, ServeArgs, StatusArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match MudcastConfig::load_from_path(cli.config.clone()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    };

    logging::init(cli.verbose, &config.logging);

    if let Err(err) = cache::init(config.cache_dir()) {
        tracing::warn!("Cache disabled: {err:#}");
    }

    let result = match cli.command {
        Command::Forecast(args) => run_forecast(&config, args).await,
        Command::Status(args) => run_status(&config, args).await,
        Command::Serve(args) => run_serve(config, args).await,
    };

    if let Err(err) = result {
        if let Some(app_err) = err.downcast_ref::<mudcast::MudcastError>() {
            eprintln!("Error: {}", app_err.user_message());
        } else {
            eprintln!("Error: {err:#}");
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Resolve CLI location input: preset name first, then coordinates or
/// geocoding.
async fn resolve_location(
    config: &MudcastConfig,
    client: &WeatherApiClient,
    input: &str,
) -> Result<Location> {
    if let Some(preset) = config.find_preset(input) {
        return Ok(Location::new(
            preset.latitude,
            preset.longitude,
            preset.name.clone(),
        ));
    }

    let parsed = LocationInput::parse(input)?;
    client.resolve(&parsed).await
}

async fn run_forecast(config: &MudcastConfig, args: ForecastArgs) -> Result<()> {
    let client = WeatherApiClient::new(config.clone())?;
    let location = resolve_location(config, &client, &args.location).await?;

    let forecast = client.get_forecast(&location, args.past_days).await?;
    let daily = forecast.daily_summaries();

    let params = config.road.estimator_params();
    let statuses = road::classify(&daily, &params)?;

    println!(
        "Road condition forecast for {} ({})\n",
        location.name,
        location.format_coordinates()
    );
    println!(
        "  {:<12} {:>7} {:>9} {:>8}  {}",
        "date", "temp", "humidity", "rain", "road"
    );

    let today = Utc::now().date_naive();
    for (record, status) in daily.iter().zip(&statuses) {
        let marker = if record.date == today { "*" } else { " " };
        println!(
            "  {:<12}{}{:>6.1}C {:>8.0}% {:>6.1}mm  {} {}",
            record.date.to_string(),
            marker,
            record.temperature,
            record.relative_humidity,
            record.rain,
            status.emoji(),
            status
        );
    }

    let from_date = daily
        .first()
        .map(|first| today.max(first.date))
        .unwrap_or(today);
    if let Some(dry_day) = road::next_dry_day(&daily, &params, from_date)? {
        println!("\nNext dry day: {}", dry_day.format("%A %d %B"));
    } else {
        println!("\nNo dry day within the forecast window.");
    }

    Ok(())
}

async fn run_status(config: &MudcastConfig, args: StatusArgs) -> Result<()> {
    let client = WeatherApiClient::new(config.clone())?;
    let location = resolve_location(config, &client, &args.location).await?;

    let surface = if args.assume_unpaved {
        RoadSurface::Unpaved
    } else {
        surface::get_road_surface(client.http(), config, &location).await?
    };

    if !surface.needs_estimate() {
        println!(
            "The road near {} is not a dirt road (surface: {}). No estimate needed.",
            location.name, surface
        );
        return Ok(());
    }

    let forecast = client.get_forecast(&location, None).await?;
    let daily = forecast.daily_summaries();
    let params = config.road.estimator_params();

    match road::current_status(&daily, &params)? {
        RoadStatus::Dry => {
            println!("{} The dirt road is dry. You can pass.", RoadStatus::Dry.emoji());
        }
        RoadStatus::Muddy => {
            println!(
                "{} The dirt road is muddy. Better avoid it.",
                RoadStatus::Muddy.emoji()
            );

            let today = Utc::now().date_naive();
            let from_date = daily
                .first()
                .map(|first| today.max(first.date))
                .unwrap_or(today);
            match road::next_dry_day(&daily, &params, from_date)? {
                Some(dry_day) => println!(
                    "Expected to be passable from {}.",
                    dry_day.format("%A %d %B")
                ),
                None => println!("No dry day expected within the forecast window."),
            }
        }
    }

    Ok(())
}

async fn run_serve(config: MudcastConfig, args: ServeArgs) -> Result<()> {
    let client = WeatherApiClient::new(config.clone())?;
    let state = AppState::new(Arc::new(config), Arc::new(client));
    web::run(state, args.port).await
}
