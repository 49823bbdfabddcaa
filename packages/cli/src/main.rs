#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Apartment Spot command-line front end.
//!
//! Loads listings from the REST API (or the embedded seed set), runs them
//! through the filter engine and synchronizer, and prints the resulting
//! grid and map markers. Without a subcommand an interactive menu is
//! shown.
//!
//! Uses `indicatif-log-bridge` (via [`progress::init_logger`]) to route
//! `log` output through `indicatif::MultiProgress` so that log lines and
//! spinners never fight for the terminal.

mod commands;
mod interactive;
mod output;
mod progress;
mod session;

use apartment_spot_config::AppConfig;
use apartment_spot_filter::models::Minimum;
use clap::{Args, Parser, Subcommand};

use crate::commands::Locate;
use crate::session::Search;

#[derive(Parser)]
#[command(name = "apartment_spot", about = "Search apartment listings and preview them on a map")]
struct Cli {
    /// Use the embedded sample listings instead of the REST API
    #[arg(long, global = true)]
    seed: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every listing
    Listings,
    /// Filter listings and show the matching grid and markers
    Search(SearchArgs),
    /// Show the map markers and the user's position
    Map {
        /// Simulated latitude of the user
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Simulated longitude of the user
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
    },
    /// Poll the listing source and print the projection as it changes
    Watch(SearchArgs),
}

#[derive(Args)]
struct SearchArgs {
    /// Case-insensitive text matched against title and address
    #[arg(long, default_value = "")]
    query: String,
    /// Minimum monthly price
    #[arg(long, default_value = "0")]
    min_price: f64,
    /// Maximum monthly price; omit it, or pass exactly the slider maximum,
    /// for no limit
    #[arg(long)]
    max_price: Option<f64>,
    /// Minimum bedrooms ("any", or a number; 0 means studio or larger)
    #[arg(long, default_value = "any")]
    bedrooms: Minimum<u32>,
    /// Minimum bathrooms ("any", or a number)
    #[arg(long, default_value = "any")]
    bathrooms: Minimum<f64>,
}

impl From<SearchArgs> for Search {
    fn from(args: SearchArgs) -> Self {
        Self {
            query: args.query,
            min_price: args.min_price,
            max_price: args.max_price,
            min_bedrooms: args.bedrooms,
            min_bathrooms: args.bathrooms,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = progress::init_logger();
    let cli = Cli::parse();

    let config = AppConfig::load()?;
    let source = commands::build_source(&config, cli.seed)?;

    let Some(command) = cli.command else {
        println!("Apartment Spot");
        println!();
        return interactive::run(&multi, config, source).await;
    };

    match command {
        Commands::Listings => commands::listings(&multi, config, source.as_ref()).await?,
        Commands::Search(args) => {
            commands::search(&multi, config, source.as_ref(), &args.into()).await?;
        }
        Commands::Map { lat, lng } => {
            let locate = match (lat, lng) {
                (Some(latitude), Some(longitude)) => Locate::At {
                    latitude,
                    longitude,
                },
                _ => Locate::Denied,
            };
            commands::map(&multi, config, source.as_ref(), locate).await?;
        }
        Commands::Watch(args) => commands::watch(config, source, &args.into()).await?,
    }

    Ok(())
}
