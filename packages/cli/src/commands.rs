//! Command implementations shared by the flag-driven and interactive
//! front ends.

use std::sync::Arc;

use apartment_spot_config::AppConfig;
use apartment_spot_listing_models::Listing;
use apartment_spot_map::geolocation::{FixedGeolocation, GeolocationProvider, UnavailableGeolocation};
use apartment_spot_map::GeolocationDelivery;
use apartment_spot_projection::{Projection, drive_feed};
use apartment_spot_source::{
    ListingSource, RestListingSource, SeedListingSource, SourceError, spawn_polling_feed,
};
use indicatif::MultiProgress;

use crate::output;
use crate::progress;
use crate::session::{Search, Session};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Builds the listing source selected on the command line.
///
/// # Errors
///
/// Returns [`SourceError`] if the seed set is malformed or the HTTP client
/// cannot be built.
pub fn build_source(config: &AppConfig, seed: bool) -> Result<Arc<dyn ListingSource>, SourceError> {
    if seed {
        return Ok(Arc::new(SeedListingSource::embedded()?));
    }

    let api = &config.api;
    log::info!("Using listings API at {}", api.base_url);
    let source = RestListingSource::new(api.base_url.clone(), api.request_timeout())?
        .with_listings_path(api.listings_path.clone())
        .with_favorites_path(api.favorites_path.clone())
        .with_token(api.token.clone())
        .with_max_retries(api.max_retries);
    Ok(Arc::new(source))
}

async fn load(multi: &MultiProgress, source: &dyn ListingSource) -> Result<Vec<Listing>, SourceError> {
    let spinner = progress::spinner(multi, format!("Loading listings from {}...", source.name()));
    let result = source.fetch_listings().await;

    match &result {
        Ok(listings) => spinner.finish_with_message(format!("Loaded {} listings", listings.len())),
        Err(_) => spinner.finish_and_clear(),
    }
    result
}

/// Prints the unfiltered grid.
///
/// # Errors
///
/// Returns an error if the listings cannot be loaded.
pub async fn listings(
    multi: &MultiProgress,
    config: AppConfig,
    source: &dyn ListingSource,
) -> CommandResult {
    let session = Session::mount(config)?;
    session.deliver(load(multi, source).await?);
    output::print_grid(&session.grid());
    Ok(())
}

/// Applies `search` and prints the grid and the matching markers.
///
/// # Errors
///
/// Returns an error if the listings cannot be loaded.
pub async fn search(
    multi: &MultiProgress,
    config: AppConfig,
    source: &dyn ListingSource,
    search: &Search,
) -> CommandResult {
    let session = Session::mount(config)?;
    session.apply_search(search);
    session.deliver(load(multi, source).await?);

    output::print_filters(
        &session.sync().predicates(),
        session.config().filters.price_slider_max,
    );
    output::print_grid(&session.grid());
    println!();
    session.with_map(|map| output::print_map(map));
    Ok(())
}

/// Geolocation to simulate for the `map` command.
pub enum Locate {
    At { latitude: f64, longitude: f64 },
    Denied,
}

/// Loads listings, resolves the user's position and prints the map.
///
/// # Errors
///
/// Returns an error if the listings cannot be loaded or the simulated
/// coordinates are invalid.
pub async fn map(
    multi: &MultiProgress,
    config: AppConfig,
    source: &dyn ListingSource,
    locate: Locate,
) -> CommandResult {
    let provider: Arc<dyn GeolocationProvider> = match locate {
        Locate::At {
            latitude,
            longitude,
        } => Arc::new(FixedGeolocation::from_coordinates(latitude, longitude)?),
        Locate::Denied => Arc::new(UnavailableGeolocation::denied()),
    };

    let session = Session::mount(config)?;
    session.deliver(load(multi, source).await?);

    match session.locate(provider).await {
        GeolocationDelivery::Located { .. } => {}
        GeolocationDelivery::Failed => println!("Location unavailable, using the default center."),
        GeolocationDelivery::Discarded => log::debug!("Geolocation result discarded"),
    }

    session.with_map(|map| output::print_map(map));
    Ok(())
}

/// Polls `source` and prints the projection every time it changes, until
/// Ctrl-C.
///
/// # Errors
///
/// Returns an error if waiting for Ctrl-C fails.
pub async fn watch(config: AppConfig, source: Arc<dyn ListingSource>, search: &Search) -> CommandResult {
    let interval = config.api.poll_interval();
    let session = Session::mount(config)?;
    session.apply_search(search);
    session.sync().subscribe(|projection: &Projection| {
        if let Some(listings) = projection.listings() {
            println!("{} matching apartment(s)", listings.len());
        }
    });

    log::info!("Polling {} every {interval:?}, Ctrl-C to stop", source.name());
    let (feed, poller) = spawn_polling_feed(source, interval);
    let mut driver = tokio::spawn(drive_feed(session.sync().clone(), feed));

    tokio::select! {
        applied = &mut driver => {
            log::info!("Listing feed closed after {} snapshots", applied?);
        }
        result = tokio::signal::ctrl_c() => {
            result?;
            log::info!("Stopping");
        }
    }

    session.close();
    driver.abort();
    poller.abort();
    output::print_grid(&session.grid());
    Ok(())
}
