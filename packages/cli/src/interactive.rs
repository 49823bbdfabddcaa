//! Menu-driven front end using `dialoguer`, for running searches without
//! memorizing flags.

use std::sync::Arc;

use apartment_spot_config::AppConfig;
use apartment_spot_filter::models::{BathroomOption, BedroomOption};
use apartment_spot_source::ListingSource;
use dialoguer::{Confirm, Input, Select};
use indicatif::MultiProgress;

use crate::commands::{self, Locate};
use crate::session::Search;

enum Action {
    Browse,
    Search,
    Map,
    Watch,
}

impl Action {
    const ALL: &[Self] = &[Self::Browse, Self::Search, Self::Map, Self::Watch];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Browse => "Browse all apartments",
            Self::Search => "Search apartments",
            Self::Map => "Show map",
            Self::Watch => "Watch for new listings",
        }
    }
}

/// Prompts for an action and its parameters, then runs it.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected command fails.
pub async fn run(
    multi: &MultiProgress,
    config: AppConfig,
    source: Arc<dyn ListingSource>,
) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Browse => commands::listings(multi, config, source.as_ref()).await?,
        Action::Search => {
            let search = prompt_search(&config)?;
            commands::search(multi, config, source.as_ref(), &search).await?;
        }
        Action::Map => {
            let locate = prompt_locate()?;
            commands::map(multi, config, source.as_ref(), locate).await?;
        }
        Action::Watch => {
            let search = prompt_search(&config)?;
            commands::watch(config, source, &search).await?;
        }
    }

    Ok(())
}

/// Prompts for search criteria. Prices are snapped to the slider step.
fn prompt_search(config: &AppConfig) -> Result<Search, Box<dyn std::error::Error>> {
    let slider_max = config.filters.price_slider_max;

    let query: String = Input::new()
        .with_prompt("Search by title or address (empty for any)")
        .allow_empty(true)
        .interact_text()?;

    let min_price: f64 = Input::new()
        .with_prompt("Minimum price")
        .default(0.0)
        .validate_with(validate_price)
        .interact_text()?;

    let max_price: f64 = Input::new()
        .with_prompt(format!("Maximum price ({slider_max} means no limit)"))
        .default(slider_max)
        .validate_with(validate_price)
        .interact_text()?;

    let bedroom_labels: Vec<&str> = BedroomOption::all().iter().map(|o| o.label()).collect();
    let bedrooms = Select::new()
        .with_prompt("Bedrooms")
        .items(&bedroom_labels)
        .default(0)
        .interact()?;

    let bathroom_labels: Vec<&str> = BathroomOption::all().iter().map(|o| o.label()).collect();
    let bathrooms = Select::new()
        .with_prompt("Bathrooms")
        .items(&bathroom_labels)
        .default(0)
        .interact()?;

    Ok(Search {
        query,
        min_price: config.filters.snap_price(min_price),
        max_price: Some(config.filters.snap_price(max_price)),
        min_bedrooms: BedroomOption::all()[bedrooms].minimum(),
        min_bathrooms: BathroomOption::all()[bathrooms].minimum(),
    })
}

fn validate_price(price: &f64) -> Result<(), &'static str> {
    if price.is_finite() && *price >= 0.0 {
        Ok(())
    } else {
        Err("price must be a non-negative number")
    }
}

fn prompt_locate() -> Result<Locate, Box<dyn std::error::Error>> {
    let share = Confirm::new()
        .with_prompt("Share your location?")
        .default(true)
        .interact()?;

    if !share {
        return Ok(Locate::Denied);
    }

    let latitude: f64 = Input::new().with_prompt("Latitude").interact_text()?;
    let longitude: f64 = Input::new().with_prompt("Longitude").interact_text()?;
    Ok(Locate::At {
        latitude,
        longitude,
    })
}
