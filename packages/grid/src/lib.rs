#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Grid view model.
//!
//! Turns a [`Projection`] into the cards shown in the results grid. The
//! grid and the map read the same projection, so a listing without a
//! position still gets a card here.

use apartment_spot_listing_models::{Listing, format_price};
use apartment_spot_projection::Projection;
use chrono::{DateTime, NaiveDate};
use serde::Serialize;

/// Image shown when a listing has no photos.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Shown when a listing has no availability date.
pub const AVAILABILITY_UNSPECIFIED: &str = "Not specified";

/// What the grid should display for a projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "cards", rename_all = "snake_case")]
pub enum GridView {
    /// No listing set has arrived yet.
    Loading,
    /// A listing set arrived but nothing matches the filters.
    Empty,
    /// One card per matching listing, in projection order.
    Cards(Vec<ListingCard>),
}

impl GridView {
    /// Builds the grid for `projection`, rendering prices with
    /// `currency_symbol` and detail links under `detail_prefix`.
    #[must_use]
    pub fn from_projection(projection: &Projection, currency_symbol: &str, detail_prefix: &str) -> Self {
        match projection.listings() {
            None => Self::Loading,
            Some([]) => Self::Empty,
            Some(listings) => Self::Cards(
                listings
                    .iter()
                    .map(|listing| ListingCard::new(listing, currency_symbol, detail_prefix))
                    .collect(),
            ),
        }
    }

    /// Cards currently displayed; empty while loading or when nothing
    /// matches.
    #[must_use]
    pub fn cards(&self) -> &[ListingCard] {
        match self {
            Self::Cards(cards) => cards,
            Self::Loading | Self::Empty => &[],
        }
    }
}

/// Display data for one listing in the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingCard {
    pub id: String,
    pub title: String,
    pub address: String,
    /// Formatted monthly rent, e.g. `$3,200`.
    pub price_label: String,
    pub availability: String,
    /// E.g. `1 Bed`, `2 Beds`.
    pub bedrooms_label: String,
    /// E.g. `1 Bath`, `2.5 Baths`.
    pub bathrooms_label: String,
    pub thumbnail_url: String,
    pub detail_path: String,
}

impl ListingCard {
    #[must_use]
    pub fn new(listing: &Listing, currency_symbol: &str, detail_prefix: &str) -> Self {
        Self {
            id: listing.id.clone(),
            title: listing.title.clone(),
            address: listing.address.clone(),
            price_label: format_price(currency_symbol, listing.price),
            availability: availability_text(listing.availability_date.as_deref()),
            bedrooms_label: bedrooms_label(listing.bedrooms),
            bathrooms_label: bathrooms_label(listing.bathrooms),
            thumbnail_url: listing
                .thumbnail_url()
                .unwrap_or(PLACEHOLDER_IMAGE)
                .to_string(),
            detail_path: listing.detail_path(detail_prefix),
        }
    }
}

/// Formats an availability value for display.
///
/// ISO dates (`2024-09-01`) and RFC 3339 timestamps render as `Sep 1, 2024`.
/// Anything else, such as `"Available Now"`, is shown as given.
#[must_use]
pub fn availability_text(value: Option<&str>) -> String {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return AVAILABILITY_UNSPECIFIED.to_string();
    };

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()));

    date.map_or_else(|| value.to_string(), |date| date.format("%b %-d, %Y").to_string())
}

/// Bedroom badge text.
#[must_use]
pub fn bedrooms_label(bedrooms: u32) -> String {
    if bedrooms == 1 {
        "1 Bed".to_string()
    } else {
        format!("{bedrooms} Beds")
    }
}

/// Bathroom badge text. Half baths keep their fraction.
#[must_use]
pub fn bathrooms_label(bathrooms: f64) -> String {
    #[allow(clippy::float_cmp)]
    let singular = bathrooms == 1.0;
    let noun = if singular { "Bath" } else { "Baths" };
    format!("{bathrooms} {noun}")
}
